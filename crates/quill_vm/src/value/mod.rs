pub mod array;
pub mod error;
pub mod function;
pub mod object;
pub mod ops;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use quill_middle::util::format_f64;

use crate::throw;
use crate::Vm;

use self::function::Function;
use self::object::{Object, PropertyValue};

/// A JavaScript value
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Object(Handle),
    /// A local variable that was captured by a closure.
    ///
    /// Only ever stored in local slots of a frame: loading a local unboxes it.
    External(ExternalValue),
}

/// The ways a computation can leave the interpreter loop early
#[derive(Debug, Clone)]
pub enum Unwind {
    /// A JavaScript exception, catchable by `try`/`catch`
    Error(Value),
    /// A host abort (failed assertion). Never caught by script code.
    Abort(String),
}

impl From<Value> for Unwind {
    fn from(value: Value) -> Self {
        Self::Error(value)
    }
}

/// A shared, boxed local variable
#[derive(Debug, Clone)]
pub struct ExternalValue(Rc<RefCell<Value>>);

impl ExternalValue {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = value;
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A reference to a heap object. Two handles are the same JavaScript object iff they point to the same allocation.
#[derive(Clone)]
pub struct Handle(Rc<dyn Object>);

impl Handle {
    pub fn new<O: Object + 'static>(object: O) -> Self {
        Self(Rc::new(object))
    }

    pub fn from_rc(rc: Rc<dyn Object>) -> Self {
        Self(rc)
    }

    pub fn ptr_eq(&self, other: &Handle) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn as_function(&self) -> Option<&Function> {
        self.downcast_ref::<Function>()
    }

    pub fn is_callable(&self) -> bool {
        self.as_function().is_some()
    }
}

impl Deref for Handle {
    type Target = dyn Object;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handle {
    // objects can be cyclic, so only the address is printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Typeof {
    Undefined,
    Object,
    Boolean,
    Number,
    String,
    Function,
}

impl Typeof {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Object => "object",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Function => "function",
        }
    }

    pub fn as_value(&self) -> Value {
        Value::String(Rc::from(self.as_str()))
    }
}

impl Value {
    pub fn number(n: f64) -> Self {
        Self::Number(n)
    }

    pub fn string(s: &str) -> Self {
        Self::String(Rc::from(s))
    }

    pub fn type_of(&self) -> Typeof {
        match self {
            Self::Undefined => Typeof::Undefined,
            Self::Null => Typeof::Object,
            Self::Boolean(_) => Typeof::Boolean,
            Self::Number(_) => Typeof::Number,
            Self::String(_) => Typeof::String,
            Self::Object(o) => o.type_of(),
            Self::External(e) => e.get().type_of(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Object(_) => true,
            Self::External(e) => e.get().is_truthy(),
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn as_object(&self) -> Option<&Handle> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the value behind an external box, or the value itself
    pub fn unbox_external(&self) -> Value {
        match self {
            Self::External(e) => e.get(),
            other => other.clone(),
        }
    }

    /// Reads a property, looking through the prototype chain.
    ///
    /// Primitives other than `undefined` and `null` read from `Object.prototype`; strings
    /// additionally expose `length` and their UTF-16 code units.
    pub fn get_property(&self, vm: &Vm, key: &str) -> Result<Value, Unwind> {
        match self {
            Self::Object(o) => Ok(o.get_property(vm, key)),
            Self::String(s) => {
                // length and indices count UTF-16 code units
                if key == "length" {
                    return Ok(Value::number(s.encode_utf16().count() as f64));
                }
                if let Some(unit) = object::array_index(key).and_then(|i| s.encode_utf16().nth(i)) {
                    // half of a surrogate pair has no representation in a Rust string
                    let c = char::decode_utf16([unit])
                        .next()
                        .and_then(Result::ok)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Ok(Value::String(Rc::from(c.to_string())));
                }
                Ok(vm.statics.object_prototype.get_property(vm, key))
            }
            Self::Boolean(_) | Self::Number(_) => Ok(vm.statics.object_prototype.get_property(vm, key)),
            Self::Undefined | Self::Null => {
                let value = self.type_of_nullish();
                throw!(vm, TypeError, "Cannot read properties of {} (reading '{}')", value, key)
            }
            Self::External(e) => e.get().get_property(vm, key),
        }
    }

    /// Assigns a property. Assignments to primitives are silently dropped.
    pub fn set_property(&self, vm: &Vm, key: Rc<str>, value: Value) -> Result<(), Unwind> {
        match self {
            Self::Object(o) => {
                o.assign_property(vm, key, value);
                Ok(())
            }
            Self::Undefined | Self::Null => {
                let value = self.type_of_nullish();
                throw!(vm, TypeError, "Cannot set properties of {} (setting '{}')", value, key)
            }
            Self::External(e) => e.get().set_property(vm, key, value),
            _ => Ok(()),
        }
    }

    pub fn delete_property(&self, vm: &Vm, key: &str) -> Result<bool, Unwind> {
        match self {
            Self::Object(o) => Ok(o.delete_property(key)),
            Self::Undefined | Self::Null => {
                let value = self.type_of_nullish();
                throw!(vm, TypeError, "Cannot convert {} to object", value)
            }
            _ => Ok(true),
        }
    }

    fn type_of_nullish(&self) -> &'static str {
        match self {
            Self::Null => "null",
            _ => "undefined",
        }
    }

    /// A short description of a value for error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Undefined => "undefined".into(),
            Self::Null => "null".into(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_f64(*n),
            Self::String(s) => format!("\"{s}\""),
            Self::Object(o) => match o.as_function() {
                Some(f) => f.name().map_or_else(|| String::from("function"), |n| n.to_string()),
                None => String::from("object"),
            },
            Self::External(e) => e.get().describe(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Self::Object(value)
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Self::String(value)
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::static_default(value)
    }
}

/// Helpers for reading optional values, such as arguments of a native function
pub trait ValueContext {
    fn unwrap_or_undefined(self) -> Value;
}

impl ValueContext for Option<Value> {
    fn unwrap_or_undefined(self) -> Value {
        self.unwrap_or(Value::Undefined)
    }
}

impl ValueContext for Option<&Value> {
    fn unwrap_or_undefined(self) -> Value {
        self.cloned().unwrap_or(Value::Undefined)
    }
}
