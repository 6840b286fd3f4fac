use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::frame::Frame;
use crate::{Vm, delegate, throw};

use self::closure::Closure;
use self::native::{CallContext, NativeFunction};
use self::user::UserFunction;

use super::object::{NamedObject, Object, PropertyDataDescriptor, PropertyValue};
use super::{Handle, Typeof, Unwind, Value};

pub mod closure;
pub mod native;
pub mod user;

pub enum FunctionKind {
    Native(NativeFunction),
    User(UserFunction),
    Closure(Closure),
}

impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("Native"),
            Self::User(_) => f.write_str("User"),
            Self::Closure(_) => f.write_str("Closure"),
        }
    }
}

/// What a call resolved to: a frame that still needs to run, or the result of a native function
pub enum CallResult {
    Frame(Frame),
    Value(Value),
}

#[derive(Debug)]
pub struct Function {
    name: RefCell<Option<Rc<str>>>,
    kind: FunctionKind,
    obj: NamedObject,
    /// The `prototype` property. Created on first use for user functions.
    prototype: RefCell<Option<Value>>,
    this: Weak<Function>,
}

impl Function {
    pub fn new(vm: &Vm, name: Option<Rc<str>>, kind: FunctionKind) -> Handle {
        let proto = vm.statics.function_prototype.clone();
        Self::with_obj(name, kind, NamedObject::with_prototype(Some(proto)))
    }

    pub fn with_obj(name: Option<Rc<str>>, kind: FunctionKind, obj: NamedObject) -> Handle {
        let rc: Rc<Function> = Rc::new_cyclic(|this| Self {
            name: RefCell::new(name),
            kind,
            obj,
            prototype: RefCell::new(None),
            this: this.clone(),
        });
        Handle::from_rc(rc)
    }

    pub fn name(&self) -> Option<Rc<str>> {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: Rc<str>) {
        *self.name.borrow_mut() = Some(name);
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Sets the `prototype` property of a builtin constructor
    pub fn set_fn_prototype(&self, prototype: Handle) {
        *self.prototype.borrow_mut() = Some(Value::Object(prototype));
    }

    /// Whether this function can be the target of `new`
    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            FunctionKind::User(_) => true,
            FunctionKind::Closure(_) => false,
            FunctionKind::Native(_) => self.prototype.borrow().is_some(),
        }
    }

    /// Returns the `prototype` property, creating `{ constructor: F }` the first time it is needed
    pub fn get_or_set_prototype(&self, vm: &Vm) -> Value {
        if let Some(prototype) = &*self.prototype.borrow() {
            return prototype.clone();
        }

        let prototype = NamedObject::new(vm);
        if let Some(this) = self.this.upgrade() {
            let this: Rc<dyn Object> = this;
            prototype.set_property(
                vm,
                "constructor".into(),
                PropertyValue::hidden(Value::Object(Handle::from_rc(this))),
            );
        }

        let prototype = Value::Object(Handle::new(prototype));
        *self.prototype.borrow_mut() = Some(prototype.clone());
        prototype
    }

    /// The object a constructor call should inherit from
    fn instance_prototype(&self, vm: &Vm) -> Handle {
        match self.get_or_set_prototype(vm) {
            Value::Object(o) => o,
            _ => vm.statics.object_prototype.clone(),
        }
    }

    fn params(&self) -> usize {
        match &self.kind {
            FunctionKind::User(u) => u.inner().params,
            FunctionKind::Closure(c) => c.fun.inner().params,
            FunctionKind::Native(_) => 0,
        }
    }

    /// Source text for `Function.prototype.toString`
    pub fn source_text(&self) -> String {
        match &self.kind {
            FunctionKind::User(u) => u.inner().source_text().to_owned(),
            FunctionKind::Closure(c) => c.fun.inner().source_text().to_owned(),
            FunctionKind::Native(_) => {
                let name = self.name();
                format!("function {}() {{ [native code] }}", name.as_deref().unwrap_or_default())
            }
        }
    }

    /// Prepares a plain call. Native functions run right away.
    pub(crate) fn begin_call(
        &self,
        vm: &mut Vm,
        this: Value,
        args: Vec<Value>,
        is_flat_call: bool,
    ) -> Result<CallResult, Unwind> {
        match &self.kind {
            FunctionKind::Native(native) => {
                let cx = CallContext::call(args, vm, this);
                native(cx).map(CallResult::Value)
            }
            FunctionKind::User(user) => {
                let this = match this {
                    // sloppy mode functions see the global object
                    Value::Undefined | Value::Null => Value::Object(vm.global.clone()),
                    other => other,
                };
                Ok(CallResult::Frame(user.frame(vm, this, args, None, false, is_flat_call)))
            }
            FunctionKind::Closure(closure) => Ok(CallResult::Frame(closure.frame(vm, args, is_flat_call))),
        }
    }

    /// Prepares a constructor call with `new_target` as the `new.target` of the activation
    pub(crate) fn begin_construct(
        &self,
        vm: &mut Vm,
        args: Vec<Value>,
        new_target: &Handle,
        is_flat_call: bool,
    ) -> Result<CallResult, Unwind> {
        if !self.is_constructor() {
            let name = self.name();
            throw!(vm, TypeError, "{} is not a constructor", name.as_deref().unwrap_or("anonymous"))
        }

        match &self.kind {
            FunctionKind::Native(native) => {
                let cx = CallContext::constructor(args, vm, Value::Undefined);
                native(cx).map(CallResult::Value)
            }
            FunctionKind::User(user) => {
                let prototype = new_target
                    .as_function()
                    .map_or_else(|| self.instance_prototype(vm), |f| f.instance_prototype(vm));
                let this = Value::Object(Handle::new(NamedObject::with_prototype(Some(prototype))));

                Ok(CallResult::Frame(user.frame(
                    vm,
                    this,
                    args,
                    Some(new_target.clone()),
                    true,
                    is_flat_call,
                )))
            }
            FunctionKind::Closure(_) => unreachable!("closures are not constructors"),
        }
    }
}

impl Object for Function {
    fn get_own_property_descriptor(&self, vm: &Vm, key: &str) -> Option<PropertyValue> {
        match key {
            "prototype" if self.is_constructor() => Some(PropertyValue::new(
                self.get_or_set_prototype(vm),
                PropertyDataDescriptor::WRITABLE,
            )),
            "name" => {
                let name = self.name().unwrap_or_else(|| Rc::from(""));
                Some(PropertyValue::new(Value::String(name), PropertyDataDescriptor::CONFIGURABLE))
            }
            "length" => Some(PropertyValue::new(
                Value::number(self.params() as f64),
                PropertyDataDescriptor::CONFIGURABLE,
            )),
            _ => self.obj.get_own_property_descriptor(vm, key),
        }
    }

    fn set_property(&self, vm: &Vm, key: Rc<str>, value: PropertyValue) {
        match &*key {
            "prototype" if self.is_constructor() => *self.prototype.borrow_mut() = Some(value.value),
            "name" => {
                if let Value::String(s) = value.value {
                    self.set_name(s);
                }
            }
            "length" => {}
            _ => self.obj.set_property(vm, key, value),
        }
    }

    fn delete_property(&self, key: &str) -> bool {
        match key {
            "prototype" if self.is_constructor() => false,
            _ => self.obj.delete_property(key),
        }
    }

    delegate!(obj, set_prototype, get_prototype, own_keys);

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_of(&self) -> Typeof {
        Typeof::Function
    }

    fn class_name(&self) -> &'static str {
        "Function"
    }
}
