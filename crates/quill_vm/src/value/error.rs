use std::any::Any;
use std::fmt::Write;
use std::rc::Rc;

use crate::statics::Statics;
use crate::{Vm, delegate};

use super::object::{NamedObject, Object, PropertyValue};
use super::{Handle, Value};

/// The native error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    URIError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::EvalError => "EvalError",
            Self::RangeError => "RangeError",
            Self::ReferenceError => "ReferenceError",
            Self::SyntaxError => "SyntaxError",
            Self::TypeError => "TypeError",
            Self::URIError => "URIError",
        }
    }

    pub fn prototype(self, statics: &Statics) -> &Handle {
        match self {
            Self::Error => &statics.error_prototype,
            Self::EvalError => &statics.eval_error_prototype,
            Self::RangeError => &statics.range_error_prototype,
            Self::ReferenceError => &statics.reference_error_prototype,
            Self::SyntaxError => &statics.syntax_error_prototype,
            Self::TypeError => &statics.type_error_prototype,
            Self::URIError => &statics.uri_error_prototype,
        }
    }
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    obj: NamedObject,
}

fn get_stack_trace(vm: &Vm, name: &str, message: &str) -> String {
    let mut stack = if message.is_empty() {
        name.to_owned()
    } else {
        format!("{name}: {message}")
    };

    for frame in vm.frames.iter().rev().take(10) {
        let name = frame
            .function
            .name
            .map(|s| vm.interner.resolve(s))
            .unwrap_or("<anonymous>");
        let _ = write!(stack, "\n  at {name}");
    }

    stack
}

impl Error {
    /// Creates an error object. `message` becomes an own property unless it is `None`,
    /// in which case the empty message of the prototype is inherited.
    pub fn new(vm: &Vm, kind: ErrorKind, message: Option<&str>) -> Self {
        let obj = NamedObject::with_prototype(Some(kind.prototype(&vm.statics).clone()));
        if let Some(message) = message {
            obj.set_property(vm, "message".into(), PropertyValue::hidden(Value::string(message)));
        }

        let stack = get_stack_trace(vm, kind.name(), message.unwrap_or_default());
        obj.set_property(vm, "stack".into(), PropertyValue::hidden(Value::String(Rc::from(stack))));

        Self { kind, obj }
    }

    /// Creates an error object and wraps it in a [`Value`]
    pub fn new_value(vm: &Vm, kind: ErrorKind, message: impl AsRef<str>) -> Value {
        Value::Object(Handle::new(Self::new(vm, kind, Some(message.as_ref()))))
    }
}

impl Object for Error {
    delegate!(
        obj,
        get_own_property_descriptor,
        set_property,
        delete_property,
        set_prototype,
        get_prototype,
        own_keys
    );

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn class_name(&self) -> &'static str {
        "Error"
    }
}
