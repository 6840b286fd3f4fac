use crate::throw;
use crate::value::function::native::CallContext;
use crate::value::object::NamedObject;
use crate::value::ops::conversions::ValueConversion;
use crate::value::{Handle, Unwind, Value, ValueContext};

pub fn constructor(cx: CallContext) -> Result<Value, Unwind> {
    match cx.args.first() {
        Some(Value::Object(o)) => Ok(Value::Object(o.clone())),
        _ => Ok(Value::Object(Handle::new(NamedObject::new(cx.vm)))),
    }
}

pub fn get_prototype_of(cx: CallContext) -> Result<Value, Unwind> {
    match cx.args.first() {
        Some(Value::Object(o)) => Ok(o.get_prototype().map_or(Value::Null, Value::Object)),
        Some(Value::Undefined | Value::Null) | None => {
            throw!(cx.vm, TypeError, "Cannot convert undefined or null to object")
        }
        Some(_) => Ok(Value::Object(cx.vm.statics.object_prototype.clone())),
    }
}

pub fn has_own_property(cx: CallContext) -> Result<Value, Unwind> {
    let key = cx.args.first().unwrap_or_undefined().to_property_key(cx.vm)?;

    match &cx.this {
        Value::Object(o) => Ok(Value::Boolean(o.get_own_property_descriptor(cx.vm, &key).is_some())),
        Value::String(s) => Ok(Value::Boolean(
            &*key == "length" || crate::value::object::array_index(&key).is_some_and(|i| i < s.encode_utf16().count()),
        )),
        Value::Undefined | Value::Null => throw!(cx.vm, TypeError, "Cannot convert undefined or null to object"),
        _ => Ok(Value::Boolean(false)),
    }
}

/// `Object.prototype.toString`: `[object Tag]`
pub fn to_string(cx: CallContext) -> Result<Value, Unwind> {
    let tag = match &cx.this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Boolean(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Object(o) => o.class_name(),
        Value::External(e) => e.get().type_of().as_str(),
    };

    Ok(Value::String(format!("[object {tag}]").into()))
}
