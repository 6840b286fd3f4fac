use crate::throw;
use crate::value::array::Array;
use crate::value::function::native::CallContext;
use crate::value::ops::conversions::ValueConversion;
use crate::value::{Unwind, Value};

fn join_inner(cx: CallContext, separator: &str) -> Result<Value, Unwind> {
    let Some(array) = cx.this.as_object().and_then(|o| o.downcast_ref::<Array>()) else {
        throw!(cx.vm, TypeError, "Array.prototype.join called on non-array")
    };

    let items = array.to_vec();
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let part = match item {
            Value::Undefined | Value::Null => "".into(),
            item => item.to_js_string(cx.vm)?,
        };
        parts.push(part);
    }

    Ok(Value::String(parts.join(separator).into()))
}

pub fn join(cx: CallContext) -> Result<Value, Unwind> {
    let separator = match cx.args.first() {
        None | Some(Value::Undefined) => ",".into(),
        Some(separator) => separator.to_js_string(cx.vm)?,
    };
    join_inner(cx, &separator)
}

pub fn to_string(cx: CallContext) -> Result<Value, Unwind> {
    join_inner(cx, ",")
}
