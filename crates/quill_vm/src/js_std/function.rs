use crate::throw;
use crate::value::array::Array;
use crate::value::function::native::CallContext;
use crate::value::{Handle, Unwind, Value, ValueContext};

/// `Function(...)` would compile source text at runtime, which is not supported
pub fn constructor(cx: CallContext) -> Result<Value, Unwind> {
    throw!(cx.vm, EvalError, "Function constructor is not supported")
}

fn this_function(cx: &CallContext, method: &str) -> Result<Handle, Unwind> {
    match &cx.this {
        Value::Object(o) if o.is_callable() => Ok(o.clone()),
        _ => throw!(cx.vm, TypeError, "Function.prototype.{} called on non-function", method),
    }
}

pub fn call(cx: CallContext) -> Result<Value, Unwind> {
    let target = this_function(&cx, "call")?;
    let mut args = cx.args.into_iter();
    let this = args.next().unwrap_or_undefined();

    cx.vm.call(&target, this, args.collect())
}

pub fn apply(cx: CallContext) -> Result<Value, Unwind> {
    let target = this_function(&cx, "apply")?;
    let mut args = cx.args.into_iter();
    let this = args.next().unwrap_or_undefined();

    let args = match args.next() {
        None | Some(Value::Undefined | Value::Null) => Vec::new(),
        Some(Value::Object(o)) => match o.downcast_ref::<Array>() {
            Some(array) => array.to_vec(),
            None => throw!(cx.vm, TypeError, "CreateListFromArrayLike called on non-array"),
        },
        Some(_) => throw!(cx.vm, TypeError, "CreateListFromArrayLike called on non-object"),
    };

    cx.vm.call(&target, this, args)
}

pub fn to_string(cx: CallContext) -> Result<Value, Unwind> {
    match cx.this.as_object().and_then(|o| o.as_function()) {
        Some(function) => Ok(Value::String(function.source_text().into())),
        None => throw!(cx.vm, TypeError, "Function.prototype.toString called on non-function"),
    }
}
