use crate::throw;
use crate::value::error::{Error, ErrorKind};
use crate::value::function::native::CallContext;
use crate::value::ops::conversions::ValueConversion;
use crate::value::{Handle, Unwind, Value};

fn construct_error(cx: CallContext, kind: ErrorKind) -> Result<Value, Unwind> {
    let message = match cx.args.first() {
        None | Some(Value::Undefined) => None,
        Some(message) => Some(message.to_js_string(cx.vm)?),
    };

    let error = Error::new(cx.vm, kind, message.as_deref());
    Ok(Value::Object(Handle::new(error)))
}

macro_rules! define_error_constructors {
    ( $( $fun:ident $kind:ident ),* ) => {
        $(
            pub fn $fun(cx: CallContext) -> Result<Value, Unwind> {
                construct_error(cx, ErrorKind::$kind)
            }
        )*
    };
}

define_error_constructors!(
    error_constructor Error,
    eval_error_constructor EvalError,
    range_error_constructor RangeError,
    reference_error_constructor ReferenceError,
    syntax_error_constructor SyntaxError,
    type_error_constructor TypeError,
    uri_error_constructor URIError
);

/// `Error.prototype.toString`: `name: message`, leaving out whichever part is empty
pub fn to_string(cx: CallContext) -> Result<Value, Unwind> {
    let Value::Object(this) = &cx.this else {
        throw!(cx.vm, TypeError, "Error.prototype.toString called on non-object")
    };

    let name = match this.get_property(cx.vm, "name") {
        Value::Undefined => "Error".into(),
        name => name.to_js_string(cx.vm)?,
    };
    let message = match this.get_property(cx.vm, "message") {
        Value::Undefined => "".into(),
        message => message.to_js_string(cx.vm)?,
    };

    let string = match (name.is_empty(), message.is_empty()) {
        (_, true) => name.to_string(),
        (true, false) => message.to_string(),
        (false, false) => format!("{name}: {message}"),
    };
    Ok(Value::String(string.into()))
}
