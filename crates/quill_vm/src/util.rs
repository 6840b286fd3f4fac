use crate::Vm;
use crate::value::Value;
use crate::value::error::Error;
use crate::value::ops::conversions::ValueConversion;

/// Formats a value for the REPL and for uncaught exceptions.
///
/// Error objects show their stack trace, anything else is converted with `ToString`.
/// Conversion errors are not propagated: the fallback is the type of the value.
pub fn format_value(vm: &mut Vm, value: &Value) -> String {
    if let Value::Object(object) = value {
        if object.downcast_ref::<Error>().is_some() {
            if let Ok(Value::String(stack)) = value.get_property(vm, "stack") {
                return stack.to_string();
            }
        }
    }

    match value.to_js_string(vm) {
        Ok(s) => s.to_string(),
        Err(_) => format!("[{}]", value.type_of().as_str()),
    }
}
