use std::rc::Rc;

use quill_middle::util::format_f64;

use crate::throw;
use crate::value::{Unwind, Value};
use crate::Vm;

/// The hint passed to `ToPrimitive`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

pub trait ValueConversion {
    fn to_primitive(&self, vm: &mut Vm, preferred_type: PreferredType) -> Result<Value, Unwind>;

    fn to_number(&self, vm: &mut Vm) -> Result<f64, Unwind>;

    fn to_boolean(&self) -> bool;

    fn to_js_string(&self, vm: &mut Vm) -> Result<Rc<str>, Unwind>;

    fn to_int32(&self, vm: &mut Vm) -> Result<i32, Unwind> {
        self.to_number(vm).map(f64_to_int32)
    }

    fn to_uint32(&self, vm: &mut Vm) -> Result<u32, Unwind> {
        self.to_number(vm).map(|n| f64_to_int32(n) as u32)
    }

    /// Converts a value to a string usable as a property key
    fn to_property_key(&self, vm: &mut Vm) -> Result<Rc<str>, Unwind> {
        self.to_js_string(vm)
    }
}

impl ValueConversion for Value {
    fn to_primitive(&self, vm: &mut Vm, preferred_type: PreferredType) -> Result<Value, Unwind> {
        let object = match self {
            Value::Object(o) => o.clone(),
            Value::External(e) => return e.get().to_primitive(vm, preferred_type),
            other => return Ok(other.clone()),
        };

        let order = match preferred_type {
            PreferredType::String => ["toString", "valueOf"],
            PreferredType::Number | PreferredType::Default => ["valueOf", "toString"],
        };

        for method in order {
            if let Value::Object(function) = object.get_property(vm, method) {
                if function.is_callable() {
                    let result = vm.call(&function, self.clone(), Vec::new())?;
                    if !matches!(result, Value::Object(_)) {
                        return Ok(result);
                    }
                }
            }
        }

        throw!(vm, TypeError, "Cannot convert object to primitive value")
    }

    fn to_number(&self, vm: &mut Vm) -> Result<f64, Unwind> {
        match self {
            Value::Undefined => Ok(f64::NAN),
            Value::Null => Ok(0.0),
            Value::Boolean(b) => Ok(*b as u8 as f64),
            Value::Number(n) => Ok(*n),
            Value::String(s) => Ok(string_to_number(s)),
            Value::Object(_) => self.to_primitive(vm, PreferredType::Number)?.to_number(vm),
            Value::External(e) => e.get().to_number(vm),
        }
    }

    fn to_boolean(&self) -> bool {
        self.is_truthy()
    }

    fn to_js_string(&self, vm: &mut Vm) -> Result<Rc<str>, Unwind> {
        match self {
            Value::Undefined => Ok("undefined".into()),
            Value::Null => Ok("null".into()),
            Value::Boolean(b) => Ok(if *b { "true" } else { "false" }.into()),
            Value::Number(n) => Ok(format_f64(*n).into()),
            Value::String(s) => Ok(Rc::clone(s)),
            Value::Object(_) => self.to_primitive(vm, PreferredType::String)?.to_js_string(vm),
            Value::External(e) => e.get().to_js_string(vm),
        }
    }
}

/// `ToInt32`: wraps the truncated number modulo 2^32
pub fn f64_to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let n = n.trunc() % 4294967296.0;
    let n = if n < 0.0 { n + 4294967296.0 } else { n };
    n as u32 as i32
}

/// `StringToNumber` for decimal, hex, octal and binary literals surrounded by whitespace
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(&s[2..], radix).unwrap_or(f64::NAN);
    }

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    // Rust accepts "inf" and "nan", JavaScript does not
    if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }

    s.parse().unwrap_or(f64::NAN)
}

/// Parses a non-empty sequence of digits in `radix`. Returns `None` if any digit is invalid.
pub fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }

    digits.chars().try_fold(0.0, |acc, c| {
        let digit = c.to_digit(radix)?;
        Some(acc * radix as f64 + digit as f64)
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn int32_wraps() {
        assert_eq!(f64_to_int32(1.9), 1);
        assert_eq!(f64_to_int32(-1.9), -1);
        assert_eq!(f64_to_int32(4294967296.0), 0);
        assert_eq!(f64_to_int32(2147483648.0), -2147483648);
        assert_eq!(f64_to_int32(f64::NAN), 0);
        assert_eq!(f64_to_int32(f64::INFINITY), 0);
    }

    #[test]
    fn strings_to_numbers() {
        assert_eq!(string_to_number("  42  "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert_eq!(string_to_number("0b101"), 5.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("0x").is_nan());
    }
}
