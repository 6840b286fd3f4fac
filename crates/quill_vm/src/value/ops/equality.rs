use std::cmp::Ordering;

use crate::Vm;
use crate::value::{Unwind, Value};

use super::conversions::{PreferredType, ValueConversion};

/// `IsStrictlyEqual`
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// `IsLooselyEqual`
pub fn loose_eq(vm: &mut Vm, left: &Value, right: &Value) -> Result<bool, Unwind> {
    match (left, right) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => Ok(true),
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => Ok(false),
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            Ok(left.to_number(vm)? == right.to_number(vm)?)
        }
        (Value::Boolean(b), other) | (other, Value::Boolean(b)) => {
            let b = Value::number(*b as u8 as f64);
            loose_eq(vm, &b, other)
        }
        (Value::Object(_), Value::Object(_)) => Ok(strict_eq(left, right)),
        (Value::Object(_), _) => {
            let left = left.to_primitive(vm, PreferredType::Default)?;
            loose_eq(vm, &left, right)
        }
        (_, Value::Object(_)) => {
            let right = right.to_primitive(vm, PreferredType::Default)?;
            loose_eq(vm, left, &right)
        }
        _ => Ok(strict_eq(left, right)),
    }
}

/// `IsLessThan`. Returns `None` when either operand is `NaN`.
fn compare(vm: &mut Vm, left: &Value, right: &Value) -> Result<Option<Ordering>, Unwind> {
    let left = left.to_primitive(vm, PreferredType::Number)?;
    let right = right.to_primitive(vm, PreferredType::Number)?;

    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Some(a.cmp(b)));
    }

    let a = left.to_number(vm)?;
    let b = right.to_number(vm)?;
    Ok(a.partial_cmp(&b))
}

pub fn lt(vm: &mut Vm, left: &Value, right: &Value) -> Result<bool, Unwind> {
    compare(vm, left, right).map(|o| o == Some(Ordering::Less))
}

pub fn le(vm: &mut Vm, left: &Value, right: &Value) -> Result<bool, Unwind> {
    compare(vm, left, right).map(|o| matches!(o, Some(Ordering::Less | Ordering::Equal)))
}

pub fn gt(vm: &mut Vm, left: &Value, right: &Value) -> Result<bool, Unwind> {
    compare(vm, left, right).map(|o| o == Some(Ordering::Greater))
}

pub fn ge(vm: &mut Vm, left: &Value, right: &Value) -> Result<bool, Unwind> {
    compare(vm, left, right).map(|o| matches!(o, Some(Ordering::Greater | Ordering::Equal)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::VmParams;

    #[test]
    fn strict_equality() {
        assert!(strict_eq(&Value::Undefined, &Value::Undefined));
        assert!(!strict_eq(&Value::Undefined, &Value::Null));
        assert!(!strict_eq(&Value::number(f64::NAN), &Value::number(f64::NAN)));
        assert!(strict_eq(&Value::number(0.0), &Value::number(-0.0)));
        assert!(strict_eq(&Value::string("a"), &Value::string("a")));
    }

    #[test]
    fn loose_equality() {
        let mut vm = Vm::new(VmParams::new());
        assert!(loose_eq(&mut vm, &Value::Undefined, &Value::Null).unwrap());
        assert!(loose_eq(&mut vm, &Value::string("1"), &Value::number(1.0)).unwrap());
        assert!(loose_eq(&mut vm, &Value::Boolean(true), &Value::string("1")).unwrap());
        assert!(!loose_eq(&mut vm, &Value::Null, &Value::number(0.0)).unwrap());
    }

    #[test]
    fn relational() {
        let mut vm = Vm::new(VmParams::new());
        assert!(lt(&mut vm, &Value::string("a"), &Value::string("b")).unwrap());
        assert!(lt(&mut vm, &Value::number(1.0), &Value::string("2")).unwrap());
        assert!(!le(&mut vm, &Value::number(f64::NAN), &Value::number(1.0)).unwrap());
        assert!(ge(&mut vm, &Value::Null, &Value::number(0.0)).unwrap());
    }
}
