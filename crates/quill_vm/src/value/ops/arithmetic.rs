use std::rc::Rc;

use crate::Vm;
use crate::value::{Unwind, Value};

use super::conversions::{PreferredType, ValueConversion};

/// The `+` operator: string concatenation if either primitive is a string, numeric addition otherwise
pub fn add(vm: &mut Vm, left: &Value, right: &Value) -> Result<Value, Unwind> {
    let left = left.to_primitive(vm, PreferredType::Default)?;
    let right = right.to_primitive(vm, PreferredType::Default)?;

    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let left = left.to_js_string(vm)?;
        let right = right.to_js_string(vm)?;
        let mut out = String::with_capacity(left.len() + right.len());
        out.push_str(&left);
        out.push_str(&right);
        return Ok(Value::String(Rc::from(out)));
    }

    Ok(Value::number(left.to_number(vm)? + right.to_number(vm)?))
}

macro_rules! numeric_op {
    ($($name:ident: |$a:ident, $b:ident| $body:expr;)*) => {
        $(
            pub fn $name(vm: &mut Vm, left: &Value, right: &Value) -> Result<Value, Unwind> {
                let $a = left.to_number(vm)?;
                let $b = right.to_number(vm)?;
                Ok(Value::number($body))
            }
        )*
    };
}

numeric_op! {
    sub: |a, b| a - b;
    mul: |a, b| a * b;
    div: |a, b| a / b;
    rem: |a, b| a % b;
    pow: |a, b| pow_f64(a, b);
}

macro_rules! int32_op {
    ($($name:ident: |$a:ident, $b:ident| $body:expr;)*) => {
        $(
            pub fn $name(vm: &mut Vm, left: &Value, right: &Value) -> Result<Value, Unwind> {
                let $a = left.to_int32(vm)?;
                let $b = right.to_uint32(vm)?;
                Ok(Value::number($body))
            }
        )*
    };
}

int32_op! {
    bitor: |a, b| (a | b as i32) as f64;
    bitxor: |a, b| (a ^ b as i32) as f64;
    bitand: |a, b| (a & b as i32) as f64;
    shl: |a, b| a.wrapping_shl(b & 31) as f64;
    shr: |a, b| a.wrapping_shr(b & 31) as f64;
    ushr: |a, b| (a as u32).wrapping_shr(b & 31) as f64;
}

/// `Number::exponentiate`, which differs from `powf` for a `NaN` exponent with base 1
fn pow_f64(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::VmParams;

    #[test]
    fn addition() {
        let mut vm = Vm::new(VmParams::new());
        let sum = add(&mut vm, &Value::number(1.0), &Value::number(2.0)).unwrap();
        assert!(matches!(sum, Value::Number(n) if n == 3.0));

        let concat = add(&mut vm, &Value::string("a"), &Value::number(1.0)).unwrap();
        assert!(matches!(concat, Value::String(s) if &*s == "a1"));

        let undef = add(&mut vm, &Value::Undefined, &Value::number(1.0)).unwrap();
        assert!(matches!(undef, Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn shifts() {
        let mut vm = Vm::new(VmParams::new());
        let v = ushr(&mut vm, &Value::number(-1.0), &Value::number(28.0)).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 15.0));
        let v = shl(&mut vm, &Value::number(1.0), &Value::number(33.0)).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 2.0));
        assert!(pow_f64(1.0, f64::NAN).is_nan());
    }
}
