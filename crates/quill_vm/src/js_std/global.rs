use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use quill_compiler::FunctionCompiler;
use quill_log::debug;

use crate::throw;
use crate::value::function::native::CallContext;
use crate::value::ops::conversions::{ValueConversion, parse_radix_digits};
use crate::value::{Unwind, Value, ValueContext};
use crate::Vm;

fn print_line(vm: &mut Vm, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(arg.to_js_string(vm)?);
    }
    let line = parts.join(" ");

    match vm.params().print_callback() {
        Some(callback) => callback(vm, &line),
        None => println!("{line}"),
    }
    Ok(Value::Undefined)
}

pub fn log(cx: CallContext) -> Result<Value, Unwind> {
    print_line(cx.vm, cx.args)
}

pub fn print(cx: CallContext) -> Result<Value, Unwind> {
    print_line(cx.vm, cx.args)
}

/// `assert(cond, message?)`. A falsy condition aborts execution; script code cannot catch it.
pub fn assert(cx: CallContext) -> Result<Value, Unwind> {
    if cx.args.first().is_some_and(Value::is_truthy) {
        return Ok(Value::Undefined);
    }

    let message = match cx.args.get(1) {
        Some(message) => format!("Assertion failed: {}", message.to_js_string(cx.vm)?),
        None => String::from("Assertion failed"),
    };
    Err(Unwind::Abort(message))
}

/// Indirect `eval`: the code runs as a script in the global scope
pub fn eval(cx: CallContext) -> Result<Value, Unwind> {
    let source = match cx.args.first() {
        Some(Value::String(source)) => source.clone(),
        other => return Ok(other.unwrap_or_undefined()),
    };

    let opt = cx.vm.params().opt_level();
    let cr = match FunctionCompiler::compile_str(&mut cx.vm.interner, &source, opt) {
        Ok(cr) => cr,
        Err(errors) => {
            debug!(errors = errors.len(), "eval rejected its input");
            let message = errors.first().map(ToString::to_string).unwrap_or_default();
            throw!(cx.vm, SyntaxError, message)
        }
    };

    cx.vm.execute_script(cr, &source)
}

pub fn is_nan(cx: CallContext) -> Result<Value, Unwind> {
    let number = cx.args.first().unwrap_or_undefined().to_number(cx.vm)?;
    Ok(Value::Boolean(number.is_nan()))
}

pub fn is_finite(cx: CallContext) -> Result<Value, Unwind> {
    let number = cx.args.first().unwrap_or_undefined().to_number(cx.vm)?;
    Ok(Value::Boolean(number.is_finite()))
}

pub fn parse_int(cx: CallContext) -> Result<Value, Unwind> {
    let input = cx.args.first().unwrap_or_undefined().to_js_string(cx.vm)?;
    let radix = match cx.args.get(1) {
        None | Some(Value::Undefined) => 0,
        Some(radix) => radix.to_int32(cx.vm)?,
    };

    Ok(Value::number(parse_int_radix(&input, radix)))
}

pub fn parse_float(cx: CallContext) -> Result<Value, Unwind> {
    let input = cx.args.first().unwrap_or_undefined().to_js_string(cx.vm)?;
    Ok(Value::number(parse_float_prefix(&input)))
}

/// Characters that `encodeURIComponent` leaves as they are
const URI_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `encodeURI` additionally keeps the reserved characters and `#`
const URI_RESERVED_AND_UNRESERVED: &AsciiSet = &URI_UNRESERVED
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'#');

/// Escapes that `decodeURI` does not decode
const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

fn uri_argument(cx: &mut CallContext) -> Result<String, Unwind> {
    cx.args.first().unwrap_or_undefined().to_js_string(cx.vm).map(|s| s.to_string())
}

pub fn encode_uri(mut cx: CallContext) -> Result<Value, Unwind> {
    let input = uri_argument(&mut cx)?;
    Ok(Value::string(&*utf8_percent_encode(&input, URI_RESERVED_AND_UNRESERVED).to_string()))
}

pub fn encode_uri_component(mut cx: CallContext) -> Result<Value, Unwind> {
    let input = uri_argument(&mut cx)?;
    Ok(Value::string(&*utf8_percent_encode(&input, URI_UNRESERVED).to_string()))
}

pub fn decode_uri(mut cx: CallContext) -> Result<Value, Unwind> {
    let input = uri_argument(&mut cx)?;
    match decode_uri_escapes(&input, URI_RESERVED) {
        Some(decoded) => Ok(Value::string(&*decoded)),
        None => throw!(cx.vm, URIError, "URI malformed"),
    }
}

pub fn decode_uri_component(mut cx: CallContext) -> Result<Value, Unwind> {
    let input = uri_argument(&mut cx)?;
    match decode_uri_escapes(&input, &[]) {
        Some(decoded) => Ok(Value::string(&*decoded)),
        None => throw!(cx.vm, URIError, "URI malformed"),
    }
}

/// Decodes `%XX` escapes as UTF-8. Escapes of an ASCII character in `preserve` are kept as written.
/// Returns `None` for a truncated escape or an escaped byte sequence that is not UTF-8.
fn decode_uri_escapes(input: &str, preserve: &[u8]) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;

    while idx < bytes.len() {
        let Some(offset) = input[idx..].find('%') else {
            out.push_str(&input[idx..]);
            break;
        };
        out.push_str(&input[idx..idx + offset]);
        idx += offset;

        // decode a run of escapes at once, since one character may span several of them
        let start = idx;
        while bytes.get(idx) == Some(&b'%') {
            let digits = bytes.get(idx + 1..idx + 3)?;
            if !digits.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            idx += 3;
        }

        let run = &input[start..idx];
        let decoded = percent_decode_str(run).decode_utf8().ok()?;

        let mut escape = 0;
        for c in decoded.chars() {
            if c.is_ascii() && preserve.contains(&(c as u8)) {
                out.push_str(&run[escape * 3..escape * 3 + 3]);
            } else {
                out.push(c);
            }
            escape += c.len_utf8();
        }
    }

    Some(out)
}

/// Parses the longest prefix of `input` that is an integer in `radix`.
/// A radix of 0 means 10, or 16 if the digits start with `0x`.
fn parse_int_radix(input: &str, radix: i32) -> f64 {
    let input = input.trim_start();
    let (negative, input) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    let has_hex_prefix = input.starts_with("0x") || input.starts_with("0X");
    let (radix, input) = match radix {
        0 if has_hex_prefix => (16, &input[2..]),
        0 => (10, input),
        16 if has_hex_prefix => (16, &input[2..]),
        2..=36 => (radix as u32, input),
        _ => return f64::NAN,
    };

    let end = input.find(|c: char| !c.is_digit(radix)).unwrap_or(input.len());
    let value = parse_radix_digits(&input[..end], radix).unwrap_or(f64::NAN);

    if negative { -value } else { value }
}

/// Parses the longest prefix of `input` that is a decimal literal
fn parse_float_prefix(input: &str) -> f64 {
    let input = input.trim_start();
    let bytes = input.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if input[end..].starts_with("Infinity") {
        return if input.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let digits = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let int_end = digits(end);
    let mut mantissa_end = int_end;
    if bytes.get(int_end) == Some(&b'.') {
        mantissa_end = digits(int_end + 1);
    }

    // a lone "." has no digits
    if mantissa_end - end <= usize::from(mantissa_end > int_end) {
        return f64::NAN;
    }
    end = mantissa_end;

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    input[..end].parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_int_prefixes() {
        assert_eq!(parse_int_radix("  42px", 0), 42.0);
        assert_eq!(parse_int_radix("-0x1A", 0), -26.0);
        assert_eq!(parse_int_radix("ff", 16), 255.0);
        assert_eq!(parse_int_radix("101", 2), 5.0);
        assert!(parse_int_radix("px", 0).is_nan());
        assert!(parse_int_radix("10", 1).is_nan());
    }

    #[test]
    fn uri_escapes() {
        assert_eq!(decode_uri_escapes("a%20b%C3%A9", &[]).as_deref(), Some("a bé"));
        assert_eq!(decode_uri_escapes("%3Fx%3d1", URI_RESERVED).as_deref(), Some("%3Fx%3d1"));
        assert_eq!(decode_uri_escapes("%3Fx%41", &[]).as_deref(), Some("?xA"));
        assert_eq!(decode_uri_escapes("%", &[]), None);
        assert_eq!(decode_uri_escapes("%4", &[]), None);
        assert_eq!(decode_uri_escapes("%zz", &[]), None);
        assert_eq!(decode_uri_escapes("%C3", &[]), None);
        assert_eq!(decode_uri_escapes("%ED%A0%80", &[]), None);
    }

    #[test]
    fn parse_float_prefixes() {
        assert_eq!(parse_float_prefix("3.5abc"), 3.5);
        assert_eq!(parse_float_prefix(" -.5"), -0.5);
        assert_eq!(parse_float_prefix("1e3x"), 1000.0);
        assert_eq!(parse_float_prefix("2e"), 2.0);
        assert_eq!(parse_float_prefix("7."), 7.0);
        assert_eq!(parse_float_prefix("-Infinityx"), f64::NEG_INFINITY);
        assert!(parse_float_prefix(".").is_nan());
        assert!(parse_float_prefix("abc").is_nan());
    }
}
