use quill_middle::parser::error::Error;
use quill_optimizer::OptLevel;

use crate::Vm;
use crate::eval::EvalError;
use crate::params::VmParams;
use crate::value::error::{Error as ErrorObject, ErrorKind};
use crate::value::Value;

const NEW_TARGET: &str = include_str!("../../../../tests/es2015/new-target.js");

fn eval(source: &str) -> Result<Value, EvalError> {
    let mut vm = Vm::new(VmParams::new());
    let value = vm.eval(source, OptLevel::Basic);
    assert_eq!(vm.frames.len(), 0);
    assert_eq!(vm.stack.len(), 0);
    value
}

#[track_caller]
fn assert_true(source: &str) {
    match eval(source) {
        Ok(Value::Boolean(true)) => {}
        other => panic!("expected true, got {other:?}"),
    }
}

#[track_caller]
fn assert_number(source: &str, expected: f64) {
    match eval(source) {
        Ok(Value::Number(n)) => assert_eq!(n, expected),
        other => panic!("expected {expected}, got {other:?}"),
    }
}

#[track_caller]
fn assert_string(source: &str, expected: &str) {
    match eval(source) {
        Ok(Value::String(s)) => assert_eq!(&*s, expected),
        other => panic!("expected {expected:?}, got {other:?}"),
    }
}

#[track_caller]
fn assert_throws(source: &str, kind: ErrorKind) {
    match eval(source) {
        Err(EvalError::Exception(Value::Object(o))) => {
            let error = o.downcast_ref::<ErrorObject>().expect("thrown value is not an error");
            assert_eq!(error.kind, kind);
        }
        other => panic!("expected {kind:?}, got {other:?}"),
    }
}

#[test]
fn conformance_script() {
    eval(NEW_TARGET).unwrap();
}

#[test]
fn new_target_undefined_in_plain_call() {
    assert_true("function f() { return new.target; } f() === undefined");
    assert_true("var o = { m: function() { return new.target; } }; o.m() === undefined");
}

#[test]
fn new_target_is_constructor() {
    assert_true("function F() { return new.target; } new F() === F");
}

#[test]
fn nested_plain_call_resets_new_target() {
    assert_true(
        "
        var inner;
        function g() { inner = new.target; }
        function F() { g(); }
        new F();
        inner === undefined
        ",
    );
}

#[test]
fn new_target_through_call_and_apply() {
    assert_true("function f() { return new.target; } f.call(null) === undefined && f.apply(null, []) === undefined");
}

#[test]
fn eval_new_target_is_syntax_error() {
    assert_true(
        r#"
        var ok = false;
        try {
            eval("new.target");
        } catch (e) {
            ok = e instanceof SyntaxError && e instanceof Error;
        }
        ok
        "#,
    );
}

#[test]
fn eval_inside_function_is_still_global() {
    assert_true(
        r#"
        var ok = false;
        function F() {
            try {
                eval("new.target");
            } catch (e) {
                ok = e instanceof SyntaxError;
            }
        }
        new F();
        ok
        "#,
    );
}

#[test]
fn arrow_captures_new_target() {
    assert_true(
        "
        function F() {
            var a = () => new.target;
            var b = () => () => new.target;
            return a() === F && b()() === F;
        }
        var plain = F();
        new F() instanceof F && !plain
        ",
    );
}

#[test]
fn arrow_new_target_survives_constructor() {
    assert_true(
        "
        var escaped;
        function F() { escaped = () => new.target; }
        new F();
        escaped() === F
        ",
    );
}

#[test]
fn top_level_new_target_is_early_error() {
    for source in ["new.target", "var a = () => new.target;", "print(1); new.target"] {
        match eval(source) {
            Err(EvalError::Middle(errors)) => {
                assert!(matches!(errors[0], Error::NewTargetOutsideFunction(_)), "{errors:?}");
            }
            other => panic!("expected an early error for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn deep_nesting_is_an_early_error() {
    let source = format!("{}1{}", "(".repeat(3000), ")".repeat(3000));
    match eval(&source) {
        Err(EvalError::Middle(errors)) => assert!(matches!(errors[0], Error::NestingTooDeep(_)), "{errors:?}"),
        other => panic!("expected an early error, got {other:?}"),
    }

    let source = format!("var ok = false; try {{ eval('{}1{}') }} catch (e) {{ ok = e instanceof SyntaxError }} ok", "[".repeat(3000), "]".repeat(3000));
    assert_true(&source);
}

#[test]
fn constructor_result() {
    assert_true(
        "
        function F() { this.x = 1; return 5; }
        var o = new F();
        o.x === 1 && Object.getPrototypeOf(o) === F.prototype && o instanceof F
        ",
    );
    assert_true(
        "
        var other = { y: 2 };
        function G() { this.x = 1; return other; }
        new G() === other
        ",
    );
}

#[test]
fn lazy_prototype_has_constructor() {
    assert_true("function F() {} F.prototype.constructor === F && new F().constructor === F");
}

#[test]
fn new_on_arrow_is_type_error() {
    assert_throws("var a = () => 1; new a();", ErrorKind::TypeError);
    assert_throws("var x = 1; new x();", ErrorKind::TypeError);
    assert_throws("new Object.prototype.hasOwnProperty();", ErrorKind::TypeError);
}

#[test]
fn new_without_arguments() {
    assert_true("function F() { return new.target; } new F === F");
    assert_true("function G() { this.x = 1; } (new G).x === 1 && new G instanceof G");
}

#[test]
fn assert_is_uncatchable() {
    match eval("try { assert(false); } catch (e) {} 1") {
        Err(EvalError::Abort(message)) => assert_eq!(message, "Assertion failed"),
        other => panic!("expected abort, got {other:?}"),
    }
}

#[test]
fn uncaught_exceptions() {
    assert_throws("undefinedVariable", ErrorKind::ReferenceError);
    assert_throws("var o; o.x", ErrorKind::TypeError);
    assert_throws("var f = 1; f()", ErrorKind::TypeError);
    assert_throws("throw new RangeError('boom')", ErrorKind::RangeError);
}

#[test]
fn stack_overflow() {
    assert_throws("function f() { return f(); } f()", ErrorKind::RangeError);
    assert_true(
        "
        function f() { return f(); }
        var caught = false;
        try { f(); } catch (e) { caught = e instanceof RangeError; }
        caught
        ",
    );

    // recursion through natives uses native stack for every call
    assert_true(
        "
        var ok = false;
        function f() { return f.call(null); }
        try { f(); } catch (e) { ok = e instanceof RangeError; }
        ok
        ",
    );
    assert_true(
        "
        var ok = false;
        function g() { return g.apply(null, []); }
        try { g(); } catch (e) { ok = e instanceof RangeError; }
        ok
        ",
    );
    assert_throws("function f() { return f.call(null); } f()", ErrorKind::RangeError);
}

#[test]
fn native_reentry_within_limit() {
    assert_number(
        "
        function sum(n) { return n === 0 ? 0 : n + sum.call(null, n - 1); }
        sum(50)
        ",
        1275.0,
    );
}

#[test]
fn try_catch_unwinds_frames() {
    assert_number(
        "
        function thrower(n) { if (n === 0) throw 42; return thrower(n - 1); }
        var r = 0;
        try { thrower(10); } catch (e) { r = e; }
        r
        ",
        42.0,
    );
}

#[test]
fn closures_share_variables() {
    assert_number(
        "
        function counter() {
            var count = 0;
            return () => ++count;
        }
        var c = counter();
        c(); c();
        c()
        ",
        3.0,
    );
}

#[test]
fn error_objects() {
    assert_string("new TypeError('bad').toString()", "TypeError: bad");
    assert_string("new Error().toString()", "Error");
    assert_string("var e = new SyntaxError('x'); e.name + '/' + e.message", "SyntaxError/x");
    assert_true("new URIError() instanceof Error && !(new Error() instanceof TypeError)");
}

#[test]
fn operators() {
    assert_number("1 + 2 * 3 - 4 / 2", 5.0);
    assert_string("'a' + 1 + 2", "a12");
    assert_number("'3' * '4'", 12.0);
    assert_true("null == undefined && null !== undefined && NaN !== NaN");
    assert_true("typeof undeclared === 'undefined' && typeof print === 'function' && typeof null === 'object'");
    assert_true("'x' in { x: 1 } && !('y' in { x: 1 })");
    assert_number("-7 >>> 28", 15.0);
}

#[test]
fn builtins() {
    assert_number("parseInt('0x10') + parseFloat('1.5e1')", 31.0);
    assert_true("isNaN('abc') && isFinite('12') && !isFinite(Infinity)");
    assert_string("[1, 2, 3].join('-')", "1-2-3");
    assert_string("Object.prototype.toString.call([])", "[object Array]");
    assert_true("({ a: 1 }).hasOwnProperty('a') && !({}).hasOwnProperty('toString')");
    assert_number("eval('1 + 1')", 2.0);
    assert_true("eval(globalThis) === globalThis");
}

#[test]
fn string_length_counts_utf16_units() {
    assert_number("'\\u{1F600}'.length", 2.0);
    assert_number("'aé'.length", 2.0);
    assert_string("'aé'[1]", "é");
    assert_string("'\\u{1F600}x'[2]", "x");
    assert_string("'\\u{1F600}'[0]", "\u{FFFD}");
    assert_true("'\\u{1F600}'.hasOwnProperty(1) && !'\\u{1F600}'.hasOwnProperty(2)");
}

#[test]
fn uri_functions() {
    assert_string("encodeURIComponent('a b&c/é')", "a%20b%26c%2F%C3%A9");
    assert_string("encodeURI('http://x.y/a b?q=1#f')", "http://x.y/a%20b?q=1#f");
    assert_string("decodeURIComponent('a%20b%26c')", "a b&c");
    assert_string("decodeURI('a%20b%26c')", "a b%26c");
    assert_throws("decodeURIComponent('%')", ErrorKind::URIError);
    assert_true(
        "
        var ok = false;
        try { decodeURI('%E0%A4%A'); } catch (e) { ok = e instanceof URIError && e.name === 'URIError'; }
        ok
        ",
    );
}
