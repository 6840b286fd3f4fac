use std::rc::Rc;

use quill_lexer::Lexer;
use quill_middle::compiler::CompileResult;
use quill_middle::compiler::constant::{Constant, Function};
use quill_middle::compiler::external::External;
use quill_middle::compiler::instruction::{AssignKind, Instruction};
use quill_middle::interner::StringInterner;
use quill_middle::parser::error::Error;
use quill_middle::parser::statement::FunctionKind;
use quill_parser::Parser;

use super::FunctionCompiler;

const ADD: u8 = Instruction::Add as u8;
const POP: u8 = Instruction::Pop as u8;
const UNDEF: u8 = Instruction::Undef as u8;
const CONSTANT: u8 = Instruction::Constant as u8;
const LDGLOBAL: u8 = Instruction::LdGlobal as u8;
const STOREGLOBAL: u8 = Instruction::StoreGlobal as u8;
const DECLAREGLOBAL: u8 = Instruction::DeclareGlobal as u8;
const TYPEOFGLOBAL: u8 = Instruction::TypeOfGlobal as u8;
const LDLOCALEXT: u8 = Instruction::LdLocalExt as u8;
const STATICPROPACCESS: u8 = Instruction::StaticPropAccess as u8;
const CALL: u8 = Instruction::Call as u8;
const NEWTARGET: u8 = Instruction::NewTarget as u8;
const RET: u8 = Instruction::Ret as u8;
const ASSIGN: u8 = AssignKind::Assignment as u8;

fn try_compile(source: &str) -> Result<CompileResult, Error> {
    let mut interner = StringInterner::new();
    let tokens = Lexer::new(&mut interner, source).scan_all().expect("Lex error");
    let ast = Parser::new(&mut interner, source, tokens)
        .parse_all()
        .expect("Parse error");

    FunctionCompiler::new(&interner, Rc::from(source)).compile_ast(ast, true)
}

fn compile(source: &str) -> CompileResult {
    try_compile(source).expect("Compile error")
}

/// Returns the function constant at `index` of a constant pool
fn function_at(constants: &[Constant], index: usize) -> Rc<Function> {
    match &constants[index] {
        Constant::Function(fun) => Rc::clone(fun),
        other => panic!("expected function constant, got {other:?}"),
    }
}

#[test]
pub fn empty() {
    let c = compile("");
    assert_eq!(c.instructions, [UNDEF, RET, 0, 0]);
    assert!(c.cp.is_empty());
}

#[test]
fn binary_math() {
    let c = compile("1234 + 5678");
    assert_eq!(c.instructions, [CONSTANT, 0, 0, CONSTANT, 1, 0, ADD, RET, 0, 0]);
    assert_eq!(c.cp[0].as_number(), Some(1234.0));
    assert_eq!(c.cp[1].as_number(), Some(5678.0));
}

#[test]
fn script_var_is_global() {
    let c = compile("var x = 1;");
    assert_eq!(
        c.instructions,
        [
            DECLAREGLOBAL, 0, 0, CONSTANT, 1, 0, STOREGLOBAL, 0, 0, ASSIGN, POP, UNDEF, RET, 0, 0
        ]
    );
    assert_eq!(c.locals, 0);
}

#[test]
fn function_declaration_is_hoisted() {
    let c = compile("function demo() { return new.target; }");
    assert_eq!(
        c.instructions,
        [
            DECLAREGLOBAL, 0, 0, CONSTANT, 1, 0, STOREGLOBAL, 0, 0, ASSIGN, POP, UNDEF, RET, 0, 0
        ]
    );

    let demo = function_at(&c.cp, 1);
    assert_eq!(demo.ty, FunctionKind::Function);
    assert_eq!(demo.params, 0);
    assert!(demo.buffer.starts_with(&[NEWTARGET, RET, 0, 0]));
    assert_eq!(demo.source_text(), "function demo() { return new.target; }");
}

#[test]
fn constructor_call_sets_metadata() {
    let c = compile("new F(1)");
    assert_eq!(c.instructions, [LDGLOBAL, 0, 0, CONSTANT, 1, 0, CALL, 0b1000_0001, RET, 0, 0]);
}

#[test]
fn method_call_preserves_this() {
    let c = compile("a.b()");
    assert_eq!(
        c.instructions,
        [LDGLOBAL, 0, 0, STATICPROPACCESS, 1, 0, 1, CALL, 0b0100_0000, RET, 0, 0]
    );
}

#[test]
fn typeof_undeclared_global() {
    let c = compile("typeof x");
    assert_eq!(c.instructions, [TYPEOFGLOBAL, 0, 0, RET, 0, 0]);
}

#[test]
fn arrow_captures_enclosing_local() {
    let c = compile("function outer() { let x = 1; return () => x; }");
    let outer = function_at(&c.cp, 1);
    assert_eq!(outer.locals, 1);

    let arrow = outer
        .constants
        .iter()
        .find_map(|c| match c {
            Constant::Function(f) => Some(Rc::clone(f)),
            _ => None,
        })
        .expect("arrow function constant");

    assert_eq!(arrow.ty, FunctionKind::Arrow);
    assert_eq!(
        &*arrow.externals,
        [External {
            id: 0,
            is_nested_external: false
        }]
    );
    assert!(arrow.buffer.starts_with(&[LDLOCALEXT, 0, 0, RET, 0, 0]));
}

#[test]
fn nested_externals_are_threaded() {
    let c = compile("function a() { let x; return function b() { return function c() { return x; }; }; }");

    let a = function_at(&c.cp, 1);
    let b = a
        .constants
        .iter()
        .find_map(|c| match c {
            Constant::Function(f) => Some(Rc::clone(f)),
            _ => None,
        })
        .expect("function b");
    let c = b
        .constants
        .iter()
        .find_map(|c| match c {
            Constant::Function(f) => Some(Rc::clone(f)),
            _ => None,
        })
        .expect("function c");

    assert_eq!(
        &*b.externals,
        [External {
            id: 0,
            is_nested_external: false
        }]
    );
    assert_eq!(
        &*c.externals,
        [External {
            id: 0,
            is_nested_external: true
        }]
    );
}

#[test]
fn const_assignment_is_rejected() {
    assert!(matches!(try_compile("const x = 1; x = 2;"), Err(Error::ConstAssignment(..))));
    assert!(matches!(
        try_compile("function f() { const y = 1; return () => { y++; }; }"),
        Err(Error::ConstAssignment(..))
    ));
}

#[test]
fn parameters_are_locals() {
    let c = compile("function f(a, b = 2) { var c = a + b; return c; }");
    let f = function_at(&c.cp, 1);
    assert_eq!(f.params, 2);
    assert_eq!(f.locals, 3);
}
