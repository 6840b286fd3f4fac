use quill_lexer::Lexer;
use quill_middle::interner::{StringInterner, sym};
use quill_middle::lexer::token::TokenType;
use quill_middle::parser::error::Error;
use quill_middle::parser::expr::{ExprKind, FunctionCall, LiteralExpr};
use quill_middle::parser::statement::{FunctionKind, Statement, StatementKind, VariableDeclarations};

use crate::Parser;

fn parse(source: &str) -> Result<Vec<Statement>, Vec<Error>> {
    let mut interner = StringInterner::new();
    let tokens = Lexer::new(&mut interner, source).scan_all()?;
    Parser::new(&mut interner, source, tokens).parse_all()
}

fn first_error(source: &str) -> Error {
    parse(source).expect_err("source should not parse").remove(0)
}

#[test]
fn new_target_in_function() {
    let stmts = parse("function f() { return new.target; }").unwrap();
    let StatementKind::Function(fun) = &stmts[0].kind else {
        panic!("expected a function declaration");
    };
    let StatementKind::Return(ret) = &fun.statements[0].kind else {
        panic!("expected a return statement");
    };
    assert_eq!(ret.0.kind, ExprKind::NewTarget);
}

#[test]
fn new_target_in_arrow_nested_in_function() {
    parse("function f() { var g = () => new.target; var h = () => () => { return new.target } }").unwrap();
}

#[test]
fn new_target_outside_function_is_early_error() {
    assert!(matches!(first_error("new.target"), Error::NewTargetOutsideFunction(_)));
    assert!(matches!(
        first_error("var f = () => new.target;"),
        Error::NewTargetOutsideFunction(_)
    ));
    assert!(matches!(
        first_error("if (true) { new.target }"),
        Error::NewTargetOutsideFunction(_)
    ));
}

#[test]
fn new_without_arguments() {
    let stmts = parse("new F;").unwrap();
    let StatementKind::Expression(expr) = &stmts[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call(FunctionCall {
        constructor_call,
        arguments,
        ..
    }) = &expr.kind
    else {
        panic!("expected a call");
    };
    assert!(*constructor_call);
    assert!(arguments.is_empty());
}

#[test]
fn new_binds_member_expression_not_call() {
    // new a.b(1).c is (new a.b(1)).c
    let stmts = parse("new a.b(1).c").unwrap();
    let StatementKind::Expression(expr) = &stmts[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::PropertyAccess(access) = &expr.kind else {
        panic!("expected a property access, got {:?}", expr.kind);
    };
    let ExprKind::Call(call) = &access.target.kind else {
        panic!("expected a constructor call");
    };
    assert!(call.constructor_call);
    assert_eq!(call.arguments.len(), 1);
    assert!(matches!(call.target.kind, ExprKind::PropertyAccess(_)));
}

#[test]
fn automatic_semicolon_insertion() {
    let stmts = parse("var mth = () => { return 1; }\nassert(mth())\nx\n++y").unwrap();
    assert_eq!(stmts.len(), 4);
    assert!(matches!(stmts[3].kind, StatementKind::Expression(_)));

    assert!(parse("a b").is_err());
}

#[test]
fn return_without_value_before_line_break() {
    let stmts = parse("function f() { return\n1 }").unwrap();
    let StatementKind::Function(fun) = &stmts[0].kind else {
        panic!("expected a function declaration");
    };
    assert_eq!(fun.statements.len(), 2);
    let StatementKind::Return(ret) = &fun.statements[0].kind else {
        panic!("expected a return statement");
    };
    assert_eq!(ret.0.kind, ExprKind::Literal(LiteralExpr::Undefined));
}

#[test]
fn early_errors() {
    assert!(matches!(first_error("return 1;"), Error::ReturnOutsideFunction(_)));
    assert!(matches!(first_error("break;"), Error::IllegalBreak(_)));
    assert!(matches!(
        first_error("while (1) { (function () { continue; }) }"),
        Error::IllegalBreak(_)
    ));
    assert!(matches!(first_error("const x;"), Error::MissingInitializerInConst(_)));
    assert!(matches!(first_error("1 = 2"), Error::InvalidAssignmentTarget(_)));
    assert!(matches!(first_error("f("), Error::UnexpectedEof));
}

#[test]
fn arrow_functions() {
    let stmts = parse("var f = (a, b = 2) => a + b, g = x => { return x }").unwrap();
    let StatementKind::Variable(VariableDeclarations(decls)) = &stmts[0].kind else {
        panic!("expected a variable declaration");
    };
    for decl in decls {
        let ExprKind::Function(fun) = &decl.value.as_ref().unwrap().kind else {
            panic!("expected a function");
        };
        assert_eq!(fun.ty, FunctionKind::Arrow);
    }
    let ExprKind::Function(f) = &decls[0].value.as_ref().unwrap().kind else {
        unreachable!()
    };
    assert_eq!(f.parameters.len(), 2);
    assert!(f.parameters[1].default.is_some());
}

#[test]
fn precedence() {
    let stmts = parse("1 + 2 * 3 ** 2 ** 1").unwrap();
    let StatementKind::Expression(expr) = &stmts[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Binary(add) = &expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(add.operator, TokenType::Plus);
    let ExprKind::Binary(mul) = &add.right.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(mul.operator, TokenType::Star);
    let ExprKind::Binary(pow) = &mul.right.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(pow.operator, TokenType::Exponentiation);
    assert!(matches!(pow.right.kind, ExprKind::Binary(_)));
}

#[test]
fn object_literals() {
    let stmts = parse("({ a: 1, b, c() { return this }, [d]: 2, 'e': 3, 4: 5, new: 6 })").unwrap();
    let StatementKind::Expression(expr) = &stmts[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Grouping(group) = &expr.kind else {
        panic!("expected a grouping");
    };
    let ExprKind::Object(obj) = &group.0[0].kind else {
        panic!("expected an object literal");
    };
    assert_eq!(obj.0.len(), 7);
    assert!(matches!(&obj.0[1].1.kind, ExprKind::Literal(LiteralExpr::Identifier(_))));
    assert!(matches!(&obj.0[2].1.kind, ExprKind::Function(_)));
}

#[test]
fn this_is_an_identifier_literal() {
    let stmts = parse("this").unwrap();
    assert_eq!(
        stmts[0].kind,
        StatementKind::Expression(quill_middle::parser::expr::Expr {
            span: stmts[0].span,
            kind: ExprKind::Literal(LiteralExpr::Identifier(sym::this)),
        })
    );
}

#[test]
fn try_statements() {
    parse("try { a() } catch (e) { b(e) } finally { c() }").unwrap();
    parse("try { a() } catch { b() }").unwrap();
    parse("try { a() } finally { c() }").unwrap();
    assert!(parse("try { a() }").is_err());
}

#[test]
fn deep_nesting_is_rejected() {
    let source = format!("{}1{}", "(".repeat(3000), ")".repeat(3000));
    assert!(matches!(first_error(&source), Error::NestingTooDeep(_)));

    let source = format!("{}1", "!".repeat(3000));
    assert!(matches!(first_error(&source), Error::NestingTooDeep(_)));

    let source = format!("{}{}", "{".repeat(3000), "}".repeat(3000));
    assert!(matches!(first_error(&source), Error::NestingTooDeep(_)));
}

#[test]
fn moderate_nesting_parses() {
    parse(&format!("{}1{}", "(".repeat(64), ")".repeat(64))).unwrap();
    parse(&format!("{}{}", "{".repeat(64), "}".repeat(64))).unwrap();
}
