use crate::interner::Symbol;
use crate::sourcemap::Span;

use super::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn dummy_empty() -> Self {
        Self {
            kind: StatementKind::Empty,
            span: Span::COMPILER_GENERATED,
        }
    }

    pub fn dummy_return() -> Self {
        Self {
            kind: StatementKind::Return(ReturnStatement(Expr::undefined_literal())),
            span: Span::COMPILER_GENERATED,
        }
    }

    pub fn expression(expr: Expr) -> Self {
        Self {
            span: expr.span,
            kind: StatementKind::Expression(expr),
        }
    }
}

/// A statement node
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// An expression statement
    Expression(Expr),
    /// A variable declaration, possibly declaring several bindings
    Variable(VariableDeclarations),
    /// An if statement
    If(IfStatement),
    /// A block statement
    Block(BlockStatement),
    /// A function declaration
    Function(FunctionDeclaration),
    /// A loop statement
    Loop(Loop),
    /// A return statement
    Return(ReturnStatement),
    /// A try catch statement
    Try(TryCatch),
    /// A throw statement
    Throw(Expr),
    /// A continue statement
    Continue,
    /// A break statement
    Break,
    /// A debugger statement
    Debugger,
    /// An empty statement
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// An ordinary function, which has its own `this` and `new.target` binding
    Function,
    /// An arrow function, inheriting `this` and `new.target` from where it is created
    Arrow,
}

impl FunctionKind {
    pub fn is_arrow(&self) -> bool {
        matches!(self, Self::Arrow)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Symbol,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Option<Symbol>,
    pub parameters: Vec<Parameter>,
    pub statements: Vec<Statement>,
    pub ty: FunctionKind,
    /// Source range of the whole function, used for `Function.prototype.toString`
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableDeclarationKind {
    /// `var`, scoped to the enclosing function
    Var,
    /// `let`, scoped to the enclosing block
    Let,
    /// `const`, scoped to the enclosing block and not reassignable
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBinding {
    pub name: Symbol,
    pub kind: VariableDeclarationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub binding: VariableBinding,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarations(pub Vec<VariableDeclaration>);

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expr,
    pub then: Box<Statement>,
    pub el: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement(pub Vec<Statement>);

#[derive(Debug, Clone, PartialEq)]
pub enum Loop {
    For(ForLoop),
    While(WhileLoop),
    DoWhile(DoWhileLoop),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub init: Option<Box<Statement>>,
    pub condition: Option<Expr>,
    pub finalizer: Option<Expr>,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub condition: Expr,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileLoop {
    pub body: Box<Statement>,
    pub condition: Expr,
}

/// A return statement. `return;` is represented as returning an undefined literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement(pub Expr);

#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    pub body: Box<Statement>,
    /// The binding of `catch (e)`, `None` for `catch {}`
    pub ident: Option<Symbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryCatch {
    pub try_: Box<Statement>,
    pub catch: Option<Catch>,
    pub finally: Option<Box<Statement>>,
}
