use crate::interner::{sym, Symbol};
use crate::lexer::token::TokenType;
use crate::sourcemap::Span;

use super::statement::FunctionDeclaration;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Represents a binary expression
    Binary(BinaryExpr),
    /// Represents a grouping expression
    Grouping(GroupingExpr),
    /// Represents a literal expression
    Literal(LiteralExpr),
    /// Represents an unary expression
    Unary(UnaryExpr),
    /// Represents an assignment expression
    Assignment(AssignmentExpr),
    /// Represents a function call expression
    Call(FunctionCall),
    /// Represents a conditional expression
    Conditional(ConditionalExpr),
    /// Represents a property access expression
    PropertyAccess(PropertyAccessExpr),
    /// Represents a sequence expression
    Sequence(Seq),
    /// Represents a prefix expression
    Prefix(Prefix),
    /// Represents a postfix expression
    Postfix(Postfix),
    /// Represents a function expression, including arrow functions
    Function(FunctionDeclaration),
    /// Represents an array literal expression
    Array(ArrayLiteral),
    /// Represents an object literal expression
    Object(ObjectLiteral),
    /// The `new.target` meta property
    NewTarget,
    /// Represents an empty expression
    Empty,
}

impl Expr {
    pub fn binary(l: Expr, r: Expr, op: TokenType) -> Self {
        Self {
            span: l.span.to(r.span),
            kind: ExprKind::Binary(BinaryExpr::new(l, r, op)),
        }
    }

    pub fn assignment(l: Expr, r: Expr, op: TokenType) -> Self {
        Self {
            span: l.span.to(r.span),
            kind: ExprKind::Assignment(AssignmentExpr::new(l, r, op)),
        }
    }

    pub fn conditional(condition: Expr, then: Expr, el: Expr) -> Self {
        Self {
            span: condition.span.to(el.span),
            kind: ExprKind::Conditional(ConditionalExpr {
                condition: Box::new(condition),
                then: Box::new(then),
                el: Box::new(el),
            }),
        }
    }

    pub fn number_literal(n: f64, span: Span) -> Self {
        Self {
            span,
            kind: ExprKind::Literal(LiteralExpr::Number(n)),
        }
    }

    pub fn identifier(ident: Symbol, span: Span) -> Self {
        Self {
            span,
            kind: ExprKind::Literal(LiteralExpr::Identifier(ident)),
        }
    }

    pub fn undefined_literal() -> Self {
        Self {
            span: Span::COMPILER_GENERATED,
            kind: ExprKind::Literal(LiteralExpr::Undefined),
        }
    }

    pub fn as_identifier(&self) -> Option<Symbol> {
        match &self.kind {
            ExprKind::Literal(LiteralExpr::Identifier(ident)) => Some(*ident),
            _ => None,
        }
    }

    /// Returns the truthiness of this expression if it can be determined without evaluating it
    pub fn is_truthy(&self) -> Option<bool> {
        match &self.kind {
            ExprKind::Literal(lit) => lit.is_truthy(),
            ExprKind::Function(..) | ExprKind::Array(..) | ExprKind::Object(..) => Some(true),
            ExprKind::Grouping(GroupingExpr(exprs)) if exprs.len() == 1 => exprs[0].is_truthy(),
            _ => None,
        }
    }

    /// Whether this expression may be the target of an assignment
    pub fn is_valid_assignment_target(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(LiteralExpr::Identifier(ident)) => *ident != sym::this,
            ExprKind::PropertyAccess(..) => true,
            ExprKind::Grouping(GroupingExpr(exprs)) => exprs.len() == 1 && exprs[0].is_valid_assignment_target(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub operator: TokenType,
}

impl BinaryExpr {
    pub fn new(l: Expr, r: Expr, op: TokenType) -> Self {
        Self {
            left: Box::new(l),
            right: Box::new(r),
            operator: op,
        }
    }
}

/// A parenthesized list of comma separated expressions
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingExpr(pub Vec<Expr>);

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralExpr {
    Boolean(bool),
    Identifier(Symbol),
    Number(f64),
    String(Symbol),
    Null,
    Undefined,
}

impl LiteralExpr {
    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Number(n) => Some(*n != 0.0 && !n.is_nan()),
            Self::String(s) => Some(*s != sym::empty),
            Self::Null | Self::Undefined => Some(false),
            Self::Identifier(..) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: TokenType,
    pub expr: Box<Expr>,
}

impl UnaryExpr {
    pub fn new(op: TokenType, expr: Expr) -> Self {
        Self {
            operator: op,
            expr: Box::new(expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub operator: TokenType,
}

impl AssignmentExpr {
    pub fn new(l: Expr, r: Expr, op: TokenType) -> Self {
        Self {
            left: Box::new(l),
            right: Box::new(r),
            operator: op,
        }
    }
}

/// A function call, or a constructor call if `constructor_call` is set
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub constructor_call: bool,
    pub target: Box<Expr>,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub condition: Box<Expr>,
    pub then: Box<Expr>,
    pub el: Box<Expr>,
}

/// `target.property`, or `target[property]` if `computed` is set
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessExpr {
    pub computed: bool,
    pub target: Box<Expr>,
    pub property: Box<Expr>,
}

pub type Seq = (Box<Expr>, Box<Expr>);
pub type Postfix = (TokenType, Box<Expr>);
pub type Prefix = (TokenType, Box<Expr>);

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral(pub Vec<Expr>);

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMemberKind {
    /// `{ key: value }`, `{ key }` and `{ key() {} }`
    Static(Symbol),
    /// `{ [key]: value }`
    Dynamic(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLiteral(pub Vec<(ObjectMemberKind, Expr)>);
