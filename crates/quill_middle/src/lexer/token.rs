use derive_more::Display;

use crate::interner::{sym, Symbol};
use crate::sourcemap::Span;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub ty: TokenType,
    pub span: Span,
}

#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum TokenType {
    #[display("(")]
    LeftParen,
    #[display(")")]
    RightParen,
    #[display("{{")]
    LeftBrace,
    #[display("}}")]
    RightBrace,
    #[display("[")]
    LeftSquareBrace,
    #[display("]")]
    RightSquareBrace,
    #[display(",")]
    Comma,
    #[display(".")]
    Dot,
    #[display("...")]
    Spread,
    #[display("-")]
    Minus,
    #[display("+")]
    Plus,
    #[display("*")]
    Star,
    #[display("/")]
    Slash,
    #[display("%")]
    Remainder,
    #[display("**")]
    Exponentiation,
    #[display("++")]
    Increment,
    #[display("--")]
    Decrement,
    #[display("|")]
    BitwiseOr,
    #[display("^")]
    BitwiseXor,
    #[display("&")]
    BitwiseAnd,
    #[display("~")]
    BitwiseNot,
    #[display("<<")]
    LeftShift,
    #[display(">>")]
    RightShift,
    #[display(">>>")]
    UnsignedRightShift,
    #[display("||")]
    LogicalOr,
    #[display("&&")]
    LogicalAnd,
    #[display("!")]
    LogicalNot,
    #[display("??")]
    NullishCoalescing,
    #[display("?")]
    Conditional,
    #[display(":")]
    Colon,
    #[display(";")]
    Semicolon,
    #[display("=>")]
    FatArrow,
    #[display("=")]
    Assignment,
    #[display("+=")]
    AdditionAssignment,
    #[display("-=")]
    SubtractionAssignment,
    #[display("*=")]
    MultiplicationAssignment,
    #[display("/=")]
    DivisionAssignment,
    #[display("%=")]
    RemainderAssignment,
    #[display("**=")]
    ExponentiationAssignment,
    #[display("<<=")]
    LeftShiftAssignment,
    #[display(">>=")]
    RightShiftAssignment,
    #[display(">>>=")]
    UnsignedRightShiftAssignment,
    #[display("|=")]
    BitwiseOrAssignment,
    #[display("^=")]
    BitwiseXorAssignment,
    #[display("&=")]
    BitwiseAndAssignment,
    #[display("||=")]
    LogicalOrAssignment,
    #[display("&&=")]
    LogicalAndAssignment,
    #[display("??=")]
    LogicalNullishAssignment,
    #[display("==")]
    Equality,
    #[display("!=")]
    Inequality,
    #[display("===")]
    StrictEquality,
    #[display("!==")]
    StrictInequality,
    #[display(">")]
    Greater,
    #[display(">=")]
    GreaterEqual,
    #[display("<")]
    Less,
    #[display("<=")]
    LessEqual,

    #[display("if")]
    If,
    #[display("else")]
    Else,
    #[display("function")]
    Function,
    #[display("var")]
    Var,
    #[display("let")]
    Let,
    #[display("const")]
    Const,
    #[display("return")]
    Return,
    #[display("throw")]
    Throw,
    #[display("try")]
    Try,
    #[display("catch")]
    Catch,
    #[display("finally")]
    Finally,
    #[display("true")]
    TrueLit,
    #[display("false")]
    FalseLit,
    #[display("null")]
    NullLit,
    #[display("new")]
    New,
    #[display("for")]
    For,
    #[display("do")]
    Do,
    #[display("while")]
    While,
    #[display("in")]
    In,
    #[display("instanceof")]
    Instanceof,
    #[display("delete")]
    Delete,
    #[display("void")]
    Void,
    #[display("typeof")]
    Typeof,
    #[display("continue")]
    Continue,
    #[display("break")]
    Break,
    #[display("debugger")]
    Debugger,
    #[display("this")]
    This,

    #[display("identifier")]
    Identifier(Symbol),
    #[display("string literal")]
    String(Symbol),
    #[display("number literal")]
    Number(f64),
}

/// Maps keyword symbols to their token types and back.
macro_rules! keyword_tokens {
    ($($sym:ident => $variant:ident),* $(,)?) => {
        impl TokenType {
            /// Returns the keyword token for `symbol`, if it is a reserved word.
            pub fn from_keyword(symbol: Symbol) -> Option<Self> {
                match symbol {
                    $(sym::$sym => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Returns the symbol of a keyword token
            pub fn keyword_symbol(&self) -> Option<Symbol> {
                match self {
                    $(Self::$variant => Some(sym::$sym),)*
                    _ => None,
                }
            }
        }
    };
}

keyword_tokens! {
    if_ => If,
    else_ => Else,
    function => Function,
    var => Var,
    let_ => Let,
    const_ => Const,
    return_ => Return,
    throw => Throw,
    try_ => Try,
    catch => Catch,
    finally => Finally,
    true_ => TrueLit,
    false_ => FalseLit,
    null => NullLit,
    new => New,
    for_ => For,
    do_ => Do,
    while_ => While,
    in_ => In,
    instanceof => Instanceof,
    delete => Delete,
    void => Void,
    typeof_ => Typeof,
    continue_ => Continue,
    break_ => Break,
    debugger => Debugger,
    this => This,
}

/// Creates the token for a scanned word: a keyword token if it is reserved, an identifier otherwise.
pub fn as_token(symbol: Symbol) -> TokenType {
    TokenType::from_keyword(symbol).unwrap_or(TokenType::Identifier(symbol))
}

pub const ASSIGNMENT_TYPES: &[TokenType] = &[
    TokenType::Assignment,
    TokenType::AdditionAssignment,
    TokenType::SubtractionAssignment,
    TokenType::MultiplicationAssignment,
    TokenType::DivisionAssignment,
    TokenType::RemainderAssignment,
    TokenType::ExponentiationAssignment,
    TokenType::LeftShiftAssignment,
    TokenType::RightShiftAssignment,
    TokenType::UnsignedRightShiftAssignment,
    TokenType::BitwiseOrAssignment,
    TokenType::BitwiseXorAssignment,
    TokenType::BitwiseAndAssignment,
    TokenType::LogicalOrAssignment,
    TokenType::LogicalAndAssignment,
    TokenType::LogicalNullishAssignment,
];

pub const VARIABLE_TYPES: &[TokenType] = &[TokenType::Var, TokenType::Let, TokenType::Const];

impl TokenType {
    pub fn as_identifier(&self) -> Option<Symbol> {
        match self {
            Self::Identifier(sym) => Some(*sym),
            _ => None,
        }
    }

    /// Identifiers and keywords both name a property after a `.` or inside an object literal
    pub fn as_property_name(&self) -> Option<Symbol> {
        self.as_identifier().or_else(|| self.keyword_symbol())
    }

    pub fn is_assignment(&self) -> bool {
        ASSIGNMENT_TYPES.contains(self)
    }

    /// Renders this token type for "expected ..." diagnostics
    pub fn fmt_for_expected_tys(&self) -> impl std::fmt::Display + '_ {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interner::StringInterner;

    #[test]
    fn keywords_roundtrip_through_symbols() {
        let mut interner = StringInterner::new();
        let new = interner.intern("new");
        assert_eq!(as_token(new), TokenType::New);
        assert_eq!(TokenType::New.keyword_symbol(), Some(sym::new));

        let demo = interner.intern("demo");
        assert_eq!(as_token(demo), TokenType::Identifier(demo));
        assert_eq!(TokenType::This.as_property_name(), Some(sym::this));
    }

    #[test]
    fn display_uses_source_text() {
        assert_eq!(TokenType::LeftBrace.to_string(), "{");
        assert_eq!(TokenType::StrictEquality.to_string(), "===");
        assert_eq!(TokenType::Instanceof.to_string(), "instanceof");
    }
}
