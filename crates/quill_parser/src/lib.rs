use quill_log::debug;
use quill_middle::interner::{StringInterner, Symbol};
use quill_middle::lexer::token::{Token, TokenType};
use quill_middle::parser::error::{Error, TokenTypeSuggestion};
use quill_middle::parser::statement::{FunctionKind, Statement};
use quill_middle::sourcemap::Span;

mod expr;
mod stmt;

pub use expr::ExpressionParser;
pub use stmt::StatementParser;

/// How deeply statements and expressions may nest before parsing fails
const MAX_NESTING: usize = 128;

/// Per-function parser state, used for the early errors that depend on the enclosing function
#[derive(Debug, Clone, Copy)]
struct FunctionContext {
    /// `None` for the script itself
    kind: Option<FunctionKind>,
    /// Number of loops enclosing the current position within this function
    loop_depth: usize,
}

/// A JavaScript source code parser
pub struct Parser<'a, 'interner> {
    tokens: Box<[Token]>,
    errors: Vec<Error>,
    idx: usize,
    interner: &'interner mut StringInterner,
    source: &'a str,
    function_stack: Vec<FunctionContext>,
    nesting: usize,
}

impl<'a, 'interner> Parser<'a, 'interner> {
    /// Creates a new parser from tokens generated by a [Lexer]
    ///
    /// [Lexer]: quill_lexer::Lexer
    pub fn new(interner: &'interner mut StringInterner, source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_boxed_slice(),
            errors: Vec::new(),
            idx: 0,
            interner,
            source,
            function_stack: vec![FunctionContext {
                kind: None,
                loop_depth: 0,
            }],
            nesting: 0,
        }
    }

    /// Creates a new parser from a source string
    #[cfg(feature = "from_string")]
    pub fn from_str(interner: &'interner mut StringInterner, source: &'a str) -> Result<Self, Vec<Error>> {
        quill_lexer::Lexer::new(interner, source)
            .scan_all()
            .map(|tok| Self::new(interner, source, tok))
    }

    /// Attempts to parse all tokens into a list of top level statements
    pub fn parse_all(mut self) -> Result<Vec<Statement>, Vec<Error>> {
        let mut stmts = Vec::new();

        while !self.is_eof() {
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => break,
            }
        }

        if self.errors.is_empty() {
            debug!("parsed {} top level statements", stmts.len());
            Ok(stmts)
        } else {
            Err(self.errors)
        }
    }

    fn create_error(&mut self, err: Error) {
        debug!("parse error: {err}");
        self.errors.push(err);
    }

    fn error_unexpected_current(&mut self, expected: impl Into<TokenTypeSuggestion>) {
        match self.current().copied() {
            Some(token) => self.create_error(Error::unexpected_token(token, expected)),
            None => self.create_error(Error::UnexpectedEof),
        }
    }

    /// Checks if the current token is one of `ty` and skips it if so.
    /// If `emit_error` is set and the token does not match, an error is created.
    fn expect_token_type_and_skip(&mut self, ty: &'static [TokenType], emit_error: bool) -> bool {
        match self.current() {
            Some(token) if ty.contains(&token.ty) => {
                self.advance();
                true
            }
            _ => {
                if emit_error {
                    self.error_unexpected_current(ty);
                }
                false
            }
        }
    }

    /// Like [`Parser::expect_token_type_and_skip`] with `emit_error` set, but returns an `Option` for use with `?`
    fn expect(&mut self, ty: &'static [TokenType]) -> Option<()> {
        self.expect_token_type_and_skip(ty, true).then_some(())
    }

    /// Expects an identifier and returns its symbol
    fn expect_identifier(&mut self, emit_error: bool) -> Option<Symbol> {
        match self.current().and_then(|t| t.ty.as_identifier()) {
            Some(ident) => {
                self.advance();
                Some(ident)
            }
            None => {
                if emit_error {
                    self.error_unexpected_current(TokenTypeSuggestion::Unknown);
                }
                None
            }
        }
    }

    /// Terminates a statement: consumes a `;`, or accepts an automatically inserted one
    /// before a `}`, at the end of input or after a line break.
    fn expect_statement_end(&mut self) -> Option<()> {
        match self.current() {
            Some(Token {
                ty: TokenType::Semicolon,
                ..
            }) => {
                self.advance();
                Some(())
            }
            None
            | Some(Token {
                ty: TokenType::RightBrace,
                ..
            }) => Some(()),
            Some(_) if self.at_line_start() => Some(()),
            Some(_) => {
                self.error_unexpected_current(TokenType::Semicolon);
                None
            }
        }
    }

    /// Whether a line terminator separates the previous token and the current one
    fn at_line_start(&self) -> bool {
        match (self.previous(), self.current()) {
            (Some(prev), Some(cur)) => prev.span.line_break_before(cur.span, self.source),
            _ => false,
        }
    }

    fn is_eof(&self) -> bool {
        self.idx >= self.tokens.len()
    }

    fn advance(&mut self) {
        self.idx += 1;
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.idx)
    }

    fn current_ty(&self) -> Option<TokenType> {
        self.current().map(|t| t.ty)
    }

    fn peek_ty(&self, offset: usize) -> Option<TokenType> {
        self.tokens.get(self.idx + offset).map(|t| t.ty)
    }

    fn previous(&self) -> Option<&Token> {
        self.idx.checked_sub(1).and_then(|idx| self.tokens.get(idx))
    }

    /// Span of the current token, or an empty span at the end of input
    fn current_span(&self) -> Span {
        match self.current() {
            Some(token) => token.span,
            None => {
                let end = self.source.len() as u32;
                Span { lo: end, hi: end }
            }
        }
    }

    /// Span starting at `lo` and ending at the previous token
    fn span_from(&self, lo: Span) -> Span {
        match self.previous() {
            Some(prev) if prev.span.hi >= lo.lo => lo.to(prev.span),
            _ => lo,
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.current().copied();
        if token.is_some() {
            self.advance();
        } else {
            self.create_error(Error::UnexpectedEof);
        }
        token
    }

    /// Runs `f` in the context of a new function of the given kind
    fn with_function_context<T>(&mut self, kind: FunctionKind, f: impl FnOnce(&mut Self) -> T) -> T {
        self.function_stack.push(FunctionContext {
            kind: Some(kind),
            loop_depth: 0,
        });
        let res = f(self);
        self.function_stack.pop();
        res
    }

    /// Runs `f` one nesting level deeper, or fails if that exceeds [`MAX_NESTING`]
    fn with_nesting<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.nesting >= MAX_NESTING {
            let span = self.current_span();
            self.create_error(Error::NestingTooDeep(span));
            return None;
        }

        self.nesting += 1;
        let res = f(self);
        self.nesting -= 1;
        res
    }

    /// Runs `f` in the body of a loop
    fn with_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        if let Some(ctx) = self.function_stack.last_mut() {
            ctx.loop_depth += 1;
        }
        let res = f(self);
        if let Some(ctx) = self.function_stack.last_mut() {
            ctx.loop_depth -= 1;
        }
        res
    }

    fn in_loop(&self) -> bool {
        self.function_stack.last().is_some_and(|ctx| ctx.loop_depth > 0)
    }

    fn in_function(&self) -> bool {
        self.function_stack.len() > 1
    }

    /// `new.target` is available in ordinary functions, and in arrow functions nested in one
    fn new_target_allowed(&self) -> bool {
        self.function_stack
            .iter()
            .any(|ctx| ctx.kind == Some(FunctionKind::Function))
    }
}

#[cfg(test)]
mod test;
