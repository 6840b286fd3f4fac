use std::borrow::Cow;
use std::fmt;
use std::fmt::Write;

use derive_more::Display;
use memchr::memchr;
use memchr::memmem::rfind;
use owo_colors::OwoColorize;

use crate::lexer::token::{Token, TokenType};
use crate::sourcemap::Span;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenTypeSuggestion {
    AnyOf(&'static [TokenType]),
    Exact(TokenType),
    Unknown,
}
impl From<TokenType> for TokenTypeSuggestion {
    fn from(value: TokenType) -> Self {
        Self::Exact(value)
    }
}
impl From<&'static [TokenType]> for TokenTypeSuggestion {
    fn from(value: &'static [TokenType]) -> Self {
        Self::AnyOf(value)
    }
}

/// An error that occurred during the "middle" stage of execution,
/// i.e. lexing, parsing or compiling.
///
/// The [`Display`] impl is a short one-line message, which is what `eval` puts into
/// the `SyntaxError` it throws. Use [`IntoFormattableErrors`] for full diagnostics.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum Error {
    /* Lexer */
    #[display("unknown character: {_1}")]
    UnknownCharacter(Span, char),
    #[display("unterminated string literal")]
    UnterminatedString(Span),
    #[display("invalid escape sequence")]
    InvalidEscapeSequence(Span),
    #[display("invalid number literal")]
    InvalidNumber(Span),
    /* Parser */
    #[display("unexpected token `{}`", _0.ty)]
    UnexpectedToken(Token, TokenTypeSuggestion),
    #[display("unexpected end of input")]
    UnexpectedEof,
    #[display("new.target expression is not allowed here")]
    NewTargetOutsideFunction(Span),
    #[display("return statement outside of function")]
    ReturnOutsideFunction(Span),
    #[display("illegal break or continue statement")]
    IllegalBreak(Span),
    #[display("missing initializer in const declaration")]
    MissingInitializerInConst(Span),
    #[display("invalid assignment target")]
    InvalidAssignmentTarget(Span),
    #[display("maximum nesting depth exceeded")]
    NestingTooDeep(Span),
    /* Compiler */
    #[display("assignment to constant variable")]
    ConstAssignment(Span),
    #[display("constant pool limit exceeded")]
    ConstantPoolLimitExceeded(Span),
    #[display("local variable limit exceeded")]
    LocalLimitExceeded(Span),
    #[display("parameter limit exceeded")]
    ParameterLimitExceeded(Span),
    #[display("argument limit exceeded")]
    ArgumentLimitExceeded(Span),
    #[display("array literal element limit exceeded")]
    ArrayLitLimitExceeded(Span),
    #[display("object literal property limit exceeded")]
    ObjectLitLimitExceeded(Span),
    #[display("jump distance limit exceeded")]
    JumpLimitExceeded(Span),
    #[display("unimplemented: {_1}")]
    Unimplemented(Span, String),
}

impl Error {
    pub fn unexpected_token(token: Token, v: impl Into<TokenTypeSuggestion>) -> Self {
        Self::UnexpectedToken(token, v.into())
    }

    /// The source range this error points at, if any
    pub fn span(&self) -> Option<Span> {
        match *self {
            Self::UnexpectedEof => None,
            Self::UnexpectedToken(Token { span, .. }, _) => Some(span),
            Self::UnknownCharacter(span, _) | Self::Unimplemented(span, _) => Some(span),
            Self::UnterminatedString(span)
            | Self::InvalidEscapeSequence(span)
            | Self::InvalidNumber(span)
            | Self::NewTargetOutsideFunction(span)
            | Self::ReturnOutsideFunction(span)
            | Self::IllegalBreak(span)
            | Self::MissingInitializerInConst(span)
            | Self::InvalidAssignmentTarget(span)
            | Self::NestingTooDeep(span)
            | Self::ConstAssignment(span)
            | Self::ConstantPoolLimitExceeded(span)
            | Self::LocalLimitExceeded(span)
            | Self::ParameterLimitExceeded(span)
            | Self::ArgumentLimitExceeded(span)
            | Self::ArrayLitLimitExceeded(span)
            | Self::ObjectLitLimitExceeded(span)
            | Self::JumpLimitExceeded(span) => Some(span),
        }
    }
}

pub struct FormattableError<'a, 'buf> {
    error: &'a Error,
    source: &'buf str,
    color: bool,
}

pub enum NoteKind {
    Error,
    Help,
}

pub struct Note {
    kind: NoteKind,
    span: Option<Span>,
    message: Cow<'static, str>,
}

pub struct DiagnosticBuilder<'f, 'a, 'buf> {
    fcx: &'f FormattableError<'a, 'buf>,
    message: Cow<'static, str>,
    span_notes: Vec<Note>,
}

impl<'f, 'a, 'buf> DiagnosticBuilder<'f, 'a, 'buf> {
    pub fn error(fcx: &'f FormattableError<'a, 'buf>) -> Self {
        Self {
            fcx,
            message: Cow::Owned(fcx.error.to_string()),
            span_notes: Vec::new(),
        }
    }
    pub fn message(&mut self, message: impl Into<Cow<'static, str>>) {
        self.message = message.into();
    }
    pub fn span_error(&mut self, span: Span, message: impl Into<Cow<'static, str>>) {
        self.span_notes.push(Note {
            kind: NoteKind::Error,
            message: message.into(),
            span: Some(span),
        });
    }
    pub fn help(&mut self, message: impl Into<Cow<'static, str>>) {
        self.span_notes.push(Note {
            kind: NoteKind::Help,
            message: message.into(),
            span: None,
        });
    }
}

impl<'f, 'a, 'buf> fmt::Display for DiagnosticBuilder<'f, 'a, 'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! write_style {
            ($sink:expr, $($style:ident) *, $s:expr) => {
                if self.fcx.color {
                    ::std::write!($sink, "{}", $s.$($style()).*)
                } else {
                    ::std::write!($sink, "{}", $s)
                }
            };
        }

        write_style!(f, red bold, "error: ")?;
        f.write_str(&self.message)?;

        for Note { kind, span, message } in &self.span_notes {
            f.write_str("\n\n")?;

            match *span {
                Some(span) if span.is_user_span() && span.hi as usize <= self.fcx.source.len() => {
                    let LineData {
                        relative_span_lo,
                        relative_span_hi,
                        line,
                    } = line_data(self.fcx.source, span);

                    write_style!(f, blue bold, " | ")?;
                    f.write_str(line)?;
                    f.write_char('\n')?;

                    f.write_str(&" ".repeat(3 + relative_span_lo))?;

                    let arrows = "^".repeat((relative_span_hi - relative_span_lo).max(1));
                    match kind {
                        NoteKind::Error => {
                            write_style!(f, red bold, arrows)?;
                            f.write_char(' ')?;
                            write_style!(f, red bold, message)?;
                        }
                        NoteKind::Help => {
                            write_style!(f, cyan bold, arrows)?;
                            f.write_char(' ')?;
                            write_style!(f, cyan bold, message)?;
                        }
                    }
                }
                _ => {
                    match kind {
                        NoteKind::Error => write_style!(f, red bold, "error: ")?,
                        NoteKind::Help => write_style!(f, cyan bold, "help: ")?,
                    }
                    f.write_str(message)?;
                }
            }
        }

        Ok(())
    }
}

struct LineData<'a> {
    relative_span_lo: usize,
    relative_span_hi: usize,
    line: &'a str,
}

fn line_data(source: &str, span: Span) -> LineData<'_> {
    let start_index = rfind(source[..span.lo as usize].as_bytes(), b"\n")
        .map(|x| x + 1)
        .unwrap_or(0);

    // Multi-line spans are cut off at the end of the first line
    let end_index = memchr(b'\n', source[span.lo as usize..].as_bytes())
        .map(|x| x + span.lo as usize)
        .unwrap_or(source.len());

    let relative_span_lo = span.lo as usize - start_index;
    let relative_span_hi = (span.hi as usize).min(end_index) - start_index;

    let line = &source[start_index..end_index];
    LineData {
        relative_span_lo,
        relative_span_hi,
        line,
    }
}

impl<'a, 'buf> fmt::Display for FormattableError<'a, 'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut diag = DiagnosticBuilder::error(self);
        match *self.error {
            Error::UnexpectedToken(Token { span, ty }, sugg) => {
                diag.message(format!("unexpected token `{ty}`"));
                diag.span_error(span, "");
                match sugg {
                    TokenTypeSuggestion::AnyOf(tys) => diag.help(format!(
                        "expected one of: {}",
                        tys.iter().fold(String::new(), |mut acc, ty| {
                            if !acc.is_empty() {
                                acc.push_str(", ");
                            }
                            _ = write!(acc, "`{}`", ty.fmt_for_expected_tys());
                            acc
                        })
                    )),
                    TokenTypeSuggestion::Exact(ty) => diag.help(format!("expected: `{}`", ty.fmt_for_expected_tys())),
                    TokenTypeSuggestion::Unknown => {}
                }
            }
            Error::UnexpectedEof => {
                diag.help("more tokens are expected for the last item to parse");
            }
            Error::NewTargetOutsideFunction(span) => {
                diag.span_error(span, "");
                diag.help("`new.target` is only valid inside of a function, or an arrow function nested in one");
            }
            Error::ConstAssignment(span) => {
                diag.span_error(span, "");
                diag.help("consider changing `const` to `let` to allow reassigning");
            }
            Error::ConstantPoolLimitExceeded(span) => {
                diag.span_error(span, "");
                diag.help("consider splitting this function into smaller functions as a workaround");
            }
            Error::Unimplemented(span, _) => {
                diag.span_error(span, "error occurred while processing this node");
            }
            ref other => {
                if let Some(span) = other.span() {
                    diag.span_error(span, "");
                }
            }
        }
        fmt::Display::fmt(&diag, f)
    }
}

pub trait IntoFormattableErrors {
    fn formattable<'a, 'buf>(&'a self, source: &'buf str, colors: bool) -> FormattableErrors<'a, 'buf>;
}

impl IntoFormattableErrors for [Error] {
    fn formattable<'a, 'buf>(&'a self, source: &'buf str, colors: bool) -> FormattableErrors<'a, 'buf> {
        FormattableErrors {
            errors: self,
            source,
            colors,
        }
    }
}

pub struct FormattableErrors<'a, 'buf> {
    errors: &'a [Error],
    source: &'buf str,
    colors: bool,
}

impl<'a, 'buf> fmt::Display for FormattableErrors<'a, 'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in self.errors {
            FormattableError {
                color: self.colors,
                source: self.source,
                error,
            }
            .fmt(f)?;
            f.write_str("\n\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn diagnostic_points_at_span() {
        let source = "var x = 1;\nnew.target;\n";
        let errors = [Error::NewTargetOutsideFunction(Span { lo: 11, hi: 21 })];
        let rendered = errors.formattable(source, false).to_string();
        assert!(rendered.starts_with("error: new.target expression is not allowed here"));
        assert!(rendered.contains(" | new.target;\n"));
        assert!(rendered.contains("   ^^^^^^^^^^"));
    }

    #[test]
    fn short_display_has_no_source() {
        let err = Error::UnexpectedEof;
        assert_eq!(err.to_string(), "unexpected end of input");
        assert_eq!(err.span(), None);
    }
}
