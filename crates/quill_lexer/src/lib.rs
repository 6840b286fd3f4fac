use std::borrow::Cow;
use std::ops::Range;

use quill_log::debug;
use quill_middle::interner::StringInterner;
use quill_middle::lexer::token::{as_token, Token, TokenType};
use quill_middle::parser::error::Error;
use quill_middle::sourcemap::Span;
use quill_middle::util;

/// A JavaScript source code lexer
#[derive(Debug)]
pub struct Lexer<'a, 'interner> {
    input: &'a str,

    tokens: Vec<Token>,
    errors: Vec<Error>,

    interner: &'interner mut StringInterner,

    idx: usize,
    start: usize,
}

impl<'a, 'interner> Lexer<'a, 'interner> {
    /// Creates a new lexer
    pub fn new(interner: &'interner mut StringInterner, source: &'a str) -> Self {
        assert!(source.len() < u32::MAX as usize);
        Self {
            input: source,
            idx: 0,
            start: 0,
            interner,
            errors: Vec::new(),
            tokens: Vec::new(),
        }
    }

    /// Returns the next byte
    fn next_char(&mut self) -> Option<u8> {
        let cur = self.current()?;
        self.advance();
        Some(cur)
    }

    /// Returns the byte at that index
    fn at(&self, index: usize) -> Option<u8> {
        self.input.as_bytes().get(index).copied()
    }

    /// Returns the current byte
    fn current(&self) -> Option<u8> {
        self.at(self.idx)
    }

    /// Looks ahead by one and returns the next byte
    fn peek(&self) -> Option<u8> {
        self.at(self.idx + 1)
    }

    /// Creates a span based on the current location
    fn span(&self) -> Span {
        Span {
            lo: self.start as u32,
            hi: self.idx as u32,
        }
    }

    /// Creates a token based on the current location
    fn create_contextified_token(&mut self, ty: TokenType) {
        let tok = Token { ty, span: self.span() };
        self.tokens.push(tok);
    }

    /// Creates a token based on the current location and a given predicate
    ///
    /// A token may be multiple bytes wide, in which case this function can be used.
    /// The candidates are tried in order, so longer operators must come first.
    fn create_contextified_conditional_token(&mut self, default: TokenType, tokens: &[(&str, TokenType)]) {
        for (expect, token) in tokens {
            let slice = self.safe_subslice(self.idx, self.idx + expect.len());

            if slice == *expect {
                self.idx += expect.len();
                self.create_contextified_token(*token);
                return;
            }
        }

        self.create_contextified_token(default);
    }

    fn create_error(&mut self, err: Error) {
        self.errors.push(err);
    }

    /// Returns the current lexeme
    fn get_lexeme(&self) -> &'a str {
        &self.input[self.start..self.idx]
    }

    /// Slices into the source string
    fn subslice(&self, r: Range<usize>) -> &'a str {
        &self.input[r]
    }

    /// Slices into the source string, but makes sure no panic occurs
    fn safe_subslice(&self, from: usize, to: usize) -> &'a str {
        let to = to.min(self.input.len());
        self.input.get(from..to).unwrap_or_default()
    }

    fn advance(&mut self) {
        self.idx += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.idx += n;
    }

    /// Reads `len` hex digits at the cursor as a code point
    fn read_hex_code_point(&mut self, len: usize) -> Option<u32> {
        let hex = self.input.get(self.idx..self.idx + len)?;
        let cp = parse_hex_digits(hex)?;
        self.advance_n(len);
        Some(cp)
    }

    /// Reads the code point of a `\u` escape sequence, assuming the cursor is just past the `u`
    fn read_unicode_escape(&mut self) -> Option<char> {
        let cp = if self.current() == Some(b'{') {
            self.advance();
            let end = self.input[self.idx..].find('}')?;
            let cp = parse_hex_digits(&self.input[self.idx..self.idx + end]).filter(|&cp| cp <= 0x10FFFF)?;
            self.advance_n(end + 1);
            cp
        } else {
            self.read_hex_code_point(4)?
        };

        // lone surrogates cannot be represented in a Rust string
        Some(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Reads a string literal
    ///
    /// This function expects to be one byte ahead of a quote
    fn read_string_literal(&mut self) {
        let quote = self.input.as_bytes()[self.idx - 1];

        let mut lexeme: Option<String> = None;
        let mut lexeme_starting_idx = self.idx;

        loop {
            let Some(cur) = self.current() else {
                return self.create_error(Error::UnterminatedString(self.span()));
            };

            if cur == quote {
                break;
            }

            if cur == b'\n' || cur == b'\r' {
                return self.create_error(Error::UnterminatedString(self.span()));
            }

            if cur == b'\\' {
                // Append borrowed segment since last escape sequence
                let segment = self.subslice(lexeme_starting_idx..self.idx);
                let buf = lexeme.get_or_insert_with(String::new);
                buf.push_str(segment);

                self.advance();
                let Some(escape) = self.current() else {
                    return self.create_error(Error::UnterminatedString(self.span()));
                };

                match escape {
                    b'n' | b't' | b'r' | b'b' | b'f' | b'v' => {
                        buf.push(match escape {
                            b'n' => '\n',
                            b't' => '\t',
                            b'r' => '\r',
                            b'b' => '\x08',
                            b'f' => '\x0C',
                            _ => '\x0B',
                        });
                        self.advance();
                    }
                    b'0' if !self.peek().is_some_and(util::is_digit) => {
                        buf.push('\0');
                        self.advance();
                    }
                    b'x' => {
                        self.advance();
                        match self.read_hex_code_point(2) {
                            Some(cp) => buf.push(char::from(cp as u8)),
                            None => self.create_error(Error::InvalidEscapeSequence(self.span())),
                        }
                    }
                    b'u' => {
                        self.advance();
                        match self.read_unicode_escape() {
                            Some(c) => buf.push(c),
                            None => self.create_error(Error::InvalidEscapeSequence(self.span())),
                        }
                    }
                    // line continuation
                    b'\n' => self.advance(),
                    b'\r' => {
                        self.advance();
                        if self.current() == Some(b'\n') {
                            self.advance();
                        }
                    }
                    other if !other.is_ascii() => {
                        // if the escaped character is non-ascii, decode UTF-8
                        let (c, len) = util::next_char_in_bytes(&self.input.as_bytes()[self.idx..]);
                        buf.push(c);
                        self.advance_n(len);
                    }
                    other => {
                        buf.push(other as char);
                        self.advance();
                    }
                }
                lexeme_starting_idx = self.idx;

                continue;
            }

            self.advance();
        }

        let lexeme = match lexeme {
            None => Cow::Borrowed(self.subslice(lexeme_starting_idx..self.idx)),
            Some(mut lexeme) => {
                lexeme.push_str(self.subslice(lexeme_starting_idx..self.idx));
                Cow::Owned(lexeme)
            }
        };

        // closing quote
        self.advance();

        let sym = self.interner.intern(lexeme);
        self.create_contextified_token(TokenType::String(sym));
    }

    /// Reads a prefixed number literal (0x, 0b, 0o)
    fn read_prefixed_literal(&mut self, radix: u32, predicate: fn(u8) -> bool) {
        // Skip prefix (x)
        self.advance();
        let digits_start = self.idx;

        while self.current().is_some_and(|c| c == b'_' || predicate(c)) {
            self.advance();
        }

        let digits = self.subslice(digits_start..self.idx).replace('_', "");
        if digits.is_empty() || self.current().is_some_and(util::is_identifier_part) {
            return self.create_error(Error::InvalidNumber(self.span()));
        }

        let value = match u64::from_str_radix(&digits, radix) {
            Ok(value) => value as f64,
            // Too big for u64, accumulate as a float instead
            Err(_) => digits
                .bytes()
                .map(|b| (b as char).to_digit(radix).unwrap_or(0))
                .fold(0.0, |acc, d| acc * radix as f64 + d as f64),
        };
        self.create_contextified_token(TokenType::Number(value));
    }

    /// Reads a decimal number literal, assuming the first digit (or the leading `.`) has been consumed
    fn read_number_literal(&mut self) {
        let mut is_float = self.input.as_bytes()[self.start] == b'.';
        let mut is_exp = false;

        while let Some(cur) = self.current() {
            match cur {
                b'.' if !is_float && !is_exp => is_float = true,
                b'e' | b'E' if !is_exp => {
                    // Handle signs after e, like 1e-5
                    if matches!(self.peek(), Some(b'-' | b'+')) {
                        self.advance();
                    }

                    is_exp = true;
                }
                b'_' => {}
                _ if util::is_digit(cur) => {}
                _ => break,
            }

            self.advance();
        }

        if self.current().is_some_and(util::is_identifier_start) {
            return self.create_error(Error::InvalidNumber(self.span()));
        }

        let lexeme = self.get_lexeme().replace('_', "");
        match lexeme.parse::<f64>() {
            Ok(value) => self.create_contextified_token(TokenType::Number(value)),
            Err(_) => self.create_error(Error::InvalidNumber(self.span())),
        }
    }

    /// Reads an identifier or keyword, assuming its first byte has been consumed
    fn read_identifier(&mut self) {
        while self.current().is_some_and(util::is_identifier_part) {
            self.advance();
        }

        let sym = self.interner.intern(self.get_lexeme());
        self.create_contextified_token(as_token(sym));
    }

    /// Iterates through the input string and scans the next token
    pub fn scan_next(&mut self) -> Option<()> {
        self.skip_trivia();
        self.start = self.idx;

        let cur = self.next_char()?;

        match cur {
            b'(' => self.create_contextified_token(TokenType::LeftParen),
            b')' => self.create_contextified_token(TokenType::RightParen),
            b'{' => self.create_contextified_token(TokenType::LeftBrace),
            b'}' => self.create_contextified_token(TokenType::RightBrace),
            b'[' => self.create_contextified_token(TokenType::LeftSquareBrace),
            b']' => self.create_contextified_token(TokenType::RightSquareBrace),
            b',' => self.create_contextified_token(TokenType::Comma),
            b'.' => {
                if self.current().is_some_and(util::is_digit) {
                    self.read_number_literal();
                } else {
                    self.create_contextified_conditional_token(TokenType::Dot, &[("..", TokenType::Spread)])
                }
            }
            b'-' => self.create_contextified_conditional_token(
                TokenType::Minus,
                &[("-", TokenType::Decrement), ("=", TokenType::SubtractionAssignment)],
            ),
            b'+' => self.create_contextified_conditional_token(
                TokenType::Plus,
                &[("+", TokenType::Increment), ("=", TokenType::AdditionAssignment)],
            ),
            b'*' => self.create_contextified_conditional_token(
                TokenType::Star,
                &[
                    ("*=", TokenType::ExponentiationAssignment),
                    ("*", TokenType::Exponentiation),
                    ("=", TokenType::MultiplicationAssignment),
                ],
            ),
            b'/' => {
                // Regular expression literals are not supported, so a slash is always division
                self.create_contextified_conditional_token(TokenType::Slash, &[("=", TokenType::DivisionAssignment)])
            }
            b'|' => self.create_contextified_conditional_token(
                TokenType::BitwiseOr,
                &[
                    ("|=", TokenType::LogicalOrAssignment),
                    ("=", TokenType::BitwiseOrAssignment),
                    ("|", TokenType::LogicalOr),
                ],
            ),
            b'^' => self.create_contextified_conditional_token(
                TokenType::BitwiseXor,
                &[("=", TokenType::BitwiseXorAssignment)],
            ),
            b'&' => self.create_contextified_conditional_token(
                TokenType::BitwiseAnd,
                &[
                    ("&=", TokenType::LogicalAndAssignment),
                    ("=", TokenType::BitwiseAndAssignment),
                    ("&", TokenType::LogicalAnd),
                ],
            ),
            b'>' => self.create_contextified_conditional_token(
                TokenType::Greater,
                &[
                    (">>=", TokenType::UnsignedRightShiftAssignment),
                    (">=", TokenType::RightShiftAssignment),
                    (">>", TokenType::UnsignedRightShift),
                    ("=", TokenType::GreaterEqual),
                    (">", TokenType::RightShift),
                ],
            ),
            b'<' => self.create_contextified_conditional_token(
                TokenType::Less,
                &[
                    ("<=", TokenType::LeftShiftAssignment),
                    ("=", TokenType::LessEqual),
                    ("<", TokenType::LeftShift),
                ],
            ),
            b'%' => self
                .create_contextified_conditional_token(TokenType::Remainder, &[("=", TokenType::RemainderAssignment)]),
            b'!' => self.create_contextified_conditional_token(
                TokenType::LogicalNot,
                &[("==", TokenType::StrictInequality), ("=", TokenType::Inequality)],
            ),
            b'~' => self.create_contextified_token(TokenType::BitwiseNot),
            b'?' => {
                // `a?.5:b` is a conditional, not optional chaining, and `??` may be followed by `=`
                self.create_contextified_conditional_token(
                    TokenType::Conditional,
                    &[("?=", TokenType::LogicalNullishAssignment), ("?", TokenType::NullishCoalescing)],
                )
            }
            b':' => self.create_contextified_token(TokenType::Colon),
            b';' => self.create_contextified_token(TokenType::Semicolon),
            b'=' => self.create_contextified_conditional_token(
                TokenType::Assignment,
                &[
                    ("==", TokenType::StrictEquality),
                    ("=", TokenType::Equality),
                    (">", TokenType::FatArrow),
                ],
            ),
            b'"' | b'\'' => self.read_string_literal(),
            b'0' if matches!(self.current(), Some(b'x' | b'X')) => {
                self.read_prefixed_literal(16, util::is_hex_digit)
            }
            b'0' if matches!(self.current(), Some(b'b' | b'B')) => {
                self.read_prefixed_literal(2, util::is_binary_digit)
            }
            b'0' if matches!(self.current(), Some(b'o' | b'O')) => {
                self.read_prefixed_literal(8, util::is_octal_digit)
            }
            _ if util::is_digit(cur) => self.read_number_literal(),
            _ if util::is_identifier_start(cur) => self.read_identifier(),
            _ => {
                // report the whole character once, instead of once per byte
                let (c, len) = util::next_char_in_bytes(&self.input.as_bytes()[self.start..]);
                self.advance_n(len - 1);
                self.create_error(Error::UnknownCharacter(self.span(), c));
            }
        };
        Some(())
    }

    /// Skips whitespace and comments
    fn skip_trivia(&mut self) {
        loop {
            match self.current() {
                Some(b'\n' | b'\r' | b'\t' | b' ' | 0x0B | 0x0C) => self.advance(),
                Some(b'/') if self.peek() == Some(b'/') => self.skip_single_line_comment(),
                Some(b'/') if self.peek() == Some(b'*') => self.skip_multi_line_comment(),
                Some(0xC2) if self.peek() == Some(0xA0) => self.advance_n(2),
                _ => return,
            }
        }
    }

    /// Skips a single line comment, up to but not including the line terminator
    fn skip_single_line_comment(&mut self) {
        while let Some(ch) = self.current() {
            if ch == b'\n' || ch == b'\r' {
                return;
            }

            self.advance();
        }
    }

    /// Skips a multi line comment
    fn skip_multi_line_comment(&mut self) {
        self.start = self.idx;
        self.advance_n(2);
        while let Some(ch) = self.current() {
            if ch == b'*' && self.peek() == Some(b'/') {
                self.advance_n(2);
                return;
            }

            self.advance();
        }

        self.create_error(Error::UnexpectedEof);
    }

    /// Drives this lexer to completion
    ///
    /// Calling this function will exhaust the lexer and return all tokens
    pub fn scan_all(mut self) -> Result<Vec<Token>, Vec<Error>> {
        while self.scan_next().is_some() {}

        debug!("lexed {} tokens ({} errors)", self.tokens.len(), self.errors.len());

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }
}

/// Parses a non-empty run of hex digits. Signs are not accepted.
fn parse_hex_digits(hex: &str) -> Option<u32> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod test {
    use quill_middle::interner::{sym, StringInterner};
    use quill_middle::lexer::token::TokenType;
    use quill_middle::parser::error::Error;

    use super::Lexer;

    fn types(source: &str) -> Vec<TokenType> {
        let mut interner = StringInterner::new();
        Lexer::new(&mut interner, source)
            .scan_all()
            .unwrap()
            .into_iter()
            .map(|t| t.ty)
            .collect()
    }

    #[test]
    fn new_target_tokens() {
        assert_eq!(
            types("new.target"),
            [
                TokenType::New,
                TokenType::Dot,
                TokenType::Identifier(sym::target)
            ]
        );
    }

    #[test]
    fn operators_prefer_longest_match() {
        let operators: Vec<_> = types("a >>>= b === c => d ?? e ??= f ... g")
            .into_iter()
            .filter(|ty| ty.as_identifier().is_none())
            .collect();

        assert_eq!(
            operators,
            [
                TokenType::UnsignedRightShiftAssignment,
                TokenType::StrictEquality,
                TokenType::FatArrow,
                TokenType::NullishCoalescing,
                TokenType::LogicalNullishAssignment,
                TokenType::Spread,
            ]
        );
    }

    #[test]
    fn number_literals() {
        assert_eq!(
            types("1 0x1F 0b101 0o17 1.5e3 .25 1_000"),
            [1.0, 31.0, 5.0, 15.0, 1500.0, 0.25, 1000.0].map(TokenType::Number)
        );
    }

    #[test]
    fn string_escapes() {
        let mut interner = StringInterner::new();
        let tokens = Lexer::new(&mut interner, r#"'a\nb' "\x41B\u{43}" 'it\'s'"#)
            .scan_all()
            .unwrap();
        let strings: Vec<_> = tokens
            .iter()
            .map(|t| match t.ty {
                TokenType::String(s) => interner.resolve(s).to_owned(),
                _ => panic!("expected a string"),
            })
            .collect();
        assert_eq!(strings, ["a\nb", "ABC", "it's"]);

        let tokens = types(r"'\u{10FFFF}' '\u00e9'");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            types("/* license */ this // trailing\n;"),
            [TokenType::This, TokenType::Semicolon]
        );
    }

    #[test]
    fn errors_are_collected() {
        let mut interner = StringInterner::new();
        let errs = Lexer::new(&mut interner, "'open\n#").scan_all().unwrap_err();
        assert!(matches!(errs[0], Error::UnterminatedString(_)));
        assert!(matches!(errs[1], Error::UnknownCharacter(_, '#')));
    }

    #[test]
    fn unknown_character_is_decoded() {
        let mut interner = StringInterner::new();
        let errs = Lexer::new(&mut interner, "var é").scan_all().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], Error::UnknownCharacter(_, 'é')));
        assert_eq!(errs[0].to_string(), "unknown character: é");
    }

    #[test]
    fn invalid_escapes() {
        for source in [r"'\u+041'", r"'\u{+41}'", r"'\x+1'", r"'\u{110000}'", r"'\u{}'", r"'\xg0'", r"'\u12'"] {
            let mut interner = StringInterner::new();
            let errs = Lexer::new(&mut interner, source).scan_all().unwrap_err();
            assert!(matches!(errs[0], Error::InvalidEscapeSequence(_)), "{source}: {errs:?}");
        }
    }
}
