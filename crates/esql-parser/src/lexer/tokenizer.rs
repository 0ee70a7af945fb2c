//! Mode-sensitive tokenizer implementation.

use tracing::trace;

use super::token::lookup_keyword;
use super::{LexMode, ModeStack, Position, Span, Token, TokenKind};

/// Characters that end an unquoted source identifier.
const SOURCE_DELIMITERS: &[char] = &['=', '`', '|', ',', '[', ']'];

/// A lexer that tokenizes query text on demand.
///
/// Lexing is total: input that cannot start a token in the active mode
/// becomes a [`TokenKind::Unknown`] token instead of an error.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// Lexing stops at this byte offset.
    end: usize,
    /// The current position.
    pos: Position,
    /// The position of the start of the current token.
    start: Position,
    modes: ModeStack,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the whole input, in [`LexMode::Default`].
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            end: input.len(),
            pos: Position::default(),
            start: Position::default(),
            modes: ModeStack::new(),
        }
    }

    /// Creates a lexer restricted to `span` of the input.
    ///
    /// Token spans and positions stay relative to the whole input, so nodes
    /// parsed from a sub-range compare equal to the same nodes parsed in
    /// context.
    #[must_use]
    pub fn with_bounds(input: &'a str, span: Span) -> Self {
        let end = span.end.min(input.len());
        let pos = Position::locate(input, span.start.min(end));
        Self {
            input,
            end,
            pos,
            start: pos,
            modes: ModeStack::new(),
        }
    }

    /// Returns the active mode.
    #[must_use]
    pub fn mode(&self) -> LexMode {
        self.modes.current()
    }

    /// Enters `mode`. Affects tokens lexed from now on.
    pub fn push_mode(&mut self, mode: LexMode) {
        trace!(%mode, depth = self.modes.depth(), "push lexer mode");
        self.modes.push(mode);
    }

    /// Leaves the active mode.
    pub fn pop_mode(&mut self) -> Option<LexMode> {
        let popped = self.modes.pop();
        trace!(mode = ?popped, depth = self.modes.depth(), "pop lexer mode");
        popped
    }

    /// Moves back to the start of `token` so it is lexed again.
    ///
    /// Used after a mode switch, when the lookahead was lexed under the
    /// previous mode.
    pub fn rewind(&mut self, token: &Token) {
        self.pos = Position {
            offset: token.span.start,
            line: token.line,
            column: token.column,
        };
        self.start = self.pos;
    }

    fn rest(&self) -> &'a str {
        self.input.get(self.pos.offset..self.end).unwrap_or("")
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.advance(c);
        Some(c)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            // Line comment
            if self.starts_with("//") {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            // Block comment, unterminated ones run to the end of input
            if self.starts_with("/*") {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    /// Creates a token from the start of the current token to the current position.
    fn make_token(&self, kind: TokenKind) -> Token {
        let span = Span::new(self.start.offset, self.pos.offset);
        let text = self.input.get(span.start..span.end).unwrap_or("");
        Token::new(kind, text, span, self.start.line, self.start.column)
    }

    /// Scans a bare word and classifies it with the keyword table of the active mode.
    fn scan_word(&mut self, accept: impl Fn(char) -> bool, fallback: TokenKind) -> Token {
        while self.peek().is_some_and(&accept) {
            self.advance();
        }
        let word = &self.input[self.start.offset..self.pos.offset];
        let kind = lookup_keyword(self.mode(), word).unwrap_or(fallback);
        self.make_token(kind)
    }

    /// Scans a backtick-quoted identifier. A doubled backtick is an escaped backtick.
    fn scan_quoted_identifier(&mut self, kind: TokenKind) -> Token {
        self.advance(); // opening backtick
        loop {
            match self.advance() {
                Some('`') if self.peek() == Some('`') => {
                    self.advance();
                }
                Some('`') => return self.make_token(kind),
                Some(_) => {}
                None => return self.make_token(TokenKind::Unknown),
            }
        }
    }

    /// Scans an integer or decimal literal.
    fn scan_number(&mut self) -> Token {
        let mut is_decimal = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') {
            is_decimal = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // An exponent needs at least one digit, otherwise `1e` is `1` followed by `e`
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            let mut chars = self.rest().chars().skip(1);
            let has_digits = match chars.next() {
                Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if has_digits {
                is_decimal = true;
                self.advance();
                if self.peek().is_some_and(|c| c == '+' || c == '-') {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        if is_decimal {
            self.make_token(TokenKind::Decimal)
        } else {
            self.make_token(TokenKind::Integer)
        }
    }

    /// Scans a string literal.
    ///
    /// Triple-quoted strings are raw. Regular strings accept the escapes
    /// `\t \n \r \" \\`. An unterminated string, or one with any other
    /// escape, becomes a single `Unknown` token.
    fn scan_string(&mut self) -> Token {
        if self.starts_with("\"\"\"") {
            for _ in 0..3 {
                self.advance();
            }
            while !self.starts_with("\"\"\"") {
                if self.advance().is_none() {
                    return self.make_token(TokenKind::Unknown);
                }
            }
            for _ in 0..3 {
                self.advance();
            }
            return self.make_token(TokenKind::String);
        }

        self.advance(); // opening quote
        let mut valid = true;
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('t' | 'n' | 'r' | '"' | '\\') => {}
                    Some(_) => valid = false,
                    None => return self.make_token(TokenKind::Unknown),
                },
                Some(_) => {}
                None => return self.make_token(TokenKind::Unknown),
            }
        }

        if valid {
            self.make_token(TokenKind::String)
        } else {
            self.make_token(TokenKind::Unknown)
        }
    }

    /// Scans the next token in the active mode.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.peek() else {
            return self.make_token(TokenKind::Eof);
        };

        match self.mode() {
            LexMode::Default => self.next_default(c),
            LexMode::Source => self.next_source(c),
            LexMode::Enrich => self.next_enrich(c),
            LexMode::Explain => self.next_explain(c),
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        self.advance();
        self.make_token(kind)
    }

    fn next_default(&mut self, c: char) -> Token {
        match c {
            '|' => self.single(TokenKind::Pipe),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '%' => self.single(TokenKind::Percent),
            '?' => self.single(TokenKind::Param),
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::ComparisonOp)
                } else {
                    self.make_token(TokenKind::Assign)
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::ComparisonOp)
                } else {
                    self.make_token(TokenKind::Unknown)
                }
            }
            '<' | '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                }
                self.make_token(TokenKind::ComparisonOp)
            }
            '"' => self.scan_string(),
            '`' => self.scan_quoted_identifier(TokenKind::QuotedIdentifier),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() => {
                self.scan_word(is_identifier_char, TokenKind::Identifier)
            }
            // `_` and `@` may only lead an identifier that has more characters
            '_' | '@' if self.peek_next().is_some_and(is_identifier_char) => {
                self.advance();
                self.scan_word(is_identifier_char, TokenKind::Identifier)
            }
            _ => self.single(TokenKind::Unknown),
        }
    }

    fn next_source(&mut self, c: char) -> Token {
        match c {
            '|' => self.single(TokenKind::Pipe),
            ',' => self.single(TokenKind::Comma),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '`' => self.scan_quoted_identifier(TokenKind::SourceQuotedIdentifier),
            '=' => self.single(TokenKind::Unknown),
            _ => {
                loop {
                    match self.peek() {
                        Some(c) if c.is_whitespace() || SOURCE_DELIMITERS.contains(&c) => break,
                        Some('/') if matches!(self.peek_next(), Some('/' | '*')) => break,
                        Some(_) => {
                            self.advance();
                        }
                        None => break,
                    }
                }
                let word = &self.input[self.start.offset..self.pos.offset];
                let kind = lookup_keyword(LexMode::Source, word)
                    .unwrap_or(TokenKind::SourceIdentifier);
                self.make_token(kind)
            }
        }
    }

    fn next_enrich(&mut self, c: char) -> Token {
        match c {
            '|' => self.single(TokenKind::Pipe),
            ',' => self.single(TokenKind::Comma),
            '=' => self.single(TokenKind::Assign),
            '`' => self.scan_quoted_identifier(TokenKind::EnrichQuotedIdentifier),
            c if is_enrich_char(c) => self.scan_word(is_enrich_char, TokenKind::EnrichIdentifier),
            _ => self.single(TokenKind::Unknown),
        }
    }

    fn next_explain(&mut self, c: char) -> Token {
        match c {
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '|' => self.single(TokenKind::Pipe),
            _ => self.single(TokenKind::Unknown),
        }
    }

    /// Tokenizes the rest of the input in the active mode, ending with `Eof`.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

const fn is_enrich_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '*' | ':' | '@' | '-')
}

/// Tokenizes all of `input` in a single fixed `mode`.
#[must_use]
pub fn tokenize(input: &str, mode: LexMode) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    if mode != LexMode::Default {
        lexer.push_mode(mode);
    }
    lexer.tokenize()
}
