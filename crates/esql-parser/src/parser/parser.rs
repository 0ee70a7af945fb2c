//! Query parser implementation.

use std::borrow::Cow;
use std::collections::{BTreeSet, VecDeque};

use super::error::ParseError;
use super::pratt::EXPRESSION_START;
use crate::ast::{
    Command, Constant, DissectCommand, DissectOption, DropCommand, EnrichCommand,
    EnrichWithClause, EvalCommand, ExplainCommand, Field, FromCommand, GrokCommand, Identifier,
    KeepCommand, LimitCommand, MvExpandCommand, Number, QualifiedName, Query, RenameClause,
    RenameCommand, RowCommand, ShowCommand, ShowTarget, SortCommand, StatsCommand, WhereCommand,
};
use crate::config::{ParserConfig, MAX_DEPTH_LIMIT, MAX_OPERATORS_LIMIT};
use crate::lexer::{LexMode, Lexer, Span, Token, TokenKind};

const SOURCE_COMMANDS: &[TokenKind] = &[
    TokenKind::Explain,
    TokenKind::From,
    TokenKind::Row,
    TokenKind::Show,
];

const PROCESSING_COMMANDS: &[TokenKind] = &[
    TokenKind::Dissect,
    TokenKind::Drop,
    TokenKind::Enrich,
    TokenKind::Eval,
    TokenKind::Grok,
    TokenKind::Keep,
    TokenKind::Limit,
    TokenKind::MvExpand,
    TokenKind::Project,
    TokenKind::Rename,
    TokenKind::Sort,
    TokenKind::Stats,
    TokenKind::Inlinestats,
    TokenKind::Where,
];

/// Query parser.
///
/// Recursive descent over commands, with precedence climbing for
/// expressions. The parser owns the lexer and switches its mode at clause
/// boundaries, re-lexing any lookahead taken under the previous mode.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub(super) config: Cow<'a, ParserConfig>,
    pub(super) current: Token,
    previous: Token,
    /// Tokens lexed ahead of `current`, all in the active mode.
    lookahead: VecDeque<Token>,
    /// Kinds tested at the current position since the last advance.
    expected: BTreeSet<TokenKind>,
    depth: usize,
    /// `config.max_depth`, clamped to what the stack can take.
    max_depth: usize,
    /// Binary operators folded so far in this parse.
    operators: usize,
    max_operators: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser with the default configuration.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self::build(Lexer::new(input), Cow::Owned(ParserConfig::default()))
    }

    /// Creates a new parser with the given configuration.
    #[must_use]
    pub fn with_config(input: &'a str, config: &'a ParserConfig) -> Self {
        Self::build(Lexer::new(input), Cow::Borrowed(config))
    }

    /// Creates a parser that only sees `span` of `input`.
    ///
    /// Positions in the result stay relative to the whole input, so a node
    /// re-parsed from its own span compares equal to the original node.
    #[must_use]
    pub fn with_range(input: &'a str, span: Span, config: &'a ParserConfig) -> Self {
        Self::build(Lexer::with_bounds(input, span), Cow::Borrowed(config))
    }

    fn build(mut lexer: Lexer<'a>, config: Cow<'a, ParserConfig>) -> Self {
        // Unvalidated configs still get a bounded guard
        let max_depth = config.max_depth.clamp(1, MAX_DEPTH_LIMIT);
        let max_operators = config.max_operators.clamp(1, MAX_OPERATORS_LIMIT);
        let current = lexer.next_token();
        let previous = Token::new(
            TokenKind::Eof,
            "",
            Span::new(current.span.start, current.span.start),
            current.line,
            current.column,
        );
        Self {
            lexer,
            config,
            current,
            previous,
            lookahead: VecDeque::new(),
            expected: BTreeSet::new(),
            depth: 0,
            max_depth,
            operators: 0,
            max_operators,
        }
    }

    /// Parses a complete query followed by end of input.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` at the first token that fits no alternative.
    pub fn parse_query(&mut self) -> Result<Query, ParseError> {
        let query = self.parse_query_body()?;
        self.expect_eof()?;
        Ok(query)
    }

    /// Parses exactly one source or processing command.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single command.
    pub fn parse_command(&mut self) -> Result<Command, ParseError> {
        let command = if self.current.kind.is_source_command() {
            self.parse_source_command()?
        } else {
            self.note_expected(SOURCE_COMMANDS);
            self.parse_processing_command()?
        };
        self.expect_eof()?;
        Ok(command)
    }

    /// Parses exactly one field, as in ROW, EVAL and STATS.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single field.
    pub fn parse_field(&mut self) -> Result<Field, ParseError> {
        let field = self.parse_field_inner()?;
        self.expect_eof()?;
        Ok(field)
    }

    /// Parses exactly one qualified name.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single dotted name.
    pub fn parse_qualified_name(&mut self) -> Result<QualifiedName, ParseError> {
        let name = self.parse_qualified_name_inner()?;
        self.expect_eof()?;
        Ok(name)
    }

    /// Parses exactly one name pattern, as in KEEP, DROP and RENAME.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single dotted pattern.
    pub fn parse_name_pattern(&mut self) -> Result<QualifiedName, ParseError> {
        let name = self.parse_name_pattern_inner()?;
        self.expect_eof()?;
        Ok(name)
    }

    // --- Query structure ---

    fn parse_query_body(&mut self) -> Result<Query, ParseError> {
        let start = self.current.span.start;
        let mut commands = vec![self.parse_source_command()?];
        while self.eat(TokenKind::Pipe) {
            commands.push(self.parse_processing_command()?);
        }
        Ok(Query {
            commands,
            span: self.span_from(start),
        })
    }

    fn parse_source_command(&mut self) -> Result<Command, ParseError> {
        match self.current.kind {
            TokenKind::Explain => Ok(Command::Explain(self.parse_explain()?)),
            TokenKind::From => Ok(Command::From(self.parse_from()?)),
            TokenKind::Row => Ok(Command::Row(self.parse_row()?)),
            TokenKind::Show => Ok(Command::Show(self.parse_show()?)),
            _ => {
                self.note_expected(SOURCE_COMMANDS);
                Err(self.error())
            }
        }
    }

    fn parse_processing_command(&mut self) -> Result<Command, ParseError> {
        let start = self.current.span.start;
        let command = match self.current.kind {
            TokenKind::Eval => {
                self.advance();
                Command::Eval(EvalCommand {
                    fields: self.parse_fields()?,
                    span: self.span_from(start),
                })
            }
            TokenKind::Limit => Command::Limit(self.parse_limit()?),
            TokenKind::Keep | TokenKind::Project => {
                self.advance();
                Command::Keep(KeepCommand {
                    names: self.parse_comma_list(Self::parse_name_pattern_inner)?,
                    span: self.span_from(start),
                })
            }
            TokenKind::Drop => {
                self.advance();
                Command::Drop(DropCommand {
                    names: self.parse_comma_list(Self::parse_name_pattern_inner)?,
                    span: self.span_from(start),
                })
            }
            TokenKind::MvExpand => {
                self.advance();
                Command::MvExpand(MvExpandCommand {
                    names: self.parse_qualified_names()?,
                    span: self.span_from(start),
                })
            }
            TokenKind::Rename => Command::Rename(self.parse_rename()?),
            TokenKind::Dissect => Command::Dissect(self.parse_dissect()?),
            TokenKind::Grok => {
                self.advance();
                let targets = self.parse_qualified_names()?;
                let pattern = self.parse_string_literal()?;
                Command::Grok(GrokCommand {
                    targets,
                    pattern,
                    span: self.span_from(start),
                })
            }
            TokenKind::Sort => {
                self.advance();
                let orders = self.parse_comma_list(Self::parse_order_expression_inner)?;
                Command::Sort(SortCommand {
                    orders,
                    span: self.span_from(start),
                })
            }
            TokenKind::Stats => Command::Stats(self.parse_stats()?),
            TokenKind::Inlinestats => Command::InlineStats(self.parse_stats()?),
            TokenKind::Where => {
                self.advance();
                let condition = self.parse_where_expression_inner()?;
                Command::Where(WhereCommand {
                    condition,
                    span: self.span_from(start),
                })
            }
            TokenKind::Enrich => Command::Enrich(self.parse_enrich()?),
            _ => {
                self.note_expected(PROCESSING_COMMANDS);
                return Err(self.error());
            }
        };
        Ok(command)
    }

    // --- Source commands ---

    /// Parses `EXPLAIN [ query ]`.
    fn parse_explain(&mut self) -> Result<ExplainCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        if !self.check(TokenKind::LeftBracket) {
            return Err(self.error());
        }

        self.push_mode(LexMode::Explain);
        // The subquery is lexed like a top-level query
        self.push_mode(LexMode::Default);
        self.advance();

        self.enter()?;
        let query = self.parse_query_body();
        self.leave();
        let query = query?;

        if !self.check(TokenKind::RightBracket) {
            return Err(self.error());
        }
        self.pop_mode();
        self.advance();
        let span = self.span_from(start);
        self.pop_mode();

        Ok(ExplainCommand {
            query: Box::new(query),
            span,
        })
    }

    /// Parses `FROM source, ... [METADATA field, ...]`.
    ///
    /// The metadata clause is also accepted in its older bracketed form,
    /// `[METADATA field, ...]`.
    fn parse_from(&mut self) -> Result<FromCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        self.push_mode(LexMode::Source);

        let sources = self.parse_comma_list(Self::parse_source_identifier)?;
        let metadata = if self.eat(TokenKind::Metadata) {
            self.parse_comma_list(Self::parse_source_identifier)?
        } else if self.eat(TokenKind::LeftBracket) {
            self.expect(TokenKind::Metadata)?;
            let fields = self.parse_comma_list(Self::parse_source_identifier)?;
            self.expect(TokenKind::RightBracket)?;
            fields
        } else {
            vec![]
        };

        let span = self.span_from(start);
        self.pop_mode();
        Ok(FromCommand {
            sources,
            metadata,
            span,
        })
    }

    fn parse_row(&mut self) -> Result<RowCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        let fields = self.parse_fields()?;
        Ok(RowCommand {
            fields,
            span: self.span_from(start),
        })
    }

    fn parse_show(&mut self) -> Result<ShowCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        let target = if self.eat(TokenKind::Info) {
            ShowTarget::Info
        } else if self.eat(TokenKind::Functions) {
            ShowTarget::Functions
        } else {
            return Err(self.error());
        };
        Ok(ShowCommand {
            target,
            span: self.span_from(start),
        })
    }

    // --- Processing commands ---

    fn parse_limit(&mut self) -> Result<LimitCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        let token = self.expect(TokenKind::Integer)?;
        let count = token.text.parse::<u64>().map_err(|_| {
            ParseError::invalid(&token, format!("LIMIT value `{}` is out of range", token.text))
        })?;
        Ok(LimitCommand {
            count,
            span: self.span_from(start),
        })
    }

    fn parse_rename(&mut self) -> Result<RenameCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        let clauses = self.parse_comma_list(|p| {
            let from = p.parse_name_pattern_inner()?;
            p.expect(TokenKind::As)?;
            let to = p.parse_name_pattern_inner()?;
            Ok(RenameClause { from, to })
        })?;
        Ok(RenameCommand {
            clauses,
            span: self.span_from(start),
        })
    }

    /// Parses `DISSECT names "pattern" [key = constant, ...]`.
    fn parse_dissect(&mut self) -> Result<DissectCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        let targets = self.parse_qualified_names()?;
        let pattern = self.parse_string_literal()?;
        let options = if self.at_name() {
            self.parse_comma_list(|p| {
                let key = p.parse_identifier()?;
                p.expect(TokenKind::Assign)?;
                let value = p.parse_constant()?;
                Ok(DissectOption { key, value })
            })?
        } else {
            vec![]
        };
        Ok(DissectCommand {
            targets,
            pattern,
            options,
            span: self.span_from(start),
        })
    }

    /// Parses `STATS [fields] [BY names]` or the same after `INLINESTATS`.
    /// Both clauses are optional.
    fn parse_stats(&mut self) -> Result<StatsCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        let fields = if self.at_name() || self.check_any(EXPRESSION_START) {
            self.parse_fields()?
        } else {
            vec![]
        };
        let group_by = if self.eat(TokenKind::By) {
            self.parse_qualified_names()?
        } else {
            vec![]
        };
        Ok(StatsCommand {
            fields,
            group_by,
            span: self.span_from(start),
        })
    }

    /// Parses `ENRICH policy [ON field] [WITH [new =] field, ...]`.
    fn parse_enrich(&mut self) -> Result<EnrichCommand, ParseError> {
        let start = self.current.span.start;
        self.advance();
        self.push_mode(LexMode::Enrich);

        let policy = self.parse_enrich_identifier()?;
        let match_field = if self.eat(TokenKind::On) {
            Some(self.parse_enrich_identifier()?)
        } else {
            None
        };
        let with = if self.eat(TokenKind::With) {
            self.parse_comma_list(|p| {
                let first = p.parse_enrich_identifier()?;
                if p.eat(TokenKind::Assign) {
                    Ok(EnrichWithClause {
                        new_name: Some(first),
                        source_field: p.parse_enrich_identifier()?,
                    })
                } else {
                    Ok(EnrichWithClause {
                        new_name: None,
                        source_field: first,
                    })
                }
            })?
        } else {
            vec![]
        };

        let span = self.span_from(start);
        self.pop_mode();
        Ok(EnrichCommand {
            policy,
            match_field,
            with,
            span,
        })
    }

    // --- Fields and names ---

    fn parse_fields(&mut self) -> Result<Vec<Field>, ParseError> {
        self.parse_comma_list(Self::parse_field_inner)
    }

    /// Parses `[name =] expression`.
    pub(super) fn parse_field_inner(&mut self) -> Result<Field, ParseError> {
        let start = self.current.span.start;
        let name = if self.at_field_name() {
            let name = self.parse_field_name()?;
            self.expect(TokenKind::Assign)?;
            Some(name)
        } else {
            None
        };
        let value = self.parse_expression_inner()?;
        Ok(Field {
            name,
            value,
            span: self.span_from(start),
        })
    }

    /// Checks if the tokens ahead spell `name(.name)* =`.
    fn at_field_name(&mut self) -> bool {
        if !self.current.kind.is_identifier() {
            return false;
        }
        let mut n = 1;
        while self.peek_kind(n) == TokenKind::Dot && self.peek_kind(n + 1).is_identifier() {
            n += 2;
        }
        self.peek_kind(n) == TokenKind::Assign
    }

    /// A dotted name without `*` parts.
    fn parse_field_name(&mut self) -> Result<QualifiedName, ParseError> {
        self.parse_dotted(Self::parse_identifier)
    }

    fn parse_qualified_names(&mut self) -> Result<Vec<QualifiedName>, ParseError> {
        self.parse_comma_list(Self::parse_qualified_name_inner)
    }

    pub(super) fn parse_qualified_name_inner(&mut self) -> Result<QualifiedName, ParseError> {
        self.parse_dotted(Self::parse_name_part)
    }

    fn parse_name_pattern_inner(&mut self) -> Result<QualifiedName, ParseError> {
        self.parse_dotted(Self::parse_pattern_part)
    }

    /// Parses `part ('.' part)*`.
    fn parse_dotted(
        &mut self,
        mut part: impl FnMut(&mut Self) -> Result<Identifier, ParseError>,
    ) -> Result<QualifiedName, ParseError> {
        let start = self.current.span.start;
        let mut parts = vec![part(self)?];
        while self.eat(TokenKind::Dot) {
            parts.push(part(self)?);
        }
        Ok(QualifiedName {
            parts,
            span: self.span_from(start),
        })
    }

    /// One part of a name pattern, such as `emp_*` or `*name*`.
    ///
    /// Unquoted words and `*` with no space between them form a single part.
    fn parse_pattern_part(&mut self) -> Result<Identifier, ParseError> {
        if self.current.kind == TokenKind::QuotedIdentifier {
            return self.parse_identifier();
        }
        let start = self.current.span.start;
        let mut name = String::new();
        while is_pattern_piece(self.current.kind)
            && (name.is_empty() || self.current.span.start == self.previous.span.end)
        {
            name.push_str(&self.current.text);
            self.advance();
        }
        if name.is_empty() {
            self.note_expected(&[
                TokenKind::Identifier,
                TokenKind::QuotedIdentifier,
                TokenKind::Star,
            ]);
            return Err(self.error());
        }
        Ok(Identifier {
            name,
            quoted: false,
            span: self.span_from(start),
        })
    }

    /// One part of a qualified name, where `*` is allowed.
    fn parse_name_part(&mut self) -> Result<Identifier, ParseError> {
        if self.eat(TokenKind::Star) {
            return Ok(identifier_from_token(&self.previous));
        }
        self.parse_identifier()
    }

    /// Parses a column name. Soft keywords are accepted as plain names.
    pub(super) fn parse_identifier(&mut self) -> Result<Identifier, ParseError> {
        if self.current.kind.is_identifier() {
            self.advance();
            return Ok(identifier_from_token(&self.previous));
        }
        self.note_expected(&[TokenKind::Identifier, TokenKind::QuotedIdentifier]);
        Err(self.error())
    }

    fn parse_source_identifier(&mut self) -> Result<Identifier, ParseError> {
        self.parse_identifier_of(
            TokenKind::SourceIdentifier,
            TokenKind::SourceQuotedIdentifier,
        )
    }

    fn parse_enrich_identifier(&mut self) -> Result<Identifier, ParseError> {
        self.parse_identifier_of(
            TokenKind::EnrichIdentifier,
            TokenKind::EnrichQuotedIdentifier,
        )
    }

    fn parse_identifier_of(
        &mut self,
        plain: TokenKind,
        quoted: TokenKind,
    ) -> Result<Identifier, ParseError> {
        if self.eat(plain) || self.eat(quoted) {
            Ok(identifier_from_token(&self.previous))
        } else {
            Err(self.error())
        }
    }

    // --- Literals ---

    /// Parses a constant: null, number, boolean, string, homogeneous array or
    /// `?` parameter.
    pub(super) fn parse_constant(&mut self) -> Result<Constant, ParseError> {
        match self.current.kind {
            TokenKind::Null => {
                self.advance();
                Ok(Constant::Null)
            }
            TokenKind::Param => {
                self.advance();
                Ok(Constant::Param)
            }
            TokenKind::Integer | TokenKind::Decimal | TokenKind::Plus | TokenKind::Minus => {
                Ok(self.parse_signed_number()?.into())
            }
            TokenKind::Boolean => Ok(Constant::Boolean(self.parse_boolean_literal()?)),
            TokenKind::String => Ok(Constant::String(self.parse_string_literal()?)),
            TokenKind::LeftBracket => self.parse_array(),
            _ => {
                self.note_expected(&[
                    TokenKind::Null,
                    TokenKind::Param,
                    TokenKind::Plus,
                    TokenKind::Minus,
                    TokenKind::Integer,
                    TokenKind::Decimal,
                    TokenKind::Boolean,
                    TokenKind::String,
                    TokenKind::LeftBracket,
                ]);
                Err(self.error())
            }
        }
    }

    /// Parses `[item, ...]` where every item has the type of the first.
    fn parse_array(&mut self) -> Result<Constant, ParseError> {
        self.advance();
        let constant = match self.current.kind {
            TokenKind::Integer | TokenKind::Decimal | TokenKind::Plus | TokenKind::Minus => {
                Constant::NumericArray(self.parse_comma_list(Self::parse_signed_number)?)
            }
            TokenKind::Boolean => {
                Constant::BooleanArray(self.parse_comma_list(Self::parse_boolean_literal)?)
            }
            TokenKind::String => {
                Constant::StringArray(self.parse_comma_list(Self::parse_string_literal)?)
            }
            _ => {
                self.note_expected(&[
                    TokenKind::Plus,
                    TokenKind::Minus,
                    TokenKind::Integer,
                    TokenKind::Decimal,
                    TokenKind::Boolean,
                    TokenKind::String,
                ]);
                return Err(self.error());
            }
        };
        self.expect(TokenKind::RightBracket)?;
        Ok(constant)
    }

    pub(super) fn parse_number(&mut self) -> Result<Number, ParseError> {
        if self.eat(TokenKind::Integer) {
            let token = &self.previous;
            return token.text.parse::<i64>().map(Number::Integer).map_err(|_| {
                ParseError::invalid(
                    token,
                    format!("integer literal `{}` is out of range", token.text),
                )
            });
        }
        if self.eat(TokenKind::Decimal) {
            let token = &self.previous;
            return match token.text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Number::Decimal(value)),
                _ => Err(ParseError::invalid(
                    token,
                    format!("decimal literal `{}` is out of range", token.text),
                )),
            };
        }
        Err(self.error())
    }

    /// Parses a number with an optional sign.
    fn parse_signed_number(&mut self) -> Result<Number, ParseError> {
        if !self.eat(TokenKind::Minus) {
            self.eat(TokenKind::Plus);
            return self.parse_number();
        }
        // Negated before parsing so `-9223372036854775808` fits
        if self.eat(TokenKind::Integer) {
            let token = &self.previous;
            return format!("-{}", token.text)
                .parse::<i64>()
                .map(Number::Integer)
                .map_err(|_| {
                    ParseError::invalid(
                        token,
                        format!("integer literal `-{}` is out of range", token.text),
                    )
                });
        }
        match self.parse_number()? {
            Number::Decimal(value) => Ok(Number::Decimal(-value)),
            integer @ Number::Integer(_) => Ok(integer),
        }
    }

    fn parse_boolean_literal(&mut self) -> Result<bool, ParseError> {
        self.expect(TokenKind::Boolean)
            .map(|token| token.text.eq_ignore_ascii_case("true"))
    }

    pub(super) fn parse_string_literal(&mut self) -> Result<String, ParseError> {
        self.expect(TokenKind::String)
            .map(|token| unquote_string(&token.text))
    }

    // --- Helper methods ---

    /// Parses `item (',' item)*`.
    pub(super) fn parse_comma_list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = vec![item(self)?];
        while self.eat(TokenKind::Comma) {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// Advances to the next token.
    pub(super) fn advance(&mut self) {
        let next = self
            .lookahead
            .pop_front()
            .unwrap_or_else(|| self.lexer.next_token());
        self.previous = std::mem::replace(&mut self.current, next);
        self.expected.clear();
    }

    /// Returns the token `n` positions ahead, where 0 is the current token.
    pub(super) fn peek_token(&mut self, n: usize) -> &Token {
        if n == 0 {
            return &self.current;
        }
        while self.lookahead.len() < n {
            let token = self.lexer.next_token();
            self.lookahead.push_back(token);
        }
        &self.lookahead[n - 1]
    }

    pub(super) fn peek_kind(&mut self, n: usize) -> TokenKind {
        self.peek_token(n).kind
    }

    /// Checks if the current token has the given kind, recording it as expected.
    pub(super) fn check(&mut self, kind: TokenKind) -> bool {
        if self.current.kind == kind {
            true
        } else {
            self.expected.insert(kind);
            false
        }
    }

    pub(super) fn check_any(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.contains(&self.current.kind) {
            true
        } else {
            self.note_expected(kinds);
            false
        }
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to be the given kind and returns it.
    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.eat(kind) {
            Ok(self.previous.clone())
        } else {
            Err(self.error())
        }
    }

    pub(super) fn expect_eof(&mut self) -> Result<(), ParseError> {
        if self.check(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Checks if the current token can be a column name.
    pub(super) fn at_name(&mut self) -> bool {
        if self.current.kind.is_identifier() {
            true
        } else {
            self.note_expected(&[TokenKind::Identifier, TokenKind::QuotedIdentifier]);
            false
        }
    }

    pub(super) fn note_expected(&mut self, kinds: &[TokenKind]) {
        self.expected.extend(kinds.iter().copied());
    }

    /// Builds an error at the current token from everything tested here.
    pub(super) fn error(&mut self) -> ParseError {
        ParseError::unexpected(&self.current, std::mem::take(&mut self.expected))
    }

    /// Span from `start` to the end of the last consumed token.
    pub(super) const fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.previous.span.end)
    }

    /// Enters one nesting level.
    pub(super) fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::depth_exceeded(&self.current, self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    /// Counts the binary operator at the current token.
    pub(super) fn charge_operator(&mut self) -> Result<(), ParseError> {
        if self.operators >= self.max_operators {
            return Err(ParseError::operators_exceeded(
                &self.current,
                self.max_operators,
            ));
        }
        self.operators += 1;
        Ok(())
    }

    pub(super) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Switches the lexer into `mode` and re-lexes the current token.
    fn push_mode(&mut self, mode: LexMode) {
        self.lexer.push_mode(mode);
        self.relex_current();
    }

    /// Leaves the active lexer mode and re-lexes the current token.
    fn pop_mode(&mut self) {
        self.lexer.pop_mode();
        self.relex_current();
    }

    fn relex_current(&mut self) {
        self.lookahead.clear();
        self.lexer.rewind(&self.current);
        self.current = self.lexer.next_token();
    }
}

const fn is_pattern_piece(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Star)
        || (kind.is_identifier() && !matches!(kind, TokenKind::QuotedIdentifier))
}

/// Builds an identifier from an identifier-like token, removing backticks.
pub(super) fn identifier_from_token(token: &Token) -> Identifier {
    let quoted = matches!(
        token.kind,
        TokenKind::QuotedIdentifier
            | TokenKind::SourceQuotedIdentifier
            | TokenKind::EnrichQuotedIdentifier
    );
    let name = if quoted {
        unquote_identifier(&token.text)
    } else {
        token.text.clone()
    };
    Identifier {
        name,
        quoted,
        span: token.span,
    }
}

fn unquote_identifier(text: &str) -> String {
    text.strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text)
        .replace("``", "`")
}

/// Removes quotes from a string token and resolves escapes.
///
/// The lexer only emits `String` tokens whose escapes are valid.
fn unquote_string(text: &str) -> String {
    if let Some(raw) = text
        .strip_prefix("\"\"\"")
        .and_then(|t| t.strip_suffix("\"\"\""))
    {
        return raw.to_string();
    }
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => value.push('\t'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some(other) => value.push(other),
            None => {}
        }
    }
    value
}
