//! Token types for the query lexer.

use serde::Serialize;

use super::{LexMode, Span};

/// The kind of a token.
///
/// Kinds carry no payload. The matched text lives on [`Token`], which keeps
/// the kind cheap to copy and usable in the expected sets of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TokenKind {
    // Source commands
    Explain,
    From,
    Row,
    Show,

    // Processing commands
    Eval,
    Limit,
    Keep,
    Project,
    Drop,
    Rename,
    Dissect,
    Grok,
    Sort,
    Stats,
    /// `INLINESTATS`, which adds aggregates to every row instead of grouping.
    Inlinestats,
    Where,
    MvExpand,
    Enrich,

    // Punctuation
    /// `|`
    Pipe,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `=`
    Assign,
    /// `?`, a positional input parameter.
    Param,

    // Operators
    And,
    Or,
    Not,
    Like,
    Rlike,
    In,
    Is,
    Null,
    /// One of `==`, `!=`, `<`, `<=`, `>`, `>=`.
    ComparisonOp,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,

    // Literals
    /// Double-quoted or triple-quoted string.
    String,
    Integer,
    Decimal,
    /// `true` or `false`.
    Boolean,
    /// A time unit such as `day` or `hours`.
    DateUnit,

    // Identifiers, one pair per mode that has them
    Identifier,
    /// Backtick-quoted identifier.
    QuotedIdentifier,
    SourceIdentifier,
    SourceQuotedIdentifier,
    EnrichIdentifier,
    EnrichQuotedIdentifier,

    // Clause keywords
    By,
    On,
    With,
    As,
    Metadata,
    /// `asc` or `desc`.
    OrderDirection,
    Nulls,
    /// `first` or `last`.
    NullsDirection,
    Info,
    Functions,

    /// Input the active mode cannot tokenize.
    Unknown,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns a human-readable description used in diagnostics.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Explain => "EXPLAIN",
            Self::From => "FROM",
            Self::Row => "ROW",
            Self::Show => "SHOW",
            Self::Eval => "EVAL",
            Self::Limit => "LIMIT",
            Self::Keep => "KEEP",
            Self::Project => "PROJECT",
            Self::Drop => "DROP",
            Self::Rename => "RENAME",
            Self::Dissect => "DISSECT",
            Self::Grok => "GROK",
            Self::Sort => "SORT",
            Self::Stats => "STATS",
            Self::Inlinestats => "INLINESTATS",
            Self::Where => "WHERE",
            Self::MvExpand => "MV_EXPAND",
            Self::Enrich => "ENRICH",
            Self::Pipe => "'|'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::LeftBracket => "'['",
            Self::RightBracket => "']'",
            Self::Assign => "'='",
            Self::Param => "'?'",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Like => "LIKE",
            Self::Rlike => "RLIKE",
            Self::In => "IN",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::ComparisonOp => "comparison operator",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::DateUnit => "time unit",
            Self::Identifier => "identifier",
            Self::QuotedIdentifier => "quoted identifier",
            Self::SourceIdentifier => "source identifier",
            Self::SourceQuotedIdentifier => "quoted source identifier",
            Self::EnrichIdentifier => "enrich identifier",
            Self::EnrichQuotedIdentifier => "quoted enrich identifier",
            Self::By => "BY",
            Self::On => "ON",
            Self::With => "WITH",
            Self::As => "AS",
            Self::Metadata => "METADATA",
            Self::OrderDirection => "ASC or DESC",
            Self::Nulls => "NULLS",
            Self::NullsDirection => "FIRST or LAST",
            Self::Info => "INFO",
            Self::Functions => "FUNCTIONS",
            Self::Unknown => "unrecognized input",
            Self::Eof => "end of input",
        }
    }

    /// Returns true for the keywords that start a source command.
    #[must_use]
    pub const fn is_source_command(&self) -> bool {
        matches!(self, Self::Explain | Self::From | Self::Row | Self::Show)
    }

    /// Returns true for the keywords that start a processing command.
    #[must_use]
    pub const fn is_processing_command(&self) -> bool {
        matches!(
            self,
            Self::Eval
                | Self::Limit
                | Self::Keep
                | Self::Project
                | Self::Drop
                | Self::Rename
                | Self::Dissect
                | Self::Grok
                | Self::Sort
                | Self::Stats
                | Self::Inlinestats
                | Self::Where
                | Self::MvExpand
                | Self::Enrich
        )
    }

    /// Returns true for the token kinds that can name a column in expressions.
    #[must_use]
    pub const fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier | Self::QuotedIdentifier) || self.is_soft_keyword()
    }

    /// Returns true for keywords that only have their meaning in one place
    /// and are plain names everywhere else.
    ///
    /// A time unit is a keyword right after a number, and `INFO` and
    /// `FUNCTIONS` are keywords right after `SHOW`.
    #[must_use]
    pub const fn is_soft_keyword(&self) -> bool {
        matches!(self, Self::DateUnit | Self::Info | Self::Functions)
    }
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.description())
    }
}

const DATE_UNITS: &[&str] = &[
    "millisecond",
    "milliseconds",
    "second",
    "seconds",
    "minute",
    "minutes",
    "hour",
    "hours",
    "day",
    "days",
    "week",
    "weeks",
    "month",
    "months",
    "year",
    "years",
];

/// Looks up a bare word in the keyword table of `mode`.
///
/// Matching is case-insensitive. Returns `None` when the word is an
/// identifier in that mode.
#[must_use]
pub fn lookup_keyword(mode: LexMode, word: &str) -> Option<TokenKind> {
    let lower = word.to_ascii_lowercase();
    match mode {
        LexMode::Default => {
            let kind = match lower.as_str() {
                "explain" => TokenKind::Explain,
                "from" => TokenKind::From,
                "row" => TokenKind::Row,
                "show" => TokenKind::Show,
                "eval" => TokenKind::Eval,
                "limit" => TokenKind::Limit,
                "keep" => TokenKind::Keep,
                "project" => TokenKind::Project,
                "drop" => TokenKind::Drop,
                "rename" => TokenKind::Rename,
                "dissect" => TokenKind::Dissect,
                "grok" => TokenKind::Grok,
                "sort" => TokenKind::Sort,
                "stats" => TokenKind::Stats,
                "inlinestats" => TokenKind::Inlinestats,
                "where" => TokenKind::Where,
                "mv_expand" => TokenKind::MvExpand,
                "enrich" => TokenKind::Enrich,
                "and" => TokenKind::And,
                "or" => TokenKind::Or,
                "not" => TokenKind::Not,
                "like" => TokenKind::Like,
                "rlike" => TokenKind::Rlike,
                "in" => TokenKind::In,
                "is" => TokenKind::Is,
                "null" => TokenKind::Null,
                "true" | "false" => TokenKind::Boolean,
                "by" => TokenKind::By,
                "as" => TokenKind::As,
                "asc" | "desc" => TokenKind::OrderDirection,
                "nulls" => TokenKind::Nulls,
                "first" | "last" => TokenKind::NullsDirection,
                "info" => TokenKind::Info,
                "functions" => TokenKind::Functions,
                unit if DATE_UNITS.contains(&unit) => TokenKind::DateUnit,
                _ => return None,
            };
            Some(kind)
        }
        LexMode::Source => (lower == "metadata").then_some(TokenKind::Metadata),
        LexMode::Enrich => match lower.as_str() {
            "on" => Some(TokenKind::On),
            "with" => Some(TokenKind::With),
            _ => None,
        },
        LexMode::Explain => None,
    }
}

/// A token with its kind, raw text and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source slice, including any quotes.
    pub text: String,
    pub span: Span,
    /// 0-based line of the first character.
    pub line: usize,
    /// 0-based column of the first character, in characters.
    pub column: usize,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        span: Span,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            line,
            column,
        }
    }

    /// Returns true if this is an end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns true if the token text equals `word`, ignoring ASCII case.
    #[must_use]
    pub fn text_eq_ignore_case(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }
}
