//! Parser error types.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;

use crate::lexer::{Span, Token, TokenKind};

/// The class of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The failing token is input the lexer could not recognize.
    Lex,
    /// The token sequence matches no alternative at this position.
    Syntax,
    /// Nesting went past the configured maximum depth.
    DepthLimitExceeded,
}

/// A parse error. The first error ends the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    /// The error message.
    pub message: String,
    /// The location of the offending token.
    pub span: Span,
    /// 0-based line of the offending token.
    pub line: usize,
    /// 0-based column of the offending token.
    pub column: usize,
    /// The kind of the offending token.
    pub found: TokenKind,
    /// The raw text of the offending token.
    pub found_text: String,
    /// Every token kind that would have been accepted here.
    pub expected: BTreeSet<TokenKind>,
}

impl ParseError {
    /// Creates an "unexpected token" error.
    ///
    /// An `Unknown` token is reported as [`ErrorKind::Lex`].
    #[must_use]
    pub fn unexpected(token: &Token, expected: BTreeSet<TokenKind>) -> Self {
        let kind = if token.kind == TokenKind::Unknown {
            ErrorKind::Lex
        } else {
            ErrorKind::Syntax
        };
        let mut message = match token.kind {
            TokenKind::Unknown => format!("unrecognized input `{}`", token.text),
            TokenKind::Eof => String::from("unexpected end of input"),
            found => format!("unexpected {found} `{}`", token.text),
        };
        if !expected.is_empty() {
            message.push_str(", expected ");
            let count = expected.len();
            for (i, kind) in expected.iter().enumerate() {
                if i > 0 {
                    message.push_str(if i + 1 == count { " or " } else { ", " });
                }
                let _ = write!(message, "{kind}");
            }
        }
        Self::at(token, kind, message, expected)
    }

    /// Creates a syntax error with a custom message.
    #[must_use]
    pub fn invalid(token: &Token, message: impl Into<String>) -> Self {
        Self::at(token, ErrorKind::Syntax, message.into(), BTreeSet::new())
    }

    /// Creates a depth-limit error.
    #[must_use]
    pub fn depth_exceeded(token: &Token, limit: usize) -> Self {
        Self::at(
            token,
            ErrorKind::DepthLimitExceeded,
            format!("maximum nesting depth of {limit} exceeded"),
            BTreeSet::new(),
        )
    }

    /// Creates an error for a query with too many binary operators.
    ///
    /// Operator chains deepen the tree like nesting does, so this shares
    /// [`ErrorKind::DepthLimitExceeded`].
    #[must_use]
    pub fn operators_exceeded(token: &Token, limit: usize) -> Self {
        Self::at(
            token,
            ErrorKind::DepthLimitExceeded,
            format!("maximum of {limit} binary operators exceeded"),
            BTreeSet::new(),
        )
    }

    fn at(token: &Token, kind: ErrorKind, message: String, expected: BTreeSet<TokenKind>) -> Self {
        Self {
            kind,
            message,
            span: token.span,
            line: token.line,
            column: token.column,
            found: token.kind,
            found_text: token.text.clone(),
            expected,
        }
    }

    /// Returns true if `kind` would have been accepted at the error position.
    #[must_use]
    pub fn expects(&self, kind: TokenKind) -> bool {
        self.expected.contains(&kind)
    }

    /// Renders the error with the offending source line and a caret marker.
    ///
    /// Line and column are shown 1-based, as editors number them.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let line_text = source.lines().nth(self.line).unwrap_or("");
        let width = source
            .get(self.span.start..self.span.end)
            .map_or(1, |text| text.lines().next().unwrap_or("").chars().count())
            .max(1);
        format!(
            "error: {message}\n --> {line}:{column}\n  |\n  | {line_text}\n  | {pad}{carets}\n",
            message = self.message,
            line = self.line + 1,
            column = self.column + 1,
            pad = " ".repeat(self.column),
            carets = "^".repeat(width),
        )
    }
}
