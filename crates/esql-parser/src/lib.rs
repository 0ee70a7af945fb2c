//! # esql-parser
//!
//! A tokenizer and parser for ES|QL-style pipe queries.
//!
//! This crate provides:
//! - A mode-sensitive lexer that re-lexes lookahead at clause boundaries
//! - A recursive descent parser producing a typed syntax tree with spans
//! - Canonical rendering of every node through `Display`
//!
//! ## Parsing a Query
//!
//! ```rust
//! use esql_parser::ast::Command;
//!
//! let query = esql_parser::parse("FROM logs-* | WHERE status >= 500 | LIMIT 10").unwrap();
//! assert_eq!(query.commands.len(), 3);
//! assert!(matches!(query.commands[2], Command::Limit(_)));
//! assert_eq!(
//!     query.to_string(),
//!     "FROM logs-* | WHERE status >= 500 | LIMIT 10"
//! );
//! ```
//!
//! ## Errors
//!
//! The first error ends the parse. It carries the offending token and every
//! token kind that would have been accepted in its place:
//!
//! ```rust
//! use esql_parser::TokenKind;
//!
//! let err = esql_parser::parse("FROM logs | LIMIT").unwrap_err();
//! assert!(err.expects(TokenKind::Integer));
//! ```

pub mod ast;
pub mod config;
pub mod lexer;
pub mod parser;

pub use ast::{Command, Expr, Query, WhereExpr};
pub use config::{CallForm, ConfigError, FunctionTable, ParserConfig};
pub use lexer::{LexMode, Lexer, Span, Token, TokenKind};
pub use parser::{ErrorKind, ParseError, Parser};

use tracing::debug;

/// Parses `source` as a complete query with the default configuration.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered.
pub fn parse(source: &str) -> Result<Query, ParseError> {
    parse_with_config(source, &ParserConfig::default())
}

/// Parses `source` as a complete query.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered.
pub fn parse_with_config(source: &str, config: &ParserConfig) -> Result<Query, ParseError> {
    let _span = tracing::debug_span!("parse", len = source.len()).entered();
    let result = Parser::with_config(source, config).parse_query();
    match &result {
        Ok(query) => debug!(commands = query.commands.len(), "parsed query"),
        Err(err) => debug!(error = %err, kind = ?err.kind, "rejected query"),
    }
    result
}
