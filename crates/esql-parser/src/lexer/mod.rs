//! Query lexer.
//!
//! A hand-written, mode-sensitive lexer. The parser drives it one token at a
//! time and switches modes at clause boundaries.

mod mode;
mod span;
mod token;
mod tokenizer;

pub use mode::{LexMode, ModeStack};
pub use span::{Position, Span};
pub use token::{Token, TokenKind, lookup_keyword};
pub use tokenizer::{Lexer, tokenize};
