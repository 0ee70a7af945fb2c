//! Query parser.
//!
//! A hand-written recursive descent parser over the command pipeline, with
//! precedence climbing for boolean and arithmetic expressions.

mod error;
mod expression;
mod parser;
mod pratt;

pub use error::{ErrorKind, ParseError};
pub use parser::Parser;
