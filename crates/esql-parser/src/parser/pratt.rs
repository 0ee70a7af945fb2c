//! Binding powers for precedence climbing.
//!
//! The general and WHERE grammars keep separate boolean tables. Both tiers
//! of either table are left-associative, so the right operand is parsed with
//! a minimum one above the operator's own power.

use crate::ast::{ArithOp, Sign};
use crate::lexer::TokenKind;

/// Infix binding power of a boolean operator in general expressions.
#[must_use]
pub const fn boolean_binding_power(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Or => Some(1),
        TokenKind::And => Some(2),
        _ => None,
    }
}

/// Infix binding power of a boolean operator in WHERE conditions.
#[must_use]
pub const fn where_binding_power(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Or => Some(4),
        TokenKind::And => Some(5),
        _ => None,
    }
}

/// Infix binding power of an arithmetic operator.
#[must_use]
pub const fn arith_binding_power(kind: TokenKind) -> Option<u8> {
    match token_to_arith_op(kind) {
        Some(op) => Some(op.precedence()),
        None => None,
    }
}

/// Converts a token to an arithmetic operator.
#[must_use]
pub const fn token_to_arith_op(kind: TokenKind) -> Option<ArithOp> {
    match kind {
        TokenKind::Plus => Some(ArithOp::Add),
        TokenKind::Minus => Some(ArithOp::Sub),
        TokenKind::Star => Some(ArithOp::Mul),
        TokenKind::Slash => Some(ArithOp::Div),
        TokenKind::Percent => Some(ArithOp::Mod),
        _ => None,
    }
}

/// Converts a token to a sign prefix.
#[must_use]
pub const fn token_to_sign(kind: TokenKind) -> Option<Sign> {
    match kind {
        TokenKind::Minus => Some(Sign::Neg),
        TokenKind::Plus => Some(Sign::Pos),
        _ => None,
    }
}

/// Token kinds that continue an arithmetic expression.
pub const ARITH_OPERATORS: &[TokenKind] = &[
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Star,
    TokenKind::Slash,
    TokenKind::Percent,
];

/// Token kinds that can follow a value inside a WHERE predicate.
pub const PREDICATE_OPERATORS: &[TokenKind] = &[
    TokenKind::In,
    TokenKind::Is,
    TokenKind::Like,
    TokenKind::Rlike,
    TokenKind::Not,
];

/// Token kinds that can start a primary expression.
pub const PRIMARY_START: &[TokenKind] = &[
    TokenKind::Null,
    TokenKind::Param,
    TokenKind::Integer,
    TokenKind::Decimal,
    TokenKind::Boolean,
    TokenKind::String,
    TokenKind::LeftBracket,
    TokenKind::LeftParen,
    TokenKind::Identifier,
    TokenKind::QuotedIdentifier,
    TokenKind::Star,
];

/// Token kinds that can start a general expression.
pub const EXPRESSION_START: &[TokenKind] = &[
    TokenKind::Not,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Null,
    TokenKind::Param,
    TokenKind::Integer,
    TokenKind::Decimal,
    TokenKind::Boolean,
    TokenKind::String,
    TokenKind::LeftBracket,
    TokenKind::LeftParen,
    TokenKind::Identifier,
    TokenKind::QuotedIdentifier,
    TokenKind::Star,
];
