//! Expression AST types.
//!
//! Two expression grammars exist. [`Expr`] is used by ROW, EVAL, STATS and
//! SORT. [`WhereExpr`] is used only by WHERE and adds list membership,
//! null tests, pattern matching and WHERE-only function tests. Keeping them
//! as separate types means an `IN` list can never end up inside EVAL.

use serde::Serialize;

use crate::lexer::Span;

/// A possibly quoted name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    /// The name with quotes and escapes removed.
    pub name: String,
    /// Whether the name was written between backticks.
    pub quoted: bool,
    pub span: Span,
}

impl Identifier {
    /// Creates an unquoted identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            quoted: false,
            span,
        }
    }
}

/// A dotted name such as `host.ip` or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifiedName {
    pub parts: Vec<Identifier>,
    pub span: Span,
}

impl QualifiedName {
    /// Returns the unquoted parts joined with dots.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// A numeric literal.
///
/// Only constant positions such as array items and DISSECT options carry a
/// sign. In expressions a leading `-` is a unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Number {
    Integer(i64),
    Decimal(f64),
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    Null,
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    String(String),
    /// `[1, 2.5]`. Integers and decimals may mix.
    NumericArray(Vec<Number>),
    BooleanArray(Vec<bool>),
    StringArray(Vec<String>),
    /// `?`, bound to a value when the query runs.
    Param,
}

impl From<Number> for Constant {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(n) => Self::Integer(n),
            Number::Decimal(n) => Self::Decimal(n),
        }
    }
}

/// A time span literal such as `1 day` or `2.5 hours`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateLiteral {
    pub quantity: Number,
    /// The unit as written, lowercased.
    pub unit: String,
}

/// A call whose arguments are general expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: Identifier,
    pub args: Vec<Expr>,
}

/// Primary expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Primary {
    Constant(Constant),
    Name(QualifiedName),
    Date(DateLiteral),
    Paren(Box<Expr>),
    Call(FunctionCall),
}

/// An argument of a restricted-argument call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FnArg {
    Name(QualifiedName),
    String(String),
    Number(Number),
}

/// An argument of a math/eval function call.
///
/// The parser stores each argument in its most specific form, so `x` is
/// `Name` and only `x + 1` is `Arith`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MathArg {
    Name(QualifiedName),
    String(String),
    Number(Number),
    Arith(Arith),
    Date(DateLiteral),
    Comparison(Comparison),
}

impl From<Value> for MathArg {
    fn from(value: Value) -> Self {
        match value {
            Value::Comparison(comparison) => Self::Comparison(comparison),
            Value::Arith(Arith::Primary(Primary::Name(name))) => Self::Name(name),
            Value::Arith(Arith::Primary(Primary::Constant(Constant::String(s)))) => Self::String(s),
            Value::Arith(Arith::Primary(Primary::Constant(Constant::Integer(n)))) => {
                Self::Number(Number::Integer(n))
            }
            Value::Arith(Arith::Primary(Primary::Constant(Constant::Decimal(n)))) => {
                Self::Number(Number::Decimal(n))
            }
            Value::Arith(Arith::Primary(Primary::Date(date))) => Self::Date(date),
            Value::Arith(arith) => Self::Arith(arith),
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    /// Returns the source representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }

    /// Returns the precedence tier (higher binds tighter).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div | Self::Mod => 2,
        }
    }
}

/// Unary sign operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    Neg,
    Pos,
}

impl Sign {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Pos => "+",
        }
    }
}

/// An operator expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Arith {
    Binary {
        left: Box<Arith>,
        op: ArithOp,
        right: Box<Arith>,
    },
    Unary {
        op: Sign,
        operand: Box<Arith>,
    },
    /// A call of a restricted-argument function, such as an aggregation.
    MathCall { name: Identifier, args: Vec<FnArg> },
    /// A call of a math/eval function.
    MathEvalCall { name: Identifier, args: Vec<MathArg> },
    Primary(Primary),
}

impl Arith {
    /// Creates a column reference from a dotted name, with empty spans.
    #[must_use]
    pub fn name(dotted: &str) -> Self {
        let parts = dotted
            .split('.')
            .map(|part| Identifier::new(part, Span::default()))
            .collect();
        Self::Primary(Primary::Name(QualifiedName {
            parts,
            span: Span::default(),
        }))
    }

    /// Creates an integer literal.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Primary(Primary::Constant(Constant::Integer(value)))
    }

    /// Creates a string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Primary(Primary::Constant(Constant::String(value.into())))
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: ArithOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Creates a negation.
    #[must_use]
    pub fn neg(self) -> Self {
        Self::Unary {
            op: Sign::Neg,
            operand: Box::new(self),
        }
    }

    /// Returns the referenced name if this is a bare column reference.
    #[must_use]
    pub const fn as_name(&self) -> Option<&QualifiedName> {
        match self {
            Self::Primary(Primary::Name(name)) => Some(name),
            _ => None,
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOp {
    /// Returns the source representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }

    /// Parses an operator from its source text.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::NotEq),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::LtEq),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::GtEq),
            _ => None,
        }
    }
}

/// A single, non-chaining comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub op: ComparisonOp,
    pub left: Box<Arith>,
    pub right: Box<Arith>,
}

/// A comparison or an operator expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Comparison(Comparison),
    Arith(Arith),
}

impl Value {
    /// Creates a comparison value.
    #[must_use]
    pub fn compare(op: ComparisonOp, left: Arith, right: Arith) -> Self {
        Self::Comparison(Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

impl From<Arith> for Value {
    fn from(arith: Arith) -> Self {
        Self::Arith(arith)
    }
}

/// A general boolean expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Value(Value),
}

impl Expr {
    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        Self::Or(Box::new(self), Box::new(right))
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        Self::And(Box::new(self), Box::new(right))
    }

    /// Creates a NOT expression.
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl From<Arith> for Expr {
    fn from(arith: Arith) -> Self {
        Self::Value(Value::Arith(arith))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// `LIKE` or `RLIKE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegexKind {
    Like,
    Rlike,
}

impl RegexKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Rlike => "RLIKE",
        }
    }
}

/// A WHERE condition.
///
/// The `negated` flags record a `NOT` written inside the predicate
/// (`a NOT IN (...)`, `a IS NOT NULL`, `NOT cidr_match(...)`), as opposed to
/// a `NOT` prefix on a whole predicate, which is a [`WhereExpr::Not`] node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WhereExpr {
    Or(Box<WhereExpr>, Box<WhereExpr>),
    And(Box<WhereExpr>, Box<WhereExpr>),
    Not(Box<WhereExpr>),
    Value(Value),
    InList {
        expr: Value,
        list: Vec<Value>,
        negated: bool,
    },
    FunctionTest {
        name: Identifier,
        target: QualifiedName,
        args: Vec<FnArg>,
        negated: bool,
    },
    IsNull {
        expr: Value,
        negated: bool,
    },
    RegexMatch {
        expr: Value,
        kind: RegexKind,
        pattern: String,
        negated: bool,
    },
}

impl WhereExpr {
    /// Converts to a general expression if no WHERE-only form is involved.
    #[must_use]
    pub fn into_expr(self) -> Option<Expr> {
        match self {
            Self::Or(left, right) => Some(Expr::Or(
                Box::new(left.into_expr()?),
                Box::new(right.into_expr()?),
            )),
            Self::And(left, right) => Some(Expr::And(
                Box::new(left.into_expr()?),
                Box::new(right.into_expr()?),
            )),
            Self::Not(inner) => Some(Expr::Not(Box::new(inner.into_expr()?))),
            Self::Value(value) => Some(Expr::Value(value)),
            Self::InList { .. }
            | Self::FunctionTest { .. }
            | Self::IsNull { .. }
            | Self::RegexMatch { .. } => None,
        }
    }
}
