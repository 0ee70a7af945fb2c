//! Query text rendering via `fmt::Display` for AST nodes.
//!
//! Keywords are rendered uppercase and literals in their canonical form.
//! Parentheses are only added where precedence requires them, so rendering a
//! parsed query and parsing the result again yields the same text.

use std::fmt;

use super::{
    Arith, Command, Comparison, Constant, DateLiteral, DissectOption, EnrichWithClause, Expr,
    Field, FnArg, FunctionCall, Identifier, MathArg, Number, OrderExpr, Primary, QualifiedName,
    Query, RenameClause, ShowTarget, Value, WhereExpr,
};
use crate::lexer::{LexMode, lookup_keyword};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn comma_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Returns true if an expression identifier must be backtick-quoted.
fn needs_quoting(name: &str) -> bool {
    if name.contains('*') {
        // Name patterns are written as they were parsed
        return !name
            .chars()
            .all(|c| c == '*' || c == '_' || c == '@' || c.is_ascii_alphanumeric());
    }
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        Some('_' | '@') => {
            let rest = chars.as_str();
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    !valid || lookup_keyword(LexMode::Default, name).is_some_and(|kind| !kind.is_soft_keyword())
}

fn write_backticked(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    write!(f, "`{}`", name.replace('`', "``"))
}

/// Writes an identifier that appears inside an expression.
fn write_ident(f: &mut fmt::Formatter<'_>, ident: &Identifier) -> fmt::Result {
    if ident.quoted || needs_quoting(&ident.name) {
        write_backticked(f, &ident.name)
    } else {
        f.write_str(&ident.name)
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// `Debug` keeps a decimal point or exponent, so `1.0` does not come back as an integer.
fn write_decimal(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    write!(f, "{value:?}")
}

/// Source and enrich identifiers keep the spelling they were written with.
impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write_backticked(f, &self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write_ident(f, part)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(n) => write_decimal(f, *n),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Param => f.write_str("?"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(n) => write_decimal(f, *n),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write_string(f, s),
            Self::NumericArray(items) => {
                f.write_str("[")?;
                comma_list(f, items)?;
                f.write_str("]")
            }
            Self::BooleanArray(items) => {
                f.write_str("[")?;
                comma_list(f, items)?;
                f.write_str("]")
            }
            Self::StringArray(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_string(f, item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for DateLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.unit)
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_ident(f, &self.name)?;
        f.write_str("(")?;
        comma_list(f, &self.args)?;
        f.write_str(")")
    }
}

impl fmt::Display for Primary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(c) => write!(f, "{c}"),
            Self::Name(name) => write!(f, "{name}"),
            Self::Date(date) => write!(f, "{date}"),
            Self::Paren(expr) => write!(f, "({expr})"),
            Self::Call(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for FnArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::String(s) => write_string(f, s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Display for MathArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::String(s) => write_string(f, s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Arith(arith) => write!(f, "{arith}"),
            Self::Date(date) => write!(f, "{date}"),
            Self::Comparison(comparison) => write!(f, "{comparison}"),
        }
    }
}

impl Arith {
    /// Binding strength used to decide on parentheses.
    const fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { .. } => 3,
            Self::MathCall { .. } | Self::MathEvalCall { .. } | Self::Primary(_) => 4,
        }
    }
}

fn write_arith_operand(f: &mut fmt::Formatter<'_>, arith: &Arith, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({arith})")
    } else {
        write!(f, "{arith}")
    }
}

impl fmt::Display for Arith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { left, op, right } => {
                let prec = op.precedence();
                write_arith_operand(f, left, left.precedence() < prec)?;
                write!(f, " {} ", op.as_str())?;
                write_arith_operand(f, right, right.precedence() <= prec)
            }
            Self::Unary { op, operand } => {
                f.write_str(op.as_str())?;
                write_arith_operand(f, operand, operand.precedence() < 3)
            }
            Self::MathCall { name, args } => {
                write_ident(f, name)?;
                f.write_str("(")?;
                comma_list(f, args)?;
                f.write_str(")")
            }
            Self::MathEvalCall { name, args } => {
                write_ident(f, name)?;
                f.write_str("(")?;
                comma_list(f, args)?;
                f.write_str(")")
            }
            Self::Primary(primary) => write!(f, "{primary}"),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op.as_str(), self.right)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison(comparison) => write!(f, "{comparison}"),
            Self::Arith(arith) => write!(f, "{arith}"),
        }
    }
}

// Boolean tiers shared by both grammars: OR < AND < NOT < atom.
const OR_PREC: u8 = 1;
const AND_PREC: u8 = 2;
const NOT_PREC: u8 = 3;
const ATOM_PREC: u8 = 4;

/// Writes `left OP right` with left-associative parenthesization.
fn write_logical<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    (left, left_prec): (&T, u8),
    keyword: &str,
    (right, right_prec): (&T, u8),
    prec: u8,
) -> fmt::Result {
    if left_prec < prec {
        write!(f, "({left})")?;
    } else {
        write!(f, "{left}")?;
    }
    write!(f, " {keyword} ")?;
    if right_prec <= prec {
        write!(f, "({right})")
    } else {
        write!(f, "{right}")
    }
}

impl Expr {
    const fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => OR_PREC,
            Self::And(..) => AND_PREC,
            Self::Not(_) => NOT_PREC,
            Self::Value(_) => ATOM_PREC,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or(left, right) => write_logical(
                f,
                (left.as_ref(), left.precedence()),
                "OR",
                (right.as_ref(), right.precedence()),
                OR_PREC,
            ),
            Self::And(left, right) => write_logical(
                f,
                (left.as_ref(), left.precedence()),
                "AND",
                (right.as_ref(), right.precedence()),
                AND_PREC,
            ),
            Self::Not(inner) => {
                if inner.precedence() < NOT_PREC {
                    write!(f, "NOT ({inner})")
                } else {
                    write!(f, "NOT {inner}")
                }
            }
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

impl WhereExpr {
    const fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => OR_PREC,
            Self::And(..) => AND_PREC,
            Self::Not(_) => NOT_PREC,
            _ => ATOM_PREC,
        }
    }
}

const fn not_keyword(negated: bool) -> &'static str {
    if negated { "NOT " } else { "" }
}

impl fmt::Display for WhereExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or(left, right) => write_logical(
                f,
                (left.as_ref(), left.precedence()),
                "OR",
                (right.as_ref(), right.precedence()),
                OR_PREC,
            ),
            Self::And(left, right) => write_logical(
                f,
                (left.as_ref(), left.precedence()),
                "AND",
                (right.as_ref(), right.precedence()),
                AND_PREC,
            ),
            // A bare `NOT fn(...)` would read back as a negated function test
            Self::Not(inner) => {
                if inner.precedence() < NOT_PREC || matches!(**inner, Self::FunctionTest { .. }) {
                    write!(f, "NOT ({inner})")
                } else {
                    write!(f, "NOT {inner}")
                }
            }
            Self::Value(value) => write!(f, "{value}"),
            Self::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{expr} {}IN (", not_keyword(*negated))?;
                comma_list(f, list)?;
                f.write_str(")")
            }
            Self::FunctionTest {
                name,
                target,
                args,
                negated,
            } => {
                f.write_str(not_keyword(*negated))?;
                write_ident(f, name)?;
                write!(f, "({target}")?;
                for arg in args {
                    write!(f, ", {arg}")?;
                }
                f.write_str(")")
            }
            Self::IsNull { expr, negated } => {
                write!(f, "{expr} IS {}NULL", not_keyword(*negated))
            }
            Self::RegexMatch {
                expr,
                kind,
                pattern,
                negated,
            } => {
                write!(f, "{expr} {}{} ", not_keyword(*negated), kind.as_str())?;
                write_string(f, pattern)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name} = ")?;
        }
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for OrderExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(direction) = self.direction {
            write!(f, " {}", direction.as_str())?;
        }
        if let Some(nulls) = self.nulls {
            write!(f, " NULLS {}", nulls.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Display for RenameClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.from, self.to)
    }
}

impl fmt::Display for DissectOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_ident(f, &self.key)?;
        write!(f, " = {}", self.value)
    }
}

impl fmt::Display for EnrichWithClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(new_name) = &self.new_name {
            write!(f, "{new_name} = ")?;
        }
        write!(f, "{}", self.source_field)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())?;
        match self {
            Self::Explain(c) => write!(f, " [{}]", c.query),
            Self::From(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.sources)?;
                if !c.metadata.is_empty() {
                    f.write_str(" METADATA ")?;
                    comma_list(f, &c.metadata)?;
                }
                Ok(())
            }
            Self::Row(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.fields)
            }
            Self::Show(c) => match c.target {
                ShowTarget::Info => f.write_str(" INFO"),
                ShowTarget::Functions => f.write_str(" FUNCTIONS"),
            },
            Self::Eval(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.fields)
            }
            Self::Limit(c) => write!(f, " {}", c.count),
            Self::Keep(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.names)
            }
            Self::Drop(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.names)
            }
            Self::MvExpand(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.names)
            }
            Self::Rename(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.clauses)
            }
            Self::Dissect(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.targets)?;
                f.write_str(" ")?;
                write_string(f, &c.pattern)?;
                if !c.options.is_empty() {
                    f.write_str(" ")?;
                    comma_list(f, &c.options)?;
                }
                Ok(())
            }
            Self::Grok(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.targets)?;
                f.write_str(" ")?;
                write_string(f, &c.pattern)
            }
            Self::Sort(c) => {
                f.write_str(" ")?;
                comma_list(f, &c.orders)
            }
            Self::Stats(c) | Self::InlineStats(c) => {
                if !c.fields.is_empty() {
                    f.write_str(" ")?;
                    comma_list(f, &c.fields)?;
                }
                if !c.group_by.is_empty() {
                    f.write_str(" BY ")?;
                    comma_list(f, &c.group_by)?;
                }
                Ok(())
            }
            Self::Where(c) => write!(f, " {}", c.condition),
            Self::Enrich(c) => {
                write!(f, " {}", c.policy)?;
                if let Some(field) = &c.match_field {
                    write!(f, " ON {field}")?;
                }
                if !c.with.is_empty() {
                    f.write_str(" WITH ")?;
                    comma_list(f, &c.with)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{command}")?;
        }
        Ok(())
    }
}
