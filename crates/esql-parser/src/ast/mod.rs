//! Abstract Syntax Tree (AST) types.
//!
//! Every node implements `Display`, rendering canonical query text that
//! parses back to the same rendering.

mod command;
mod display;
mod expression;

pub use command::{
    Command, DissectCommand, DissectOption, DropCommand, EnrichCommand, EnrichWithClause,
    EvalCommand, ExplainCommand, Field, FromCommand, GrokCommand, KeepCommand, LimitCommand,
    MvExpandCommand, NullsOrder, OrderExpr, Query, RenameClause, RenameCommand, RowCommand,
    ShowCommand, ShowTarget, SortCommand, SortDirection, StatsCommand, WhereCommand,
};
pub use expression::{
    Arith, ArithOp, Comparison, ComparisonOp, Constant, DateLiteral, Expr, FnArg, FunctionCall,
    Identifier, MathArg, Number, Primary, QualifiedName, RegexKind, Sign, Value, WhereExpr,
};
