//! Query and command AST types.

use serde::Serialize;

use super::{Constant, Expr, Identifier, QualifiedName, WhereExpr};
use crate::lexer::Span;

/// A full pipeline: one source command followed by processing commands.
///
/// The parser guarantees that `commands` is non-empty, that the first
/// command is a source command and that every other command is a
/// processing command, in pipeline order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub commands: Vec<Command>,
    pub span: Span,
}

impl Query {
    /// Returns the source command.
    #[must_use]
    pub fn source(&self) -> Option<&Command> {
        self.commands.first()
    }

    /// Returns the processing commands in pipeline order.
    #[must_use]
    pub fn processing(&self) -> &[Command] {
        self.commands.get(1..).unwrap_or_default()
    }
}

/// A named or anonymous expression, as in `ROW a = 1, 2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// The column the value is bound to, if any. It may be dotted, as in
    /// `EVAL host.port = 80`.
    pub name: Option<QualifiedName>,
    pub value: Expr,
    pub span: Span,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Placement of nulls in a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::First => "FIRST",
            Self::Last => "LAST",
        }
    }
}

/// One key of a SORT command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderExpr {
    pub expr: Expr,
    /// `None` when no direction was written.
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsOrder>,
    pub span: Span,
}

/// What SHOW lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShowTarget {
    Info,
    Functions,
}

/// `EXPLAIN [ query ]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainCommand {
    pub query: Box<Query>,
    pub span: Span,
}

/// `FROM index, ... [METADATA field, ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromCommand {
    pub sources: Vec<Identifier>,
    /// Metadata fields, empty when there is no METADATA clause. The bare and
    /// bracketed forms parse to the same list.
    pub metadata: Vec<Identifier>,
    pub span: Span,
}

/// `ROW field, ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowCommand {
    pub fields: Vec<Field>,
    pub span: Span,
}

/// `SHOW INFO` or `SHOW FUNCTIONS`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowCommand {
    pub target: ShowTarget,
    pub span: Span,
}

/// `EVAL field, ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalCommand {
    pub fields: Vec<Field>,
    pub span: Span,
}

/// `LIMIT n`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitCommand {
    pub count: u64,
    pub span: Span,
}

/// `KEEP name, ...`, also spelled `PROJECT`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeepCommand {
    pub names: Vec<QualifiedName>,
    pub span: Span,
}

/// `DROP name, ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropCommand {
    pub names: Vec<QualifiedName>,
    pub span: Span,
}

/// `old AS new` inside RENAME.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameClause {
    pub from: QualifiedName,
    pub to: QualifiedName,
}

/// `RENAME old AS new, ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameCommand {
    pub clauses: Vec<RenameClause>,
    pub span: Span,
}

/// `key = constant` after a DISSECT pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DissectOption {
    pub key: Identifier,
    pub value: Constant,
}

/// `DISSECT field "pattern" [key = value, ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DissectCommand {
    pub targets: Vec<QualifiedName>,
    pub pattern: String,
    pub options: Vec<DissectOption>,
    pub span: Span,
}

/// `GROK field "pattern"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrokCommand {
    pub targets: Vec<QualifiedName>,
    pub pattern: String,
    pub span: Span,
}

/// `SORT key, ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortCommand {
    pub orders: Vec<OrderExpr>,
    pub span: Span,
}

/// `STATS [field, ...] [BY name, ...]`, also used by `INLINESTATS`.
///
/// Either vector is empty when its clause is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsCommand {
    pub fields: Vec<Field>,
    pub group_by: Vec<QualifiedName>,
    pub span: Span,
}

/// `WHERE condition`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhereCommand {
    pub condition: WhereExpr,
    pub span: Span,
}

/// `MV_EXPAND name, ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MvExpandCommand {
    pub names: Vec<QualifiedName>,
    pub span: Span,
}

/// `[new_name =] source_field` inside ENRICH ... WITH.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichWithClause {
    pub new_name: Option<Identifier>,
    pub source_field: Identifier,
}

/// `ENRICH policy [ON field] [WITH clause, ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichCommand {
    pub policy: Identifier,
    pub match_field: Option<Identifier>,
    /// Empty when there is no WITH clause.
    pub with: Vec<EnrichWithClause>,
    pub span: Span,
}

/// A pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    // Source commands
    Explain(ExplainCommand),
    From(FromCommand),
    Row(RowCommand),
    Show(ShowCommand),

    // Processing commands
    Eval(EvalCommand),
    Limit(LimitCommand),
    Keep(KeepCommand),
    Drop(DropCommand),
    Rename(RenameCommand),
    Dissect(DissectCommand),
    Grok(GrokCommand),
    Sort(SortCommand),
    Stats(StatsCommand),
    InlineStats(StatsCommand),
    Where(WhereCommand),
    MvExpand(MvExpandCommand),
    Enrich(EnrichCommand),
}

impl Command {
    /// Returns true for commands that start a pipeline.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(
            self,
            Self::Explain(_) | Self::From(_) | Self::Row(_) | Self::Show(_)
        )
    }

    /// Returns true for commands that transform a previous stage.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        !self.is_source()
    }

    /// Returns the leading keyword of the command.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Explain(_) => "EXPLAIN",
            Self::From(_) => "FROM",
            Self::Row(_) => "ROW",
            Self::Show(_) => "SHOW",
            Self::Eval(_) => "EVAL",
            Self::Limit(_) => "LIMIT",
            Self::Keep(_) => "KEEP",
            Self::Drop(_) => "DROP",
            Self::Rename(_) => "RENAME",
            Self::Dissect(_) => "DISSECT",
            Self::Grok(_) => "GROK",
            Self::Sort(_) => "SORT",
            Self::Stats(_) => "STATS",
            Self::InlineStats(_) => "INLINESTATS",
            Self::Where(_) => "WHERE",
            Self::MvExpand(_) => "MV_EXPAND",
            Self::Enrich(_) => "ENRICH",
        }
    }

    /// Returns the source range of the command.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Explain(c) => c.span,
            Self::From(c) => c.span,
            Self::Row(c) => c.span,
            Self::Show(c) => c.span,
            Self::Eval(c) => c.span,
            Self::Limit(c) => c.span,
            Self::Keep(c) => c.span,
            Self::Drop(c) => c.span,
            Self::Rename(c) => c.span,
            Self::Dissect(c) => c.span,
            Self::Grok(c) => c.span,
            Self::Sort(c) => c.span,
            Self::Stats(c) | Self::InlineStats(c) => c.span,
            Self::Where(c) => c.span,
            Self::MvExpand(c) => c.span,
            Self::Enrich(c) => c.span,
        }
    }
}
