//! Parser configuration.
//!
//! The function tables decide which call syntax a name gets. `max_depth`
//! and `max_operators` bound the height of the tree built from adversarial
//! input.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default maximum nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Highest accepted `max_depth`.
///
/// Each level costs several stack frames, so limits near this one need a
/// thread with a larger stack than the default 2 MiB.
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// Default maximum number of binary operators in one query.
pub const DEFAULT_MAX_OPERATORS: usize = 1024;

/// Highest accepted `max_operators`.
///
/// Chains fold into left-deep trees, and dropping or rendering one recurses
/// once per operator.
pub const MAX_OPERATORS_LIMIT: usize = 8192;

/// Scalar functions that take math/eval arguments.
const MATH_FUNCTIONS: &[&str] = &[
    "abs",
    "acos",
    "asin",
    "atan",
    "atan2",
    "auto_bucket",
    "case",
    "ceil",
    "coalesce",
    "concat",
    "cos",
    "cosh",
    "date_extract",
    "date_format",
    "date_parse",
    "date_trunc",
    "e",
    "ends_with",
    "floor",
    "greatest",
    "is_finite",
    "is_infinite",
    "is_nan",
    "least",
    "left",
    "length",
    "log10",
    "ltrim",
    "mv_avg",
    "mv_concat",
    "mv_count",
    "mv_dedupe",
    "mv_max",
    "mv_median",
    "mv_min",
    "mv_sum",
    "now",
    "pi",
    "pow",
    "replace",
    "right",
    "round",
    "rtrim",
    "sin",
    "sinh",
    "split",
    "sqrt",
    "starts_with",
    "substring",
    "tan",
    "tanh",
    "tau",
    "to_boolean",
    "to_datetime",
    "to_degrees",
    "to_double",
    "to_integer",
    "to_ip",
    "to_long",
    "to_radians",
    "to_string",
    "to_unsigned_long",
    "to_version",
    "trim",
];

/// Aggregations, which take only names, strings and numbers.
const AGGREGATION_FUNCTIONS: &[&str] = &[
    "avg",
    "count",
    "count_distinct",
    "max",
    "median",
    "median_absolute_deviation",
    "min",
    "percentile",
    "sum",
];

/// Functions that are only valid as WHERE predicates.
const WHERE_FUNCTIONS: &[&str] = &["cidr_match"];

/// The call syntax bound to a function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallForm {
    /// Arguments restricted to names, strings and numbers.
    Simple,
    /// Arguments may be operator expressions, time spans and comparisons.
    Math,
    /// A WHERE-only predicate whose first argument is a field name.
    Where,
}

/// Function names by call form. Lookups ignore ASCII case.
///
/// Names in no table parse as general calls taking arbitrary expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionTable {
    pub simple: BTreeSet<String>,
    pub math: BTreeSet<String>,
    pub where_functions: BTreeSet<String>,
}

fn name_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_ascii_lowercase()).collect()
}

impl FunctionTable {
    /// Creates a table with no functions at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            simple: BTreeSet::new(),
            math: BTreeSet::new(),
            where_functions: BTreeSet::new(),
        }
    }

    /// Adds the aggregation functions to the simple table.
    #[must_use]
    pub fn with_aggregations(mut self) -> Self {
        self.simple.extend(name_set(AGGREGATION_FUNCTIONS));
        self
    }

    /// Binds `name` to `form`, removing it from the other tables.
    #[must_use]
    pub fn with_function(mut self, name: &str, form: CallForm) -> Self {
        let name = name.to_ascii_lowercase();
        self.simple.remove(&name);
        self.math.remove(&name);
        self.where_functions.remove(&name);
        match form {
            CallForm::Simple => self.simple.insert(name),
            CallForm::Math => self.math.insert(name),
            CallForm::Where => self.where_functions.insert(name),
        };
        self
    }

    /// Returns the call form bound to `name`.
    ///
    /// WHERE functions win over the other tables, then simple, then math.
    #[must_use]
    pub fn classify(&self, name: &str) -> Option<CallForm> {
        let name = name.to_ascii_lowercase();
        if self.where_functions.contains(&name) {
            Some(CallForm::Where)
        } else if self.simple.contains(&name) {
            Some(CallForm::Simple)
        } else if self.math.contains(&name) {
            Some(CallForm::Math)
        } else {
            None
        }
    }

    /// Lowercases every entry so lookups match regardless of input case.
    fn normalize(&mut self) {
        for set in [&mut self.simple, &mut self.math, &mut self.where_functions] {
            *set = set.iter().map(|name| name.to_ascii_lowercase()).collect();
        }
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self {
            simple: BTreeSet::new(),
            math: name_set(MATH_FUNCTIONS),
            where_functions: name_set(WHERE_FUNCTIONS),
        }
    }
}

/// Errors from validating a [`ParserConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `max_depth` is zero.
    #[error("max_depth must be at least 1")]
    ZeroDepth,

    /// `max_depth` is above [`MAX_DEPTH_LIMIT`].
    #[error("max_depth {0} exceeds the limit of {MAX_DEPTH_LIMIT}")]
    DepthTooLarge(usize),

    /// `max_operators` is zero.
    #[error("max_operators must be at least 1")]
    ZeroOperators,

    /// `max_operators` is above [`MAX_OPERATORS_LIMIT`].
    #[error("max_operators {0} exceeds the limit of {MAX_OPERATORS_LIMIT}")]
    OperatorsTooLarge(usize),

    /// A function name is empty.
    #[error("function tables contain an empty name")]
    EmptyFunctionName,
}

/// Settings for a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting of parentheses, prefix operators, calls and EXPLAIN subqueries.
    pub max_depth: usize,
    /// Maximum number of binary operators across the whole query.
    ///
    /// Operator chains are folded in a loop, so they are not bounded by
    /// `max_depth`, but each operator still adds a level to the tree.
    pub max_operators: usize,
    pub functions: FunctionTable,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_operators: DEFAULT_MAX_OPERATORS,
            functions: FunctionTable::default(),
        }
    }
}

impl ParserConfig {
    /// Parses a configuration from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if `json` is malformed or has wrongly typed keys.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(json)?;
        config.functions.normalize();
        Ok(config)
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of binary operators.
    #[must_use]
    pub const fn with_max_operators(mut self, max_operators: usize) -> Self {
        self.max_operators = max_operators;
        self
    }

    /// Replaces the function table.
    #[must_use]
    pub fn with_functions(mut self, functions: FunctionTable) -> Self {
        self.functions = functions;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::DepthTooLarge(self.max_depth));
        }
        if self.max_operators == 0 {
            return Err(ConfigError::ZeroOperators);
        }
        if self.max_operators > MAX_OPERATORS_LIMIT {
            return Err(ConfigError::OperatorsTooLarge(self.max_operators));
        }
        let functions = &self.functions;
        if functions
            .simple
            .iter()
            .chain(&functions.math)
            .chain(&functions.where_functions)
            .any(String::is_empty)
        {
            return Err(ConfigError::EmptyFunctionName);
        }
        Ok(())
    }
}
