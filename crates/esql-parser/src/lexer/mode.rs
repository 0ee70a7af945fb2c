//! Lexical modes.

use serde::{Deserialize, Serialize};

/// Selects which token kinds a bare word or punctuation character can become.
///
/// The parser pushes and pops modes at clause boundaries. The lexer never
/// switches modes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexMode {
    /// Command keywords and expressions.
    #[default]
    Default,
    /// The index list of `FROM`, including its `METADATA` clause.
    Source,
    /// Policy and field names of `ENRICH`.
    Enrich,
    /// The brackets around an `EXPLAIN` subquery.
    Explain,
}

impl LexMode {
    /// Returns the lowercase name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Source => "source",
            Self::Enrich => "enrich",
            Self::Explain => "explain",
        }
    }
}

impl core::str::FromStr for LexMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "expression" => Ok(Self::Default),
            "source" | "from" => Ok(Self::Source),
            "enrich" => Ok(Self::Enrich),
            "explain" => Ok(Self::Explain),
            other => Err(format!("unknown lexer mode `{other}`")),
        }
    }
}

impl core::fmt::Display for LexMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stack of lexical modes whose bottom entry is always [`LexMode::Default`].
#[derive(Debug, Clone)]
pub struct ModeStack {
    modes: Vec<LexMode>,
}

impl ModeStack {
    /// Creates a stack holding only the default mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modes: vec![LexMode::Default],
        }
    }

    /// Returns the active mode.
    #[must_use]
    pub fn current(&self) -> LexMode {
        self.modes.last().copied().unwrap_or_default()
    }

    /// Enters `mode`.
    pub fn push(&mut self, mode: LexMode) {
        self.modes.push(mode);
    }

    /// Leaves the active mode. The bottom default mode is never removed.
    pub fn pop(&mut self) -> Option<LexMode> {
        if self.modes.len() > 1 {
            self.modes.pop()
        } else {
            None
        }
    }

    /// Number of modes on the stack, the bottom one included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.modes.len()
    }
}

impl Default for ModeStack {
    fn default() -> Self {
        Self::new()
    }
}
