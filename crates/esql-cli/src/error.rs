//! Error types for the command-line tool.

use std::path::PathBuf;

use esql_parser::ConfigError;

/// Errors that stop the tool before or after parsing.
///
/// A query that fails to parse is not a `CliError`: it is reported as a
/// diagnostic and turned into a failing exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A query or config file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// The file that was being read.
        path: PathBuf,
        source: std::io::Error,
    },

    /// The query could not be read from stdin.
    #[error("Failed to read query from stdin: {0}")]
    Stdin(#[source] std::io::Error),

    /// The config file is not valid JSON for a parser configuration.
    #[error("Invalid config file '{path}': {source}")]
    ConfigFormat {
        /// Path to the config file.
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The configuration was read but is unusable.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The syntax tree could not be rendered as JSON.
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}
