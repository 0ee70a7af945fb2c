//! Parser configuration from the command line.

use std::path::Path;

use esql_parser::ParserConfig;
use tracing::debug;

use crate::error::CliError;

/// Builds the parser configuration.
///
/// The JSON file, if any, is the base. `max_depth` and `aggregations` from
/// the command line are applied on top of it.
pub fn load_config(
    path: Option<&Path>,
    max_depth: Option<usize>,
    aggregations: bool,
) -> Result<ParserConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            ParserConfig::from_json(&text).map_err(|source| CliError::ConfigFormat {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => ParserConfig::default(),
    };

    if let Some(max_depth) = max_depth {
        config.max_depth = max_depth;
    }
    if aggregations {
        config.functions = config.functions.with_aggregations();
    }
    config.validate()?;

    debug!(
        max_depth = config.max_depth,
        simple = config.functions.simple.len(),
        math = config.functions.math.len(),
        "loaded parser config"
    );
    Ok(config)
}
