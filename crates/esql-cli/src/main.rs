//! esql CLI
//!
//! Command-line tool for parsing ES|QL queries and inspecting the result.

mod config;
mod error;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use esql_parser::lexer::tokenize;
use esql_parser::{LexMode, ParseError, ParserConfig, Query};

use crate::config::load_config;
use crate::error::CliError;

/// Parse and check ES|QL pipe queries.
#[derive(Parser)]
#[command(name = "esql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with the parser configuration.
    #[arg(short, long, env = "ESQL_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum nesting depth, overriding the config file.
    #[arg(long, env = "ESQL_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// Parse aggregation calls with restricted arguments.
    #[arg(long)]
    aggregations: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the query text comes from.
#[derive(clap::Args)]
struct Input {
    /// The query. Read from `--file` or stdin when omitted.
    query: Option<String>,

    /// Read the query from a file.
    #[arg(short, long, conflicts_with = "query")]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print its syntax tree.
    Parse {
        #[command(flatten)]
        input: Input,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check that a query parses, printing a diagnostic if it does not.
    Check {
        #[command(flatten)]
        input: Input,
    },

    /// Print the tokens of a query.
    Tokens {
        #[command(flatten)]
        input: Input,

        /// Lexer mode to start in.
        #[arg(short, long, default_value = "default")]
        mode: LexMode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Canonical query text.
    Text,
    /// The syntax tree as JSON.
    Json,
    /// The syntax tree in Rust debug form.
    Debug,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref(), cli.max_depth, cli.aggregations)?;

    let status = match cli.command {
        Commands::Parse { input, format } => {
            let source = read_query(&input)?;
            match esql_parser::parse_with_config(&source, &config) {
                Ok(query) => {
                    println!("{}", render_query(&query, format)?);
                    ExitCode::SUCCESS
                }
                Err(err) => report(&err, &source),
            }
        }

        Commands::Check { input } => {
            let source = read_query(&input)?;
            check(&source, &config)
        }

        Commands::Tokens { input, mode } => {
            let source = read_query(&input)?;
            for token in tokenize(&source, mode) {
                println!(
                    "{}:{}\t{:?}\t{}",
                    token.line + 1,
                    token.column + 1,
                    token.kind,
                    token.text
                );
            }
            ExitCode::SUCCESS
        }
    };

    Ok(status)
}

fn check(source: &str, config: &ParserConfig) -> ExitCode {
    match esql_parser::parse_with_config(source, config) {
        Ok(query) => {
            info!(commands = query.commands.len(), "query is valid");
            println!("ok");
            ExitCode::SUCCESS
        }
        Err(err) => report(&err, source),
    }
}

fn report(err: &ParseError, source: &str) -> ExitCode {
    eprint!("{}", err.render(source));
    ExitCode::FAILURE
}

fn render_query(query: &Query, format: OutputFormat) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Text => query.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(query)?,
        OutputFormat::Debug => format!("{query:#?}"),
    })
}

fn read_query(input: &Input) -> Result<String, CliError> {
    if let Some(query) = &input.query {
        return Ok(query.clone());
    }
    if let Some(path) = &input.file {
        return read_file(path);
    }
    debug!("reading query from stdin");
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .map_err(CliError::Stdin)?;
    Ok(source)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
