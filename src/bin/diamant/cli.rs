//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for
//! Diamant.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Struct containing the CLI configuration for Diamant.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specify the log level of the front-end.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,

    /// Dump the requested stage as pretty-printed JSON instead of Rust debug
    /// output, for tooling/debugging that wants to consume the result.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of Diamant.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also logs warnings, such as a variable bound but never read.
    #[value(alias("1"))]
    Warn,

    /// Also logs which stage of the pipeline is currently running.
    #[value(alias("2"))]
    Info,

    /// Logs internal detail of each pipeline stage.
    #[value(alias("3"))]
    Debug,

    /// Logs everything, including per-token/per-node tracing.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Which pipeline stage to run and dump. `Pp` is an alias for `Annotate`: a
/// pretty printer is never specified as a concrete collaborator, so the
/// fullest dump stands in for it rather than fabricating a formatter.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read the source file and echo it back unchanged (sanity check that
    /// the file can be read and decoded as UTF-8).
    Source(FileArgs),

    /// Lex the source file and dump the resulting token stream.
    Lex(FileArgs),

    /// Lex and parse the source file and dump the resulting AST.
    Parse(FileArgs),

    /// Lex, parse, and annotate the source file and dump the annotated AST.
    Annotate(FileArgs),

    /// Alias of `annotate`.
    Pp(FileArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// The path to the Diamant source file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,
}
