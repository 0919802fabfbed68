//! Command-line options.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatch::Dispatcher;
use crate::request_file::Matching;

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Styled terminal sections
    #[default]
    Pretty,
    /// The normalized response as JSON
    Json,
}

/// Run every request in a `.http` file and print the responses.
#[derive(Debug, Parser)]
#[command(name = "http-file-runner", version)]
pub struct Cli {
    /// Request file to run
    pub file: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Do not render the parsed body section
    #[arg(long)]
    pub no_body: bool,

    /// Send independent requests concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Match methods and content types case-insensitively
    #[arg(long)]
    pub lenient: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Used when RUST_LOG is not set
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn matching(&self) -> Matching {
        if self.lenient {
            Matching::CaseInsensitive
        } else {
            Matching::Exact
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            timeout: self.timeout(),
            parallel: self.parallel,
        }
    }
}
