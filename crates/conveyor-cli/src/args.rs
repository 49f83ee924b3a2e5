use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use conveyor_core::models::CleanupMode;

#[derive(Debug, Parser)]
#[command(
    name = "conveyor",
    version,
    about = "Resolve task configurations into a pipeline and run it",
    long_about = "Loads one namespace per source unit, assembles the named tasks into an \
                  ordered pipeline, applies field redefinitions and hands the result to \
                  the execution engine."
)]
pub struct Cli {
    /// Source unit to load; repeat for several. The file stem names the namespace
    #[arg(short = 'f', long = "file", value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// When task cleanup runs
    #[arg(short, long, value_enum, default_value_t = CleanupArg::Always)]
    pub cleanup: CleanupArg,

    /// Field override of the form `task.key.path=value`; repeat for several
    #[arg(short = 'r', long = "redefine", value_name = "EXPR")]
    pub redefinitions: Vec<String>,

    /// Minimum level of log records; RUST_LOG takes precedence when set
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Omit timestamps from log records
    #[arg(long)]
    pub no_timestamps: bool,

    /// Print the assembled pipeline as JSON instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Task or group references, optionally qualified as `namespace.name`
    #[arg(value_name = "TASK", required = true)]
    pub tasks: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CleanupArg {
    Always,
    Never,
    Pronto,
    #[value(name = "on_success")]
    OnSuccess,
    #[value(name = "on_failure")]
    OnFailure,
}

impl From<CleanupArg> for CleanupMode {
    fn from(value: CleanupArg) -> Self {
        match value {
            CleanupArg::Always => Self::Always,
            CleanupArg::Never => Self::Never,
            CleanupArg::Pronto => Self::Pronto,
            CleanupArg::OnSuccess => Self::OnSuccess,
            CleanupArg::OnFailure => Self::OnFailure,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
