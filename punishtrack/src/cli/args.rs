//! CLI argument definitions
//!
//! All Clap derive structs for `punishtrack` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Conversion and combo detection over per-frame game snapshots.
#[derive(Parser, Debug)]
#[command(name = "punishtrack", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "PUNISHTRACK_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "PUNISHTRACK_LOG_FORMAT"
    )]
    pub log_format: LogFormatArg,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track punishes in a frame stream and emit matching events.
    Run(RunArgs),

    /// Validate subscription files without processing input.
    Validate(ValidateArgs),
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Subscription file (YAML or JSON).
    #[arg(short, long, env = "PUNISHTRACK_CONFIG")]
    pub config: PathBuf,

    /// JSONL frame input; `-` reads stdin.
    #[arg(short, long, default_value = "-", env = "PUNISHTRACK_INPUT")]
    pub input: PathBuf,

    /// JSONL output file; stdout when omitted.
    #[arg(short, long, env = "PUNISHTRACK_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Ticks of opponent control that close a conversion.
    #[arg(long, default_value_t = 45, env = "PUNISHTRACK_CONVERSION_RESET_FRAMES")]
    pub conversion_reset_frames: u32,

    /// Ticks outside of hitstun/tech/down that close a combo.
    #[arg(long, default_value_t = 45, env = "PUNISHTRACK_COMBO_RESET_FRAMES")]
    pub combo_reset_frames: u32,

    /// Do not track combos.
    #[arg(long)]
    pub no_combos: bool,

    /// Leave opening types as `unknown`.
    #[arg(long)]
    pub no_opening_classification: bool,

    /// Events buffered between the tracker and the output before the tracker waits.
    #[arg(long, default_value_t = 1024, env = "PUNISHTRACK_CHANNEL_CAPACITY")]
    pub channel_capacity: usize,

    /// Expose Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long, env = "PUNISHTRACK_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Subscription files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Report format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    /// Always emit ANSI colors.
    Always,
    /// Never emit ANSI colors.
    Never,
}

/// Log format as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable lines.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Human => Self::Human,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Report format for `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
