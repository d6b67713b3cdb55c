//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Motion Redact - real-time motion redaction for video streams
#[derive(Parser, Debug)]
#[command(
    name = "motion-redact",
    author,
    version,
    about = "Real-time video motion redaction pipeline",
    long_about = "Reads frames from a video source, detects moving regions by frame \n\
                  differencing, pixelates them and stamps the stream position on \n\
                  every frame before handing it to a presenter."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MOTION_REDACT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "MOTION_REDACT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the redaction pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Input stream (directory of frames). Defaults to `input.path` from the
    /// configuration, or `data/example`
    pub path: Option<String>,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "MOTION_REDACT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Capture backend
    #[arg(long, value_enum, env = "MOTION_REDACT_SOURCE")]
    pub source: Option<SourceArg>,

    /// Frame presenter
    #[arg(long, value_enum, env = "MOTION_REDACT_PRESENTER")]
    pub presenter: Option<PresenterArg>,

    /// Output directory for the `file` presenter (implies `--presenter file`)
    #[arg(short, long, env = "MOTION_REDACT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Outline every pixelated region
    #[arg(long)]
    pub show_boxes: bool,

    /// Minimum bounding-box area (px) for a region to be pixelated
    #[arg(long, env = "MOTION_REDACT_MIN_AREA")]
    pub min_area: Option<u64>,

    /// Inter-stage channel bound (0 = unbounded)
    #[arg(long, env = "MOTION_REDACT_CHANNEL_CAPACITY")]
    pub channel_capacity: Option<usize>,

    /// Stop after this many frames
    #[arg(long, env = "MOTION_REDACT_MAX_FRAMES")]
    pub max_frames: Option<u64>,

    /// How protocol violations are handled
    #[arg(long, value_enum, env = "MOTION_REDACT_PROTOCOL")]
    pub protocol: Option<ProtocolArg>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MOTION_REDACT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceArg {
    /// Directory of PNG/JPEG frames
    ImageSequence,
    /// Generated frames with a moving block
    Synthetic,
}

impl From<SourceArg> for contracts::InputKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::ImageSequence => Self::ImageSequence,
            SourceArg::Synthetic => Self::Synthetic,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenterArg {
    /// One log line per frame
    Log,
    /// One PNG per frame
    File,
    /// Discard frames
    Null,
}

impl From<PresenterArg> for contracts::PresenterKind {
    fn from(arg: PresenterArg) -> Self {
        match arg {
            PresenterArg::Log => Self::Log,
            PresenterArg::File => Self::File,
            PresenterArg::Null => Self::Null,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolArg {
    /// Fail the run
    Strict,
    /// Log a warning and continue
    Warn,
}

impl From<ProtocolArg> for contracts::ProtocolPolicy {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Strict => Self::Strict,
            ProtocolArg::Warn => Self::Warn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["motion-redact", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.path.is_none());
        assert!(args.config.is_none());
        assert!(!args.show_boxes);
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "motion-redact",
            "-v",
            "run",
            "clips/street",
            "--presenter",
            "null",
            "--source",
            "synthetic",
            "--show-boxes",
            "--min-area",
            "100",
            "--channel-capacity",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.path.as_deref(), Some("clips/street"));
        assert_eq!(args.presenter, Some(PresenterArg::Null));
        assert_eq!(args.source, Some(SourceArg::Synthetic));
        assert!(args.show_boxes);
        assert_eq!(args.min_area, Some(100));
        assert_eq!(args.channel_capacity, Some(8));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["motion-redact", "-q", "-v", "run"]).is_err());
    }

    #[test]
    fn test_validate_json() {
        let cli =
            Cli::try_parse_from(["motion-redact", "validate", "--config", "a.toml", "--json"])
                .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert!(args.json);
        assert_eq!(args.config, PathBuf::from("a.toml"));
    }
}
