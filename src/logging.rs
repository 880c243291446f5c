//! Tracing subscriber setup for the binaries.

use clap::{ArgAction, Args, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Verbosity and format flags.
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long, env = "JYOTIR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}

impl LogArgs {
    fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "jyotir_rag=info,jyotir_api=info,jyotir_ingest=info",
            1 => "jyotir_rag=debug,jyotir_api=debug,jyotir_ingest=debug",
            _ => "jyotir_rag=trace,jyotir_api=trace,jyotir_ingest=trace",
        }
    }
}

/// Installs the global subscriber.
pub fn init_tracing(args: &LogArgs) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.default_filter()));

    match args.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}
