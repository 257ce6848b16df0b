use anyhow::Result;
use clap::Parser;
use evalmap::cli::{log_level, Cli, Commands};
use evalmap::commands::analyze::{handle_analyze, AnalyzeConfig};
use evalmap::errors::user_fixable_cause;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            format,
            output,
            config,
            verbosity,
        } => {
            init_logging(verbosity);
            handle_analyze(AnalyzeConfig {
                input,
                format,
                output,
                config,
            })
            .inspect_err(log_hint)
        }
        Commands::Init { force } => {
            init_logging(0);
            evalmap::commands::init::init_config(force)
        }
    }
}

fn log_hint(err: &anyhow::Error) {
    if let Some(hint) = user_fixable_cause(err).and_then(|cause| cause.hint()) {
        tracing::warn!("hint: {}", hint);
    }
}

/// Logs go to stderr so JSON on stdout stays parseable.
/// `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbosity)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
