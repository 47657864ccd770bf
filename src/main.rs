mod config;
mod countdown;
mod runner;
mod signals;
mod touch;

use clap::Parser;
use config::Settings;
use countdown::ProgressBarDisplay;
use runner::RunSummary;
use std::path::PathBuf;
use std::process::ExitCode;
use touch::TouchError;
use tracing_subscriber::EnvFilter;

/// Keep a file system awake by repeatedly writing to a file.
#[derive(Parser, Debug)]
#[command(name = "horta", version, about, arg_required_else_help = true)]
pub struct Cli {
    /// Path to a file in the location you wish to keep active
    #[arg(value_name = "TARGET")]
    target: PathBuf,

    /// Frequency in minutes at which to write to the keep-alive file
    #[arg(short = 'f', long = "freq", value_name = "MINUTES",
          value_parser = clap::value_parser!(u32).range(1..))]
    frequency: u32,

    /// Control output verbosity. Pass multiple times for more output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::resolve(&cli.target, cli.frequency, cli.verbose) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(settings.log_directive()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let (trigger, mut shutdown) = signals::channel();
    if let Err(e) = signals::install(trigger) {
        tracing::warn!(error = %e, "failed to install signal handlers; stop with kill");
    }

    let mut display = ProgressBarDisplay::stderr();
    let result = runner::run(&settings, &mut display, &mut shutdown).await;
    ExitCode::from(report_outcome(&result))
}

/// Report how the loop ended and return the process exit status:
/// 0 after a clean shutdown, 1 when a touch failed.
fn report_outcome(result: &Result<RunSummary, TouchError>) -> u8 {
    match result {
        Ok(summary) => {
            eprintln!("Stopped. Times touched: {}", summary.touches);
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "touch failed");
            eprintln!("error: {e}");
            1
        }
    }
}
