//! Prints tagged values from an endless generator.
//!
//! ```text
//! fizzpipe [LIMIT]
//! ```
//!
//! Runs the generator, then the limit, then fizz(3), buzz(5), zang(7) and
//! bang(9), and prints one rendered value per line. Logs go to stderr; set
//! `RUST_LOG` to tune them. A reader that closes stdout early, as in
//! `fizzpipe 1000 | head -3`, simply ends the run.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use fizzpipe::config::{Cli, Config};
use fizzpipe::sinks::PrintSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Cli::try_parse() {
        Ok(cli) => Config::from_cli(&cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            warn!(error = %e, "could not parse arguments, using defaults");
            Config::default()
        }
    };
    debug!(limit = config.limit, tags = config.tags.len(), "starting pipeline");

    let pipeline = config.pipeline().context("invalid pipeline configuration")?;

    let token = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping pipeline");
            token.cancel();
        }
    });

    match pipeline.sink(PrintSink::new()).await {
        Ok(printed) => debug!(printed, "pipeline finished"),
        Err(e) if e.is_broken_pipe() => debug!("stdout closed, pipeline stopped"),
        Err(e) => return Err(e).context("failed to print results"),
    }

    Ok(())
}
