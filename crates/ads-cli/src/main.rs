//! Entry point for the `ads` binary.

use std::io;
use std::process::ExitCode;

use ads_cli::{Cli, EXIT_FAILURE, EnvelopeWriter, Runner};
use ads_transport::{CancelReason, CancelToken};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.global.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling in-flight request");
            on_interrupt.cancel(CancelReason::Interrupted);
        }
    });

    let format = cli.global.format;
    let runner = Runner::from_global(cli.global);
    let outcome = runner.execute(&cli.command, &cancel).await;

    let mut writer = EnvelopeWriter::new(io::stdout().lock(), format);
    if let Err(e) = writer.write(&outcome.envelope) {
        tracing::error!("{e}");
        return Ok(ExitCode::from(EXIT_FAILURE));
    }
    Ok(ExitCode::from(outcome.exit_code))
}
