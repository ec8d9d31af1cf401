//! DER telemetry simulator entry point: CLI, logging and the tick loop.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use der_telemetry_sim::cli::Cli;
use der_telemetry_sim::error::SimError;
use der_telemetry_sim::io::export::TelemetryCsvWriter;
use der_telemetry_sim::publish::StdoutPublisher;
use der_telemetry_sim::runner::build_orchestrator;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), SimError> {
    let config = cli.load_scenario()?;
    let mut orchestrator = build_orchestrator(&config, StdoutPublisher::stdout())?;
    if let Some(path) = &cli.telemetry_out {
        tracing::info!(path = %path.display(), "recording telemetry to CSV");
        orchestrator = orchestrator.with_recorder(TelemetryCsvWriter::create(path)?);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c; run until max_messages");
            std::future::pending::<()>().await;
        }
    };
    orchestrator.run(shutdown).await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            for line in e.to_string().lines() {
                eprintln!("error: {line}");
            }
            ExitCode::FAILURE
        }
    }
}
