//! storysweep CLI - Main Entry Point
//!
//! Serves a built Storybook, walks every story in a headless browser and
//! prints the accessibility violations axe-core finds.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

mod args;
mod output;

use args::Cli;
use output::OutputFormat;
use storysweep_sweep::{ChromiumSession, SweepRunner};
use storysweep_web::{CatalogServer, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let config = cli.to_config()?;

    if config.engine_script.is_none()
        && !config
            .catalog_dir
            .join(config.engine_path.trim_start_matches('/'))
            .is_file()
    {
        warn!(
            "{} has no {}; pass --axe-script if audits never report",
            config.catalog_dir.display(),
            config.engine_path
        );
    }

    let server = CatalogServer::start(ServerConfig {
        catalog_dir: config.catalog_dir.clone(),
        engine_script: config.engine_script.clone(),
        port: config.port,
    })
    .await
    .context("starting catalog server")?;
    let base_url = server.base_url();

    let session = match ChromiumSession::launch(&config.browser).await {
        Ok(session) => session,
        Err(e) => {
            server.stop().await;
            return Err(e).context("launching browser");
        }
    };

    let out: Box<dyn Write + Send> = match format {
        OutputFormat::Text => Box::new(std::io::stdout()),
        OutputFormat::Json => Box::new(std::io::sink()),
    };

    let mut runner = SweepRunner::new(session, out, config, &base_url)?;
    let result = runner.run(&base_url).await;

    let (session, _) = runner.into_parts();
    if let Err(e) = session.close().await {
        warn!("Closing browser: {}", e);
    }
    server.stop().await;

    let summary = result.context("sweep aborted")?;
    info!("Sweep complete");
    output::print_summary(&summary, format)?;
    Ok(())
}
