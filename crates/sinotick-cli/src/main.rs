mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sinotick_core::{ProxyConfig, ReqwestHttpClient, Router, Transport};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            render_failure(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    // Proxy settings are read from the environment exactly once, here.
    let proxy = ProxyConfig::from_env();
    let client = Arc::new(ReqwestHttpClient::new(&proxy)?);
    let transport = Arc::new(Transport::new(client).with_timeout_override_ms(cli.timeout_ms));
    let router = Router::with_default_sources(transport);

    let envelope = commands::run(&cli, &router).await?;
    output::render(&envelope, cli.pretty)?;

    Ok(())
}

fn render_failure(error: &CliError) {
    eprintln!("error: {error}");

    let mut cause = std::error::Error::source(error);
    while let Some(current) = cause {
        eprintln!("  caused by: {current}");
        cause = current.source();
    }
}
