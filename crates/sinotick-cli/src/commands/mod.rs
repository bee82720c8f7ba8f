mod hist;
mod index;
mod info;
mod news;
mod spot;

use std::time::Instant;

use sinotick_core::{ProviderId, Records, Router};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Envelope;

/// What a subcommand hands back before envelope assembly.
pub struct CommandOutcome {
    pub data: Records,
    pub source: ProviderId,
    pub warnings: Vec<String>,
}

impl CommandOutcome {
    pub fn ok(data: Records, source: ProviderId) -> Self {
        Self {
            data,
            source,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub async fn run(cli: &Cli, router: &Router) -> Result<Envelope, CliError> {
    let started = Instant::now();

    let outcome = match &cli.command {
        Command::Spot(args) => spot::run(args, router).await?,
        Command::Hist(args) => hist::run(args, router).await?,
        Command::Info(args) => info::run(args, router).await?,
        Command::Index(args) => index::run(args, router).await?,
        Command::News(args) => news::run(args, router).await?,
    };
    let latency_ms = started.elapsed().as_millis() as u64;

    Ok(Envelope::new(
        outcome.source,
        latency_ms,
        outcome.warnings,
        outcome.data,
    ))
}
