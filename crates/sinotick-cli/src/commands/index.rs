use sinotick_core::{facade, ProviderId, Records, Router};

use crate::cli::IndexArgs;
use crate::error::CliError;

use super::CommandOutcome;

pub async fn run(args: &IndexArgs, router: &Router) -> Result<CommandOutcome, CliError> {
    let summary = facade::index(router, &args.symbol).await?;

    Ok(CommandOutcome::ok(
        Records::Index(summary),
        ProviderId::Tencent,
    ))
}
