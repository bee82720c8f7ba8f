use sinotick_core::{facade, ProviderId, Records, Router};

use crate::cli::InfoArgs;
use crate::error::CliError;

use super::CommandOutcome;

pub async fn run(args: &InfoArgs, router: &Router) -> Result<CommandOutcome, CliError> {
    let profile = facade::info(router, &args.symbol).await?;

    Ok(CommandOutcome::ok(
        Records::Info(profile),
        ProviderId::EastMoney,
    ))
}
