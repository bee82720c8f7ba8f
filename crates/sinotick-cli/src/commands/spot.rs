use sinotick_core::{facade, ProviderId, Records, Router};

use crate::cli::SpotArgs;
use crate::error::CliError;

use super::CommandOutcome;

pub async fn run(args: &SpotArgs, router: &Router) -> Result<CommandOutcome, CliError> {
    let quote = facade::spot(router, &args.symbol).await?;

    Ok(CommandOutcome::ok(
        Records::Quote(quote),
        ProviderId::Tencent,
    ))
}
