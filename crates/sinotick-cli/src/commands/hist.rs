use sinotick_core::{facade, ProviderId, Records, Router};

use crate::cli::HistArgs;
use crate::error::CliError;

use super::CommandOutcome;

pub async fn run(args: &HistArgs, router: &Router) -> Result<CommandOutcome, CliError> {
    let candles = facade::history(
        router,
        &args.symbol,
        &args.start,
        &args.end,
        &args.period,
        &args.adjust,
    )
    .await?;

    let empty = candles.is_empty();
    let mut outcome = CommandOutcome::ok(Records::Candles(candles), ProviderId::Tencent);
    if empty {
        outcome = outcome.with_warning("no bars in the requested range");
    }

    Ok(outcome)
}
