use sinotick_core::{facade, NewsCategory, ProviderId, Records, Router};

use crate::cli::NewsArgs;
use crate::error::CliError;

use super::CommandOutcome;

pub async fn run(args: &NewsArgs, router: &Router) -> Result<CommandOutcome, CliError> {
    let items = facade::news(router, &args.category, args.limit, args.symbol.as_deref()).await?;

    let empty = items.is_empty();
    let mut outcome = CommandOutcome::ok(Records::News(items), feed_provider(&args.category));
    if empty {
        outcome = outcome.with_warning("feed returned no items");
    }

    Ok(outcome)
}

/// Which upstream serves a feed. The facade has already validated the
/// category by the time this runs, so unknown names never reach the match
/// arm that matters; they fall back to the live-feed host.
fn feed_provider(category: &str) -> ProviderId {
    match category.parse::<NewsCategory>() {
        Ok(NewsCategory::Cls) => ProviderId::Cls,
        Ok(NewsCategory::Sina) => ProviderId::Sina,
        Ok(NewsCategory::Futu) => ProviderId::Futu,
        Ok(NewsCategory::Ths) => ProviderId::Ths,
        _ => ProviderId::EastMoney,
    }
}
