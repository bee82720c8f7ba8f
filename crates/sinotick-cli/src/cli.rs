//! Command-line definitions for sinotick.

use clap::{Args, Parser, Subcommand};

/// A-share market data fetched from public upstreams and normalized to one
/// JSON envelope per request.
#[derive(Debug, Parser)]
#[command(name = "sinotick", version, about = "A-share market data CLI")]
pub struct Cli {
    /// Pretty-print the JSON envelope.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Override the per-request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Latest quote for one stock.
    Spot(SpotArgs),

    /// Daily, weekly or monthly candles over a date range.
    Hist(HistArgs),

    /// Company profile for one stock.
    Info(InfoArgs),

    /// Latest snapshot of a market index.
    Index(IndexArgs),

    /// Latest headlines from one news feed.
    News(NewsArgs),
}

/// Arguments for the `spot` command.
#[derive(Debug, Args)]
pub struct SpotArgs {
    /// Six-digit stock code, bare or exchange-prefixed (600000, sh600000).
    #[arg(long)]
    pub symbol: String,
}

/// Arguments for the `hist` command.
#[derive(Debug, Args)]
pub struct HistArgs {
    /// Six-digit stock code, bare or exchange-prefixed.
    #[arg(long)]
    pub symbol: String,

    /// Range start, YYYYMMDD.
    #[arg(long)]
    pub start: String,

    /// Range end, YYYYMMDD.
    #[arg(long)]
    pub end: String,

    /// Bar period: day, week or month.
    #[arg(long, default_value = "day")]
    pub period: String,

    /// Price adjustment: none, qfq or hfq.
    #[arg(long, default_value = "none")]
    pub adjust: String,
}

/// Arguments for the `info` command.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Six-digit stock code, bare or exchange-prefixed.
    #[arg(long)]
    pub symbol: String,
}

/// Arguments for the `index` command.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Index code, bare or exchange-prefixed (000001, sh000001).
    #[arg(long)]
    pub symbol: String,
}

/// Arguments for the `news` command.
#[derive(Debug, Args)]
pub struct NewsArgs {
    /// Feed name: stock, market, cls, breakfast, global, sina, futu or ths.
    #[arg(long = "type", value_name = "CATEGORY")]
    pub category: String,

    /// Cap on returned items, clamped to the feed's own maximum.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Subject stock for the per-symbol `stock` feed.
    #[arg(long)]
    pub symbol: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hist_defaults_to_unadjusted_daily_bars() {
        let cli = Cli::parse_from([
            "sinotick", "hist", "--symbol", "600000", "--start", "20250101", "--end", "20250131",
        ]);

        let Command::Hist(args) = cli.command else {
            panic!("expected the hist subcommand");
        };
        assert_eq!(args.period, "day");
        assert_eq!(args.adjust, "none");
    }

    #[test]
    fn news_type_flag_maps_to_the_category() {
        let cli = Cli::parse_from(["sinotick", "news", "--type", "cls", "--limit", "5"]);

        let Command::News(args) = cli.command else {
            panic!("expected the news subcommand");
        };
        assert_eq!(args.category, "cls");
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.symbol, None);
    }
}
