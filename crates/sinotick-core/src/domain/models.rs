use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::timestamp::in_session;
use crate::{Adjust, CandlePeriod, CstDateTime, Exchange, IndexCode, Symbol, ValidationError};

/// Point-in-time snapshot of a tradable symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub name: String,
    pub last: Decimal,
    pub prev_close: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub change: Decimal,
    pub change_pct: Decimal,
    pub volume: u64,
    pub turnover: Decimal,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub as_of: CstDateTime,
}

impl Quote {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        name: impl Into<String>,
        last: Decimal,
        prev_close: Decimal,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        change: Decimal,
        change_pct: Decimal,
        volume: u64,
        turnover: Decimal,
        bid: Option<Decimal>,
        ask: Option<Decimal>,
        as_of: CstDateTime,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("last", last)?;
        validate_non_negative("prev_close", prev_close)?;
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("turnover", turnover)?;
        validate_optional_non_negative("bid", bid)?;
        validate_optional_non_negative("ask", ask)?;

        Ok(Self {
            symbol,
            name: name.into(),
            last,
            prev_close,
            open,
            high,
            low,
            change,
            change_pct,
            volume,
            turnover,
            bid,
            ask,
            as_of,
        })
    }
}

/// One bar of a candle series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub symbol: Symbol,
    pub period: CandlePeriod,
    pub adjust: Adjust,
    pub start: CstDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
    pub turnover: Option<Decimal>,
}

impl Candle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        period: CandlePeriod,
        adjust: Adjust,
        start: CstDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
        turnover: Option<Decimal>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        validate_optional_non_negative("turnover", turnover)?;

        let body_low = open.min(close);
        let body_high = open.max(close);
        if low > body_low || body_high > high {
            return Err(ValidationError::CandleBounds {
                detail: format!("open={open} high={high} low={low} close={close}"),
            });
        }

        Ok(Self {
            symbol,
            period,
            adjust,
            start,
            open,
            high,
            low,
            close,
            volume,
            turnover,
        })
    }
}

/// One time-and-sales point within a trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntradayTick {
    pub symbol: Symbol,
    pub at: CstDateTime,
    pub price: Decimal,
    pub volume: u64,
}

impl IntradayTick {
    pub fn new(
        symbol: Symbol,
        at: CstDateTime,
        price: Decimal,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        if !in_session(at.time()) {
            return Err(ValidationError::TickOutOfSession { at: at.to_string() });
        }

        Ok(Self {
            symbol,
            at,
            price,
            volume,
        })
    }
}

/// Issuer profile. Every attribute the provider may omit is optional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyInfo {
    pub code: Symbol,
    pub short_name: Option<String>,
    pub org_name: Option<String>,
    #[serde(with = "crate::domain::timestamp::iso_date::option")]
    pub listing_date: Option<Date>,
    pub security_type: Option<String>,
    pub industry: Option<String>,
    pub reg_capital: Option<String>,
    pub province: Option<String>,
    pub address: Option<String>,
    pub profile: Option<String>,
}

/// Quote analog for an index identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub code: IndexCode,
    pub name: String,
    pub last: Decimal,
    pub prev_close: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub change: Decimal,
    pub change_pct: Decimal,
    pub volume: u64,
    pub turnover: Decimal,
    pub as_of: CstDateTime,
}

impl IndexSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: IndexCode,
        name: impl Into<String>,
        last: Decimal,
        prev_close: Decimal,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        change: Decimal,
        change_pct: Decimal,
        volume: u64,
        turnover: Decimal,
        as_of: CstDateTime,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("last", last)?;
        validate_non_negative("prev_close", prev_close)?;
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("turnover", turnover)?;

        Ok(Self {
            code,
            name: name.into(),
            last,
            prev_close,
            open,
            high,
            low,
            change,
            change_pct,
            volume,
            turnover,
            as_of,
        })
    }
}

/// Exchange-wide statistics for one trading day. Each exchange publishes a
/// different subset; an absent statistic means the venue does not report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub exchange: Exchange,
    #[serde(with = "crate::domain::timestamp::iso_date")]
    pub trade_date: Date,
    pub listed_companies: Option<u64>,
    pub total_market_cap: Option<Decimal>,
    pub float_market_cap: Option<Decimal>,
    pub turnover: Option<Decimal>,
    pub avg_pe: Option<Decimal>,
    pub total_shares: Option<Decimal>,
    pub float_shares: Option<Decimal>,
    pub advancing: Option<u64>,
    pub declining: Option<u64>,
}

impl MarketSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exchange: Exchange,
        trade_date: Date,
        listed_companies: Option<u64>,
        total_market_cap: Option<Decimal>,
        float_market_cap: Option<Decimal>,
        turnover: Option<Decimal>,
        avg_pe: Option<Decimal>,
        total_shares: Option<Decimal>,
        float_shares: Option<Decimal>,
        advancing: Option<u64>,
        declining: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_optional_non_negative("total_market_cap", total_market_cap)?;
        validate_optional_non_negative("float_market_cap", float_market_cap)?;
        validate_optional_non_negative("turnover", turnover)?;
        validate_optional_non_negative("avg_pe", avg_pe)?;
        validate_optional_non_negative("total_shares", total_shares)?;
        validate_optional_non_negative("float_shares", float_shares)?;

        Ok(Self {
            exchange,
            trade_date,
            listed_companies,
            total_market_cap,
            float_market_cap,
            turnover,
            avg_pe,
            total_shares,
            float_shares,
            advancing,
            declining,
        })
    }
}

/// Closed set of news feeds this system can pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Stock,
    Market,
    Cls,
    Breakfast,
    Global,
    Sina,
    Futu,
    Ths,
}

impl NewsCategory {
    pub const ALL: [Self; 8] = [
        Self::Stock,
        Self::Market,
        Self::Cls,
        Self::Breakfast,
        Self::Global,
        Self::Sina,
        Self::Futu,
        Self::Ths,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Market => "market",
            Self::Cls => "cls",
            Self::Breakfast => "breakfast",
            Self::Global => "global",
            Self::Sina => "sina",
            Self::Futu => "futu",
            Self::Ths => "ths",
        }
    }
}

impl Display for NewsCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stock" => Ok(Self::Stock),
            "market" => Ok(Self::Market),
            "cls" => Ok(Self::Cls),
            "breakfast" => Ok(Self::Breakfast),
            "global" => Ok(Self::Global),
            "sina" => Ok(Self::Sina),
            "futu" => Ok(Self::Futu),
            "ths" => Ok(Self::Ths),
            other => Err(ValidationError::UnknownNewsCategory {
                value: other.to_owned(),
            }),
        }
    }
}

/// One news entry from one feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub category: NewsCategory,
    pub title: String,
    pub summary: Option<String>,
    pub source: String,
    pub published: CstDateTime,
    pub url: Option<String>,
}

fn validate_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativePrice { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}
