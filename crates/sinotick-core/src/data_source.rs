use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::{SourceError, ValidationError};
use crate::{
    Adjust, Candle, CompanyInfo, ExchangeSelector, IndexCode, IndexSummary, IntradayTick,
    MarketSummary, MinutePeriod, NewsCategory, NewsItem, Period, ProviderId, Quote, Symbol,
};

/// Data endpoint type used for routing and error tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Spot,
    History,
    Minute,
    Intraday,
    Info,
    Index,
    MarketSummary,
    News,
}

impl DataKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::History => "history",
            Self::Minute => "minute",
            Self::Intraday => "intraday",
            Self::Info => "info",
            Self::Index => "index",
            Self::MarketSummary => "market_summary",
            Self::News => "news",
        }
    }
}

impl Display for DataKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boxed future returned by source adapters.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Request payload for real-time quote endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotRequest {
    pub symbol: Symbol,
}

impl SpotRequest {
    pub const fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }
}

/// Request payload for daily/weekly/monthly candle endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub start: Date,
    pub end: Date,
    pub period: Period,
    pub adjust: Adjust,
}

impl HistoryRequest {
    pub fn new(
        symbol: Symbol,
        start: Date,
        end: Date,
        period: Period,
        adjust: Adjust,
    ) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            symbol,
            start,
            end,
            period,
            adjust,
        })
    }
}

/// Request payload for intraday minute-candle endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteRequest {
    pub symbol: Symbol,
    pub period: MinutePeriod,
}

impl MinuteRequest {
    pub const fn new(symbol: Symbol, period: MinutePeriod) -> Self {
        Self { symbol, period }
    }
}

/// Request payload for tick-by-tick trade detail endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntradayRequest {
    pub symbol: Symbol,
}

impl IntradayRequest {
    pub const fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }
}

/// Request payload for company profile endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRequest {
    pub symbol: Symbol,
}

impl InfoRequest {
    pub const fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }
}

/// Request payload for index quote endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRequest {
    pub code: IndexCode,
}

impl IndexRequest {
    pub const fn new(code: IndexCode) -> Self {
        Self { code }
    }
}

/// Request payload for exchange-wide market statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSummaryRequest {
    pub exchange: ExchangeSelector,
    /// Trade date to query; `None` means the latest published snapshot.
    pub date: Option<Date>,
}

impl MarketSummaryRequest {
    pub const fn new(exchange: ExchangeSelector, date: Option<Date>) -> Self {
        Self { exchange, date }
    }
}

/// Request payload for news feed endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRequest {
    pub category: NewsCategory,
    /// Item cap; `None` defers to the category default.
    pub limit: Option<u32>,
    /// Required for [`NewsCategory::Stock`], ignored elsewhere.
    pub symbol: Option<Symbol>,
}

impl NewsRequest {
    pub fn new(
        category: NewsCategory,
        limit: Option<u32>,
        symbol: Option<Symbol>,
    ) -> Result<Self, ValidationError> {
        if limit == Some(0) {
            return Err(ValidationError::NonPositiveLimit);
        }
        if category == NewsCategory::Stock && symbol.is_none() {
            return Err(ValidationError::MissingSymbol {
                context: "stock news",
            });
        }
        Ok(Self {
            category,
            limit,
            symbol,
        })
    }
}

/// Real-time quote adapter contract.
pub trait QuoteSource: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn fetch_quote<'a>(&'a self, request: &'a SpotRequest) -> SourceFuture<'a, Quote>;
}

/// Historical candle adapter contract.
pub trait HistorySource: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn fetch_history<'a>(&'a self, request: &'a HistoryRequest) -> SourceFuture<'a, Vec<Candle>>;
}

/// Minute candle adapter contract.
pub trait MinuteSource: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn fetch_minute<'a>(&'a self, request: &'a MinuteRequest) -> SourceFuture<'a, Vec<Candle>>;
}

/// Tick detail adapter contract.
pub trait IntradaySource: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn fetch_intraday<'a>(
        &'a self,
        request: &'a IntradayRequest,
    ) -> SourceFuture<'a, Vec<IntradayTick>>;
}

/// Company profile adapter contract.
pub trait InfoSource: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn fetch_info<'a>(&'a self, request: &'a InfoRequest) -> SourceFuture<'a, CompanyInfo>;
}

/// Index quote adapter contract.
pub trait IndexSource: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn fetch_index<'a>(&'a self, request: &'a IndexRequest) -> SourceFuture<'a, IndexSummary>;
}

/// Exchange statistics adapter contract.
///
/// Summaries come straight from the venue, so the provider depends on the
/// exchange asked for.
pub trait MarketSummarySource: Send + Sync {
    fn provider(&self, request: &MarketSummaryRequest) -> ProviderId;
    fn fetch_market_summary<'a>(
        &'a self,
        request: &'a MarketSummaryRequest,
    ) -> SourceFuture<'a, MarketSummary>;
}

/// News feed adapter contract.
///
/// Every feed has its own default and hard cap; requested limits above the
/// cap are clamped, never rejected.
pub trait NewsSource: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn category(&self) -> NewsCategory;
    fn default_limit(&self) -> u32;
    fn max_limit(&self) -> u32;
    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>>;
}
