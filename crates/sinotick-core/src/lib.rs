//! Core contracts for sinotick.
//!
//! This crate contains:
//! - Canonical A-share domain models and validation
//! - Provider identifiers with per-provider pacing and retry policy
//! - Camouflaged HTTP transport with throttling
//! - Source traits, upstream adapters and payload normalizers
//! - Kind-based routing and the string-parameter facade

pub mod adapters;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod facade;
pub mod headers;
pub mod http_client;
pub mod normalize;
pub mod provider_policy;
pub mod retry;
pub mod router;
pub mod source;
pub mod throttling;
pub mod transport;

pub use adapters::{
    BreakfastNewsAdapter, ClsNewsAdapter, EastMoneyAdapter, ExchangeSummaryAdapter,
    FutuNewsAdapter, GlobalNewsAdapter, MarketNewsAdapter, SinaNewsAdapter, StockNewsAdapter,
    TencentAdapter, ThsNewsAdapter,
};
pub use data_source::{
    DataKind, HistoryRequest, HistorySource, IndexRequest, IndexSource, InfoRequest, InfoSource,
    IntradayRequest, IntradaySource, MarketSummaryRequest, MarketSummarySource, MinuteRequest,
    MinuteSource, NewsRequest, NewsSource, QuoteSource, SourceFuture, SpotRequest,
};
pub use domain::{
    in_session, iso_date, parse_compact_date, Adjust, Candle, CandlePeriod, CompanyInfo,
    CstDateTime, Exchange, ExchangeSelector, IndexCode, IndexSummary, IntradayTick, MarketSummary,
    MinutePeriod, NewsCategory, NewsItem, Period, Quote, Symbol, CST, SESSION_CLOSE, SESSION_LAST,
    SESSION_OPEN,
};
pub use error::{
    FetchFailure, NormalizationError, RouterError, SourceError, TransportError, TransportFailure,
    ValidationError,
};
pub use facade::{history, index, info, intraday, market_summary, minute, news, spot};
pub use headers::{camouflage_headers, pick_user_agent};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, NoopHttpClient, ProxyConfig,
    ReqwestHttpClient,
};
pub use normalize::{
    candle_series, news_series, non_empty, parse_decimal, parse_volume, tick_series,
    truncate_chars,
};
pub use provider_policy::ProviderPolicy;
pub use retry::{is_transient, Backoff, JitterRange, RetryPolicy, RetryState};
pub use router::{NewsSources, Query, Records, Router};
pub use source::ProviderId;
pub use throttling::ProviderGate;
pub use transport::Transport;
