//! Canonical entities produced by the normalizers.
//!
//! Everything here is an immutable value record: constructed once per
//! request, validated at construction, serializable, and carrying no
//! reference back to the adapter that produced it.

mod models;
mod period;
mod symbol;
mod timestamp;

pub use models::{
    Candle, CompanyInfo, IndexSummary, IntradayTick, MarketSummary, NewsCategory, NewsItem, Quote,
};
pub use period::{Adjust, CandlePeriod, MinutePeriod, Period};
pub use symbol::{Exchange, ExchangeSelector, IndexCode, Symbol};
pub use timestamp::{
    in_session, iso_date, parse_compact_date, CstDateTime, CST, SESSION_CLOSE, SESSION_LAST,
    SESSION_OPEN,
};

pub(crate) use timestamp::{format_dashed_date, DASHED_DATE};
