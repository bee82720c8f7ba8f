//! String-parameter entry points, one per data kind.
//!
//! Each function adapts plain text parameters into the validated request
//! types and delegates to the [`Router`]; no fetching or normalization
//! logic lives here. Dates are compact `YYYYMMDD`, matching the CLI flags.

use crate::data_source::{
    DataKind, HistoryRequest, IndexRequest, InfoRequest, IntradayRequest, MarketSummaryRequest,
    MinuteRequest, NewsRequest, SpotRequest,
};
use crate::error::{RouterError, ValidationError};
use crate::router::Router;
use crate::{
    parse_compact_date, Candle, CompanyInfo, ExchangeSelector, IndexCode, IndexSummary,
    IntradayTick, MarketSummary, NewsItem, Quote, Symbol,
};

pub async fn spot(router: &Router, symbol: &str) -> Result<Quote, RouterError> {
    let request = Symbol::parse(symbol)
        .map(SpotRequest::new)
        .map_err(|err| invalid(DataKind::Spot, format!("symbol={symbol}"), err))?;
    router.spot(&request).await
}

pub async fn history(
    router: &Router,
    symbol: &str,
    start: &str,
    end: &str,
    period: &str,
    adjust: &str,
) -> Result<Vec<Candle>, RouterError> {
    let request = history_request(symbol, start, end, period, adjust).map_err(|err| {
        invalid(
            DataKind::History,
            format!("symbol={symbol} start={start} end={end} period={period} adjust={adjust}"),
            err,
        )
    })?;
    router.history(&request).await
}

pub async fn minute(
    router: &Router,
    symbol: &str,
    period: &str,
) -> Result<Vec<Candle>, RouterError> {
    let request = minute_request(symbol, period).map_err(|err| {
        invalid(
            DataKind::Minute,
            format!("symbol={symbol} period={period}"),
            err,
        )
    })?;
    router.minute(&request).await
}

pub async fn intraday(router: &Router, symbol: &str) -> Result<Vec<IntradayTick>, RouterError> {
    let request = Symbol::parse(symbol)
        .map(IntradayRequest::new)
        .map_err(|err| invalid(DataKind::Intraday, format!("symbol={symbol}"), err))?;
    router.intraday(&request).await
}

pub async fn info(router: &Router, symbol: &str) -> Result<CompanyInfo, RouterError> {
    let request = Symbol::parse(symbol)
        .map(InfoRequest::new)
        .map_err(|err| invalid(DataKind::Info, format!("symbol={symbol}"), err))?;
    router.info(&request).await
}

pub async fn index(router: &Router, code: &str) -> Result<IndexSummary, RouterError> {
    let request = IndexCode::parse(code)
        .map(IndexRequest::new)
        .map_err(|err| invalid(DataKind::Index, format!("code={code}"), err))?;
    router.index(&request).await
}

pub async fn market_summary(
    router: &Router,
    exchange: &str,
    date: Option<&str>,
) -> Result<MarketSummary, RouterError> {
    let request = summary_request(exchange, date).map_err(|err| {
        invalid(
            DataKind::MarketSummary,
            format!("exchange={exchange} date={}", date.unwrap_or("latest")),
            err,
        )
    })?;
    router.market_summary(&request).await
}

pub async fn news(
    router: &Router,
    category: &str,
    limit: Option<u32>,
    symbol: Option<&str>,
) -> Result<Vec<NewsItem>, RouterError> {
    let request = news_request(category, limit, symbol).map_err(|err| {
        let mut params = format!("category={category}");
        if let Some(symbol) = symbol {
            params.push_str(&format!(" symbol={symbol}"));
        }
        if let Some(limit) = limit {
            params.push_str(&format!(" limit={limit}"));
        }
        invalid(DataKind::News, params, err)
    })?;
    router.news(&request).await
}

fn invalid(kind: DataKind, params: String, err: ValidationError) -> RouterError {
    RouterError::new(kind, params, err)
}

fn history_request(
    symbol: &str,
    start: &str,
    end: &str,
    period: &str,
    adjust: &str,
) -> Result<HistoryRequest, ValidationError> {
    HistoryRequest::new(
        Symbol::parse(symbol)?,
        parse_compact_date(start)?,
        parse_compact_date(end)?,
        period.parse()?,
        adjust.parse()?,
    )
}

fn minute_request(symbol: &str, period: &str) -> Result<MinuteRequest, ValidationError> {
    Ok(MinuteRequest::new(Symbol::parse(symbol)?, period.parse()?))
}

fn summary_request(
    exchange: &str,
    date: Option<&str>,
) -> Result<MarketSummaryRequest, ValidationError> {
    let exchange = ExchangeSelector::parse(exchange)?;
    let date = date.map(parse_compact_date).transpose()?;
    Ok(MarketSummaryRequest::new(exchange, date))
}

fn news_request(
    category: &str,
    limit: Option<u32>,
    symbol: Option<&str>,
) -> Result<NewsRequest, ValidationError> {
    let category = category.parse()?;
    let symbol = symbol.map(Symbol::parse).transpose()?;
    NewsRequest::new(category, limit, symbol)
}
