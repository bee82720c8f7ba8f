use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::data_source::{MarketSummaryRequest, MarketSummarySource, SourceFuture};
use crate::domain::{format_dashed_date, parse_compact_date};
use crate::error::SourceError;
use crate::http_client::HttpRequest;
use crate::normalize::{non_empty, parse_decimal, parse_volume};
use crate::transport::Transport;
use crate::{
    CstDateTime, Exchange, ExchangeSelector, MarketSummary, NormalizationError, ProviderId,
};

const SSE_URL: &str = "https://query.sse.com.cn/commonQuery.do";
const SSE_SQL_ID: &str = "COMMON_SSE_SJ_GPSJ_GPSJZM_TJSJ_L";
const SSE_REFERER: &str = "https://www.sse.com.cn/";

const SZSE_URL: &str = "https://www.szse.cn/api/report/ShowReport/data";
const SZSE_CATALOG: &str = "1803_sczm";

const SUMMARY_TIMEOUT_MS: u64 = 10_000;

/// Venue statistics adapter. Each exchange publishes its own daily overview
/// endpoint, so requests dispatch on the selector.
#[derive(Clone)]
pub struct ExchangeSummaryAdapter {
    transport: Arc<Transport>,
}

impl ExchangeSummaryAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    async fn fetch_sse(&self, request: &MarketSummaryRequest) -> Result<MarketSummary, SourceError> {
        let mut http = HttpRequest::get(SSE_URL)
            .with_query("sqlId", SSE_SQL_ID)
            .with_query("PRODUCT_NAME", "股票,主板,科创板")
            .with_query("type", "inParams")
            .with_header("referer", SSE_REFERER)
            .with_timeout_ms(SUMMARY_TIMEOUT_MS);
        if let Some(date) = request.date {
            http = http.with_query("TRADE_DATE", format_dashed_date(date));
        }

        let response = self.transport.execute(ProviderId::Sse, http).await?;
        let payload: SseSummaryPayload =
            serde_json::from_str(&response.body).map_err(|err| {
                NormalizationError::MalformedPayload {
                    detail: err.to_string(),
                }
            })?;
        Ok(normalize_sse(&payload)?)
    }

    async fn fetch_szse(
        &self,
        request: &MarketSummaryRequest,
    ) -> Result<MarketSummary, SourceError> {
        let mut http = HttpRequest::get(SZSE_URL)
            .with_query("SHOWTYPE", "JSON")
            .with_query("CATALOGID", SZSE_CATALOG)
            .with_query("TABKEY", "tab1")
            .with_timeout_ms(SUMMARY_TIMEOUT_MS);
        if let Some(date) = request.date {
            http = http.with_query("txtQueryDate", format_dashed_date(date));
        }

        let response = self.transport.execute(ProviderId::Szse, http).await?;
        let tabs: Vec<SzseReportTab> = serde_json::from_str(&response.body).map_err(|err| {
            NormalizationError::MalformedPayload {
                detail: err.to_string(),
            }
        })?;
        // The report itself carries no trade date.
        let trade_date = request.date.unwrap_or_else(|| CstDateTime::now().date());
        Ok(normalize_szse(&tabs, trade_date)?)
    }
}

impl MarketSummarySource for ExchangeSummaryAdapter {
    fn provider(&self, request: &MarketSummaryRequest) -> ProviderId {
        match request.exchange {
            ExchangeSelector::Sse => ProviderId::Sse,
            ExchangeSelector::Szse => ProviderId::Szse,
        }
    }

    fn fetch_market_summary<'a>(
        &'a self,
        request: &'a MarketSummaryRequest,
    ) -> SourceFuture<'a, MarketSummary> {
        Box::pin(async move {
            match request.exchange {
                ExchangeSelector::Sse => self.fetch_sse(request).await,
                ExchangeSelector::Szse => self.fetch_szse(request).await,
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct SseSummaryPayload {
    #[serde(default)]
    result: Vec<SseSummaryRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(default)]
struct SseSummaryRow {
    product_name: Option<String>,
    list_num: Option<String>,
    total_value: Option<String>,
    nego_value: Option<String>,
    avg_pe_ratio: Option<String>,
    total_shares: Option<String>,
    nego_shares: Option<String>,
    trade_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SzseReportTab {
    #[serde(default)]
    data: Vec<SzseSummaryRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SzseSummaryRow {
    #[serde(rename = "证券类别")]
    category: Option<String>,
    #[serde(rename = "数量")]
    count: Option<String>,
    #[serde(rename = "成交金额")]
    turnover: Option<String>,
    #[serde(rename = "总市值")]
    total_market_cap: Option<String>,
    #[serde(rename = "流通市值")]
    float_market_cap: Option<String>,
}

fn opt_decimal(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<Decimal>, NormalizationError> {
    non_empty(raw)
        .map(|text| parse_decimal(field, &text))
        .transpose()
}

fn opt_count(field: &'static str, raw: Option<&str>) -> Result<Option<u64>, NormalizationError> {
    non_empty(raw)
        .map(|text| parse_volume(field, &text))
        .transpose()
}

/// The query also returns main-board and STAR-board slices; the `股票` row
/// is the whole-venue aggregate.
fn normalize_sse(payload: &SseSummaryPayload) -> Result<MarketSummary, NormalizationError> {
    let row = payload
        .result
        .iter()
        .find(|row| row.product_name.as_deref() == Some("股票"))
        .or_else(|| payload.result.first())
        .ok_or(NormalizationError::EmptyPayload {
            context: "sse market overview",
        })?;

    let trade_text =
        non_empty(row.trade_date.as_deref()).ok_or(NormalizationError::MissingField {
            field: "TRADE_DATE",
        })?;
    let trade_date = parse_compact_date(&trade_text).map_err(|_| {
        NormalizationError::InvalidTimestamp {
            field: "TRADE_DATE",
            value: trade_text.clone(),
        }
    })?;

    let summary = MarketSummary::new(
        Exchange::Sse,
        trade_date,
        opt_count("LIST_NUM", row.list_num.as_deref())?,
        opt_decimal("TOTAL_VALUE", row.total_value.as_deref())?,
        opt_decimal("NEGO_VALUE", row.nego_value.as_deref())?,
        None,
        opt_decimal("AVG_PE_RATIO", row.avg_pe_ratio.as_deref())?,
        opt_decimal("TOTAL_SHARES", row.total_shares.as_deref())?,
        opt_decimal("NEGO_SHARES", row.nego_shares.as_deref())?,
        None,
        None,
    )?;
    Ok(summary)
}

fn normalize_szse(
    tabs: &[SzseReportTab],
    trade_date: Date,
) -> Result<MarketSummary, NormalizationError> {
    let rows = tabs.first().map(|tab| tab.data.as_slice()).unwrap_or(&[]);
    if rows.is_empty() {
        return Err(NormalizationError::EmptyPayload {
            context: "szse market overview",
        });
    }

    let row = rows
        .iter()
        .find(|row| row.category.as_deref() == Some("股票"))
        .ok_or_else(|| NormalizationError::MalformedPayload {
            detail: String::from("report has no aggregate stock row"),
        })?;

    let summary = MarketSummary::new(
        Exchange::Szse,
        trade_date,
        opt_count("数量", row.count.as_deref())?,
        opt_decimal("总市值", row.total_market_cap.as_deref())?,
        opt_decimal("流通市值", row.float_market_cap.as_deref())?,
        opt_decimal("成交金额", row.turnover.as_deref())?,
        None,
        None,
        None,
        None,
        None,
    )?;
    Ok(summary)
}
