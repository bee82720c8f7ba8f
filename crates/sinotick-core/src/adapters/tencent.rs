use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::Date;

use crate::data_source::{
    HistoryRequest, HistorySource, IndexRequest, IndexSource, QuoteSource, SourceFuture,
    SpotRequest,
};
use crate::domain::{format_dashed_date, DASHED_DATE};
use crate::error::SourceError;
use crate::http_client::HttpRequest;
use crate::normalize::{candle_series, parse_decimal, parse_volume};
use crate::transport::Transport;
use crate::{
    Adjust, Candle, CandlePeriod, CstDateTime, IndexCode, IndexSummary, NormalizationError,
    Period, ProviderId, Quote, Symbol,
};

const KLINE_URL: &str = "https://web.ifzq.gtimg.cn/appstock/app/fqkline/get";

const QUOTE_TIMEOUT_MS: u64 = 10_000;
const HISTORY_TIMEOUT_MS: u64 = 15_000;

/// Rows requested beyond the range so holidays and suspensions inside the
/// window never starve it.
const COUNT_PADDING: i64 = 100;

/// Tencent kline adapter: realtime quotes, historical candles, and index
/// snapshots all ride the same `fqkline/get` payload family.
#[derive(Clone)]
pub struct TencentAdapter {
    transport: Arc<Transport>,
}

impl TencentAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    async fn fetch_envelope(&self, request: HttpRequest) -> Result<KlineEnvelope, SourceError> {
        let response = self.transport.execute(ProviderId::Tencent, request).await?;
        let envelope = serde_json::from_str(&response.body).map_err(|err| {
            NormalizationError::MalformedPayload {
                detail: err.to_string(),
            }
        })?;
        Ok(envelope)
    }
}

impl QuoteSource for TencentAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Tencent
    }

    fn fetch_quote<'a>(&'a self, request: &'a SpotRequest) -> SourceFuture<'a, Quote> {
        Box::pin(async move {
            let http = kline_request(
                &request.symbol.prefixed(),
                Period::Day,
                None,
                1,
                Adjust::None,
                QUOTE_TIMEOUT_MS,
            );
            let envelope = self.fetch_envelope(http).await?;
            let quote = normalize_quote(&envelope, &request.symbol, CstDateTime::now())?;
            Ok(quote)
        })
    }
}

impl HistorySource for TencentAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Tencent
    }

    fn fetch_history<'a>(&'a self, request: &'a HistoryRequest) -> SourceFuture<'a, Vec<Candle>> {
        Box::pin(async move {
            let http = kline_request(
                &request.symbol.prefixed(),
                request.period,
                Some(request.end),
                bar_count(request),
                request.adjust,
                HISTORY_TIMEOUT_MS,
            );
            let envelope = self.fetch_envelope(http).await?;
            let candles = normalize_history(&envelope, request)?;
            Ok(candles)
        })
    }
}

impl IndexSource for TencentAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Tencent
    }

    fn fetch_index<'a>(&'a self, request: &'a IndexRequest) -> SourceFuture<'a, IndexSummary> {
        Box::pin(async move {
            let http = kline_request(
                &request.code.prefixed(),
                Period::Day,
                None,
                1,
                Adjust::None,
                QUOTE_TIMEOUT_MS,
            );
            let envelope = self.fetch_envelope(http).await?;
            let summary = normalize_index(&envelope, &request.code, CstDateTime::now())?;
            Ok(summary)
        })
    }
}

/// `param={instrument},{period},{start},{end},{count},{adjust}`; start is
/// always left empty and the range is enforced during normalization.
fn kline_request(
    instrument: &str,
    period: Period,
    end: Option<Date>,
    count: i64,
    adjust: Adjust,
    timeout_ms: u64,
) -> HttpRequest {
    let end = end.map(format_dashed_date).unwrap_or_default();
    let param = format!(
        "{instrument},{},,{end},{count},{}",
        period.as_str(),
        adjust.tencent_param()
    );

    HttpRequest::get(KLINE_URL)
        .with_query("param", param)
        .with_timeout_ms(timeout_ms)
}

fn bar_count(request: &HistoryRequest) -> i64 {
    let days = (request.end - request.start).whole_days() + 1;
    days / request.period.approx_days() + COUNT_PADDING
}

#[derive(Debug, Deserialize)]
struct KlineEnvelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: BTreeMap<String, KlineBody>,
}

#[derive(Debug, Deserialize)]
struct KlineBody {
    #[serde(default)]
    qt: BTreeMap<String, Value>,
    /// Series arrays keyed `day`/`week`/`month`, or `qfqday` etc. when
    /// adjusted, plus metadata entries this adapter ignores.
    #[serde(flatten)]
    series: BTreeMap<String, Value>,
}

fn kline_body<'a>(
    envelope: &'a KlineEnvelope,
    key: &str,
) -> Result<&'a KlineBody, NormalizationError> {
    if envelope.code != 0 {
        return Err(NormalizationError::MalformedPayload {
            detail: format!("upstream code {}: {}", envelope.code, envelope.msg),
        });
    }
    envelope
        .data
        .get(key)
        .ok_or_else(|| NormalizationError::MalformedPayload {
            detail: format!("payload has no entry for {key}"),
        })
}

fn qt_fields<'a>(envelope: &'a KlineEnvelope, key: &str) -> Result<&'a [Value], NormalizationError> {
    let body = kline_body(envelope, key)?;
    let fields = body
        .qt
        .get(key)
        .and_then(Value::as_array)
        .filter(|fields| !fields.is_empty())
        .ok_or(NormalizationError::EmptyPayload {
            context: "realtime quote",
        })?;
    Ok(fields)
}

/// Positional lookup in the qt string array. Numbers occasionally arrive
/// unquoted, so bare JSON numbers are accepted too.
fn text_at(
    fields: &[Value],
    index: usize,
    field: &'static str,
) -> Result<String, NormalizationError> {
    match fields.get(index) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        _ => Err(NormalizationError::MissingField { field }),
    }
}

fn series_rows<'a>(
    body: &'a KlineBody,
    period: Period,
    adjust: Adjust,
) -> Result<&'a [Value], NormalizationError> {
    let adjusted = format!("{}{}", adjust.tencent_param(), period.as_str());
    body.series
        .get(adjusted.as_str())
        .or_else(|| body.series.get(period.as_str()))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(NormalizationError::MissingField { field: "series" })
}

fn normalize_quote(
    envelope: &KlineEnvelope,
    symbol: &Symbol,
    as_of: CstDateTime,
) -> Result<Quote, NormalizationError> {
    let fields = qt_fields(envelope, &symbol.prefixed())?;

    let name = text_at(fields, 1, "qt[1]")?;
    let last = parse_decimal("qt[3]", &text_at(fields, 3, "qt[3]")?)?;
    let prev_close = parse_decimal("qt[4]", &text_at(fields, 4, "qt[4]")?)?;
    let open = parse_decimal("qt[5]", &text_at(fields, 5, "qt[5]")?)?;
    let volume = parse_volume("qt[6]", &text_at(fields, 6, "qt[6]")?)?;
    let turnover = parse_decimal("qt[7]", &text_at(fields, 7, "qt[7]")?)?;
    let low = parse_decimal("qt[21]", &text_at(fields, 21, "qt[21]")?)?;
    let high = parse_decimal("qt[22]", &text_at(fields, 22, "qt[22]")?)?;
    let change_pct = parse_decimal("qt[46]", &text_at(fields, 46, "qt[46]")?)?;
    let change = parse_decimal("qt[47]", &text_at(fields, 47, "qt[47]")?)?;

    let quote = Quote::new(
        symbol.clone(),
        name,
        last,
        prev_close,
        open,
        high,
        low,
        change,
        change_pct,
        volume,
        turnover,
        None,
        None,
        as_of,
    )?;
    Ok(quote)
}

fn normalize_index(
    envelope: &KlineEnvelope,
    code: &IndexCode,
    as_of: CstDateTime,
) -> Result<IndexSummary, NormalizationError> {
    let fields = qt_fields(envelope, &code.prefixed())?;

    let name = text_at(fields, 1, "qt[1]")?;
    let last = parse_decimal("qt[3]", &text_at(fields, 3, "qt[3]")?)?;
    let prev_close = parse_decimal("qt[4]", &text_at(fields, 4, "qt[4]")?)?;
    let open = parse_decimal("qt[5]", &text_at(fields, 5, "qt[5]")?)?;
    let volume = parse_volume("qt[6]", &text_at(fields, 6, "qt[6]")?)?;
    let turnover = parse_decimal("qt[7]", &text_at(fields, 7, "qt[7]")?)?;
    let low = parse_decimal("qt[21]", &text_at(fields, 21, "qt[21]")?)?;
    let high = parse_decimal("qt[22]", &text_at(fields, 22, "qt[22]")?)?;
    let change_pct = parse_decimal("qt[46]", &text_at(fields, 46, "qt[46]")?)?;
    let change = parse_decimal("qt[47]", &text_at(fields, 47, "qt[47]")?)?;

    let summary = IndexSummary::new(
        code.clone(),
        name,
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
    )?;
    Ok(summary)
}

/// Row layout is `[date, open, close, high, low, volume]`; close comes
/// before high and low.
fn normalize_history(
    envelope: &KlineEnvelope,
    request: &HistoryRequest,
) -> Result<Vec<Candle>, NormalizationError> {
    let body = kline_body(envelope, &request.symbol.prefixed())?;
    let rows = series_rows(body, request.period, request.adjust)?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        // Adjusted series append a non-array factor entry; skip it.
        let Some(cells) = row.as_array() else {
            continue;
        };

        let date_text = text_at(cells, 0, "row[0]")?;
        let date =
            Date::parse(&date_text, DASHED_DATE).map_err(|_| NormalizationError::InvalidTimestamp {
                field: "row[0]",
                value: date_text.clone(),
            })?;
        if date < request.start || date > request.end {
            continue;
        }

        let open = parse_decimal("row[1]", &text_at(cells, 1, "row[1]")?)?;
        let close = parse_decimal("row[2]", &text_at(cells, 2, "row[2]")?)?;
        let high = parse_decimal("row[3]", &text_at(cells, 3, "row[3]")?)?;
        let low = parse_decimal("row[4]", &text_at(cells, 4, "row[4]")?)?;
        let volume = parse_volume("row[5]", &text_at(cells, 5, "row[5]")?)?;

        candles.push(Candle::new(
            request.symbol.clone(),
            CandlePeriod::Calendar(request.period),
            request.adjust,
            CstDateTime::session_close(date),
            open,
            high,
            low,
            close,
            volume,
            None,
        )?);
    }

    Ok(candle_series(candles))
}
