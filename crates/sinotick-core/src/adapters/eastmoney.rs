use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Time};

use crate::data_source::{
    InfoRequest, InfoSource, IntradayRequest, IntradaySource, MinuteRequest, MinuteSource,
    SourceFuture,
};
use crate::domain::DASHED_DATE;
use crate::error::SourceError;
use crate::http_client::HttpRequest;
use crate::normalize::{
    candle_series, non_empty, parse_decimal, parse_volume, tick_series, truncate_chars,
};
use crate::transport::Transport;
use crate::{
    Adjust, Candle, CandlePeriod, CompanyInfo, CstDateTime, IntradayTick, MinutePeriod,
    NormalizationError, ProviderId, Symbol,
};

const SURVEY_URL: &str = "https://emweb.securities.eastmoney.com/PC_HSF10/CompanySurvey/PageAjax";
const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const DETAILS_URL: &str = "https://push2.eastmoney.com/api/qt/stock/details/get";

const KLINE_TOKEN: &str = "7eea3edcaed734bea9cbfc24409ed989";
const DETAILS_TOKEN: &str = "fa5fd1943c7b386f172d6893dbfba10b";

const SURVEY_TIMEOUT_MS: u64 = 15_000;
const PUSH_TIMEOUT_MS: u64 = 10_000;

const PROFILE_MAX_CHARS: usize = 500;

const HOUR_MINUTE: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const HOUR_MINUTE_SECOND: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// EastMoney adapter: F10 company surveys plus the push2 kline and
/// tick-detail feeds.
#[derive(Clone)]
pub struct EastMoneyAdapter {
    transport: Arc<Transport>,
}

impl EastMoneyAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    async fn fetch_json<T>(&self, request: HttpRequest) -> Result<T, SourceError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .transport
            .execute(ProviderId::EastMoney, request)
            .await?;
        let payload = serde_json::from_str(&response.body).map_err(|err| {
            NormalizationError::MalformedPayload {
                detail: err.to_string(),
            }
        })?;
        Ok(payload)
    }
}

impl InfoSource for EastMoneyAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::EastMoney
    }

    fn fetch_info<'a>(&'a self, request: &'a InfoRequest) -> SourceFuture<'a, CompanyInfo> {
        Box::pin(async move {
            // The F10 endpoint wants SH600000, not sh600000.
            let code = request.symbol.prefixed().to_ascii_uppercase();
            let http = HttpRequest::get(SURVEY_URL)
                .with_query("code", code)
                .with_timeout_ms(SURVEY_TIMEOUT_MS);
            let payload: CompanySurveyPayload = self.fetch_json(http).await?;
            let info = normalize_info(&payload, &request.symbol)?;
            Ok(info)
        })
    }
}

impl MinuteSource for EastMoneyAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::EastMoney
    }

    fn fetch_minute<'a>(&'a self, request: &'a MinuteRequest) -> SourceFuture<'a, Vec<Candle>> {
        Box::pin(async move {
            let http = HttpRequest::get(KLINE_URL)
                .with_query("secid", request.symbol.secid())
                .with_query("ut", KLINE_TOKEN)
                .with_query("klt", request.period.as_str())
                .with_query("fqt", "0")
                .with_query("beg", "0")
                .with_query("end", "20500000")
                .with_query("fields1", "f1,f2,f3,f4,f5,f6")
                .with_query("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61")
                .with_timeout_ms(PUSH_TIMEOUT_MS);
            let payload: KlinePayload = self.fetch_json(http).await?;
            let candles = normalize_minute(&payload, &request.symbol, request.period)?;
            Ok(candles)
        })
    }
}

impl IntradaySource for EastMoneyAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::EastMoney
    }

    fn fetch_intraday<'a>(
        &'a self,
        request: &'a IntradayRequest,
    ) -> SourceFuture<'a, Vec<IntradayTick>> {
        Box::pin(async move {
            let http = HttpRequest::get(DETAILS_URL)
                .with_query("secid", request.symbol.secid())
                .with_query("ut", DETAILS_TOKEN)
                .with_query("pos", "-0")
                .with_query("fields1", "f1,f2,f3,f4")
                .with_query("fields2", "f51,f52,f53,f54,f55")
                .with_timeout_ms(PUSH_TIMEOUT_MS);
            let payload: DetailsPayload = self.fetch_json(http).await?;
            // The feed carries clock times only; anchor them to today.
            let session_date = CstDateTime::now().date();
            let ticks = normalize_intraday(&payload, &request.symbol, session_date)?;
            Ok(ticks)
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompanySurveyPayload {
    #[serde(default)]
    jbzl: Vec<CompanySurveyRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(default)]
struct CompanySurveyRow {
    security_name_abbr: Option<String>,
    org_name: Option<String>,
    listing_date: Option<String>,
    security_type: Option<String>,
    em2016: Option<String>,
    /// Registered capital arrives as a bare number on some listings.
    reg_capital: Option<Value>,
    province: Option<String>,
    address: Option<String>,
    org_profile: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsPayload {
    data: Option<DetailsData>,
}

#[derive(Debug, Deserialize)]
struct DetailsData {
    #[serde(default)]
    details: Vec<String>,
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(Some(text)),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn normalize_info(
    payload: &CompanySurveyPayload,
    symbol: &Symbol,
) -> Result<CompanyInfo, NormalizationError> {
    let row = payload
        .jbzl
        .first()
        .ok_or(NormalizationError::EmptyPayload {
            context: "company survey",
        })?;

    // "1999-11-10 00:00:00"; only the date part is meaningful.
    let listing_date = match non_empty(row.listing_date.as_deref()) {
        Some(text) => {
            let date = text
                .get(..10)
                .and_then(|day| Date::parse(day, DASHED_DATE).ok())
                .ok_or_else(|| NormalizationError::InvalidTimestamp {
                    field: "LISTING_DATE",
                    value: text.clone(),
                })?;
            Some(date)
        }
        None => None,
    };

    Ok(CompanyInfo {
        code: symbol.clone(),
        short_name: non_empty(row.security_name_abbr.as_deref()),
        org_name: non_empty(row.org_name.as_deref()),
        listing_date,
        security_type: non_empty(row.security_type.as_deref()),
        industry: non_empty(row.em2016.as_deref()),
        reg_capital: row.reg_capital.as_ref().and_then(text_of),
        province: non_empty(row.province.as_deref()),
        address: non_empty(row.address.as_deref()),
        profile: non_empty(row.org_profile.as_deref())
            .map(|text| truncate_chars(&text, PROFILE_MAX_CHARS).to_owned()),
    })
}

/// Kline rows are `date time,open,close,high,low,volume,turnover,...`.
fn normalize_minute(
    payload: &KlinePayload,
    symbol: &Symbol,
    period: MinutePeriod,
) -> Result<Vec<Candle>, NormalizationError> {
    let data = payload.data.as_ref().ok_or(NormalizationError::EmptyPayload {
        context: "minute klines",
    })?;

    let mut candles = Vec::with_capacity(data.klines.len());
    for row in &data.klines {
        let cells: Vec<&str> = row.split(',').collect();
        if cells.len() < 7 {
            return Err(NormalizationError::MalformedPayload {
                detail: format!("kline row has {} cells: '{row}'", cells.len()),
            });
        }

        let stamp = cells[0];
        let (day, clock) = stamp
            .split_once(' ')
            .ok_or_else(|| NormalizationError::InvalidTimestamp {
                field: "kline[0]",
                value: stamp.to_owned(),
            })?;
        let date = Date::parse(day, DASHED_DATE).map_err(|_| {
            NormalizationError::InvalidTimestamp {
                field: "kline[0]",
                value: stamp.to_owned(),
            }
        })?;
        let time = Time::parse(clock, HOUR_MINUTE).map_err(|_| {
            NormalizationError::InvalidTimestamp {
                field: "kline[0]",
                value: stamp.to_owned(),
            }
        })?;

        let open = parse_decimal("kline[1]", cells[1])?;
        let close = parse_decimal("kline[2]", cells[2])?;
        let high = parse_decimal("kline[3]", cells[3])?;
        let low = parse_decimal("kline[4]", cells[4])?;
        let volume = parse_volume("kline[5]", cells[5])?;
        let turnover = parse_decimal("kline[6]", cells[6])?;

        candles.push(Candle::new(
            symbol.clone(),
            CandlePeriod::Minute(period),
            Adjust::None,
            CstDateTime::from_parts(date, time),
            open,
            high,
            low,
            close,
            volume,
            Some(turnover),
        )?);
    }

    Ok(candle_series(candles))
}

/// Detail rows are `time,price,volume,...` with clock times only.
fn normalize_intraday(
    payload: &DetailsPayload,
    symbol: &Symbol,
    session_date: Date,
) -> Result<Vec<IntradayTick>, NormalizationError> {
    let data = payload.data.as_ref().ok_or(NormalizationError::EmptyPayload {
        context: "intraday details",
    })?;

    let mut ticks = Vec::with_capacity(data.details.len());
    for row in &data.details {
        let cells: Vec<&str> = row.split(',').collect();
        if cells.len() < 3 {
            return Err(NormalizationError::MalformedPayload {
                detail: format!("detail row has {} cells: '{row}'", cells.len()),
            });
        }

        let time = Time::parse(cells[0], HOUR_MINUTE_SECOND).map_err(|_| {
            NormalizationError::InvalidTimestamp {
                field: "detail[0]",
                value: cells[0].to_owned(),
            }
        })?;
        let price = parse_decimal("detail[1]", cells[1])?;
        let volume = parse_volume("detail[2]", cells[2])?;

        ticks.push(IntradayTick::new(
            symbol.clone(),
            CstDateTime::from_parts(session_date, time),
            price,
            volume,
        )?);
    }

    tick_series(ticks)
}
