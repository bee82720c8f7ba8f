use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::data_source::{NewsRequest, NewsSource, SourceFuture};
use crate::error::SourceError;
use crate::http_client::HttpRequest;
use crate::normalize::{news_series, non_empty, truncate_chars};
use crate::transport::Transport;
use crate::{CstDateTime, NewsCategory, NewsItem, NormalizationError, ProviderId, Symbol};

const SEARCH_URL: &str = "https://search-api-web.eastmoney.com/search/jsonp";
const BREAKFAST_URL: &str = "https://np-listapi.eastmoney.com/comm/web/getListInfo";
const CLS_URL: &str = "https://www.cls.cn/nodeapi/updateTelegraphList";
const SINA_URL: &str = "https://zhibo.sina.com.cn/api/zhibo/feed";
const FUTU_URL: &str = "https://news.futunn.com/news-site-api/main/live-list";
const THS_URL: &str = "https://news.10jqka.com.cn/tapp/news/push/stock/";

const MARKET_CHANNEL: &str = "102";
const GLOBAL_CHANNEL: &str = "103";

const NEWS_TIMEOUT_MS: u64 = 10_000;

const DEFAULT_LIMIT: u32 = 10;
const LIVE_FEED_MAX: u32 = 100;
const SEARCH_MAX: u32 = 100;
const BREAKFAST_MAX: u32 = 50;
const CLS_MAX: u32 = 20;
const SINA_MAX: u32 = 100;
const FUTU_MAX: u32 = 50;
const THS_MAX: u32 = 100;

/// Fallback headline length when a feed carries body text only.
const EXCERPT_MAX_CHARS: usize = 80;
/// Cap on article summaries, which would otherwise carry whole articles.
const SUMMARY_MAX_CHARS: usize = 200;

const STAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const AJAX_PRELUDE: &str = "var ajaxResult=";

/// EastMoney 7x24 feed, channel 102 (domestic market wire).
#[derive(Clone)]
pub struct MarketNewsAdapter {
    transport: Arc<Transport>,
}

impl MarketNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for MarketNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::EastMoney
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Market
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        LIVE_FEED_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, LIVE_FEED_MAX);
            fetch_live_feed(&self.transport, NewsCategory::Market, MARKET_CHANNEL, limit).await
        })
    }
}

/// EastMoney 7x24 feed, channel 103 (global wire).
#[derive(Clone)]
pub struct GlobalNewsAdapter {
    transport: Arc<Transport>,
}

impl GlobalNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for GlobalNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::EastMoney
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Global
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        LIVE_FEED_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, LIVE_FEED_MAX);
            fetch_live_feed(&self.transport, NewsCategory::Global, GLOBAL_CHANNEL, limit).await
        })
    }
}

/// Per-symbol article search over EastMoney's cms archive.
#[derive(Clone)]
pub struct StockNewsAdapter {
    transport: Arc<Transport>,
}

impl StockNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for StockNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::EastMoney
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Stock
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        SEARCH_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, SEARCH_MAX);
            let keyword = request.symbol.as_ref().map(Symbol::code).unwrap_or_default();
            // Empty preTag/postTag so hits come back without <em> markers.
            let param = serde_json::json!({
                "uid": "",
                "keyword": keyword,
                "type": ["cmsArticleWebOld"],
                "client": "web",
                "clientType": "web",
                "clientVersion": "curr",
                "param": {
                    "cmsArticleWebOld": {
                        "searchScope": "default",
                        "sort": "default",
                        "pageIndex": 1,
                        "pageSize": limit,
                        "preTag": "",
                        "postTag": ""
                    }
                }
            });

            let http = HttpRequest::get(SEARCH_URL)
                .with_query("cb", "jsonp")
                .with_query("param", param.to_string())
                .with_timeout_ms(NEWS_TIMEOUT_MS);
            let response = self.transport.execute(ProviderId::EastMoney, http).await?;
            let payload: SearchEnvelope = parse_payload(strip_jsonp(&response.body)?)?;
            Ok(news_series(normalize_stock_search(&payload), limit as usize))
        })
    }
}

/// EastMoney's morning-briefing column.
#[derive(Clone)]
pub struct BreakfastNewsAdapter {
    transport: Arc<Transport>,
}

impl BreakfastNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for BreakfastNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::EastMoney
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Breakfast
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        BREAKFAST_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, BREAKFAST_MAX);
            let http = HttpRequest::get(BREAKFAST_URL)
                .with_query("client", "web")
                .with_query("biz", "web_cjzc")
                .with_query("pageSize", limit.to_string())
                .with_query("pageIndex", "1")
                .with_query("cb", "jsonp")
                .with_timeout_ms(NEWS_TIMEOUT_MS);
            let response = self.transport.execute(ProviderId::EastMoney, http).await?;
            let payload: BreakfastEnvelope = parse_payload(strip_jsonp(&response.body)?)?;
            Ok(news_series(normalize_breakfast(&payload), limit as usize))
        })
    }
}

/// CLS telegraph roll.
#[derive(Clone)]
pub struct ClsNewsAdapter {
    transport: Arc<Transport>,
}

impl ClsNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for ClsNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Cls
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Cls
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        CLS_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, CLS_MAX);
            let http = HttpRequest::get(CLS_URL).with_timeout_ms(NEWS_TIMEOUT_MS);
            let response = self.transport.execute(ProviderId::Cls, http).await?;
            let payload: ClsEnvelope = parse_payload(&response.body)?;
            Ok(news_series(normalize_cls(&payload), limit as usize))
        })
    }
}

/// Sina 7x24 live feed.
#[derive(Clone)]
pub struct SinaNewsAdapter {
    transport: Arc<Transport>,
}

impl SinaNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for SinaNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Sina
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Sina
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        SINA_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, SINA_MAX);
            let http = HttpRequest::get(SINA_URL)
                .with_query("page", "1")
                .with_query("page_size", limit.to_string())
                .with_query("zhibo_id", "152")
                .with_timeout_ms(NEWS_TIMEOUT_MS);
            let response = self.transport.execute(ProviderId::Sina, http).await?;
            let payload: SinaEnvelope = parse_payload(&response.body)?;
            Ok(news_series(normalize_sina(&payload), limit as usize))
        })
    }
}

/// Futu live wire.
#[derive(Clone)]
pub struct FutuNewsAdapter {
    transport: Arc<Transport>,
}

impl FutuNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for FutuNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Futu
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Futu
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        FUTU_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, FUTU_MAX);
            let http = HttpRequest::get(FUTU_URL).with_timeout_ms(NEWS_TIMEOUT_MS);
            let response = self.transport.execute(ProviderId::Futu, http).await?;
            let payload: FutuEnvelope = parse_payload(&response.body)?;
            Ok(news_series(normalize_futu(&payload), limit as usize))
        })
    }
}

/// 10jqka (THS) stock news push.
#[derive(Clone)]
pub struct ThsNewsAdapter {
    transport: Arc<Transport>,
}

impl ThsNewsAdapter {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

impl NewsSource for ThsNewsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Ths
    }

    fn category(&self) -> NewsCategory {
        NewsCategory::Ths
    }

    fn default_limit(&self) -> u32 {
        DEFAULT_LIMIT
    }

    fn max_limit(&self) -> u32 {
        THS_MAX
    }

    fn fetch_news<'a>(&'a self, request: &'a NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let limit = effective_limit(request, DEFAULT_LIMIT, THS_MAX);
            let http = HttpRequest::get(THS_URL)
                .with_query("page", "1")
                .with_query("pagesize", limit.to_string())
                .with_timeout_ms(NEWS_TIMEOUT_MS);
            let response = self.transport.execute(ProviderId::Ths, http).await?;
            let payload: ThsEnvelope = parse_payload(&response.body)?;
            Ok(news_series(normalize_ths(&payload), limit as usize))
        })
    }
}

async fn fetch_live_feed(
    transport: &Transport,
    category: NewsCategory,
    channel: &str,
    limit: u32,
) -> Result<Vec<NewsItem>, SourceError> {
    let http = HttpRequest::get(live_feed_url(channel, limit)).with_timeout_ms(NEWS_TIMEOUT_MS);
    let response = transport.execute(ProviderId::EastMoney, http).await?;
    let payload: LiveFeedPayload = parse_payload(strip_ajax_prelude(&response.body)?)?;
    Ok(news_series(
        normalize_live_feed(&payload, category),
        limit as usize,
    ))
}

/// The kuaixun endpoint takes its page size in the path, not the query.
fn live_feed_url(channel: &str, limit: u32) -> String {
    format!("https://newsapi.eastmoney.com/kuaixun/v1/getlist_{channel}_ajaxResult_{limit}_1_.html")
}

fn effective_limit(request: &NewsRequest, default: u32, max: u32) -> u32 {
    request.limit.unwrap_or(default).min(max)
}

fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<T, NormalizationError> {
    serde_json::from_str(body).map_err(|err| NormalizationError::MalformedPayload {
        detail: err.to_string(),
    })
}

fn strip_ajax_prelude(body: &str) -> Result<&str, NormalizationError> {
    body.trim()
        .strip_prefix(AJAX_PRELUDE)
        .map(|rest| rest.trim_end_matches(';').trim())
        .ok_or_else(|| NormalizationError::MalformedPayload {
            detail: String::from("response lacks the ajaxResult prelude"),
        })
}

fn strip_jsonp(body: &str) -> Result<&str, NormalizationError> {
    let body = body.trim();
    if let (Some(start), Some(end)) = (body.find('('), body.rfind(')')) {
        if start < end {
            return Ok(&body[start + 1..end]);
        }
    }
    Err(NormalizationError::MalformedPayload {
        detail: String::from("response is not a jsonp callback"),
    })
}

/// `YYYY-MM-DD HH:MM:SS` wall-clock stamps, already exchange-local.
fn parse_stamp(raw: &str) -> Option<CstDateTime> {
    let parsed = PrimitiveDateTime::parse(raw.trim(), STAMP).ok()?;
    Some(CstDateTime::from_parts(parsed.date(), parsed.time()))
}

/// Epoch seconds, quoted by some feeds and bare on others.
fn unix_seconds(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn excerpt(text: &str) -> String {
    truncate_chars(text, EXCERPT_MAX_CHARS).to_owned()
}

/// Headline, falling back to a body excerpt for wire items that have none.
fn title_or_excerpt(title: Option<&str>, body: Option<&str>) -> Option<String> {
    non_empty(title).or_else(|| non_empty(body).map(|text| excerpt(&text)))
}

#[derive(Debug, Deserialize)]
struct LiveFeedPayload {
    #[serde(rename = "LivesList")]
    #[serde(default)]
    lives_list: Vec<LiveFeedRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LiveFeedRow {
    title: Option<String>,
    digest: Option<String>,
    url_w: Option<String>,
    showtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "cmsArticleWebOld")]
    #[serde(default)]
    articles: Vec<SearchArticleRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchArticleRow {
    title: Option<String>,
    content: Option<String>,
    date: Option<String>,
    #[serde(rename = "mediaName")]
    media_name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BreakfastEnvelope {
    data: Option<BreakfastData>,
}

#[derive(Debug, Deserialize)]
struct BreakfastData {
    #[serde(default)]
    list: Vec<BreakfastRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BreakfastRow {
    #[serde(rename = "Art_Title")]
    title: Option<String>,
    #[serde(rename = "Art_Summary")]
    summary: Option<String>,
    #[serde(rename = "Art_ShowTime")]
    show_time: Option<String>,
    #[serde(rename = "Art_UniqueUrl")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClsEnvelope {
    data: Option<ClsData>,
}

#[derive(Debug, Deserialize)]
struct ClsData {
    #[serde(default)]
    roll_data: Vec<ClsRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClsRow {
    title: Option<String>,
    content: Option<String>,
    ctime: Option<Value>,
    shareurl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SinaEnvelope {
    result: Option<SinaResult>,
}

#[derive(Debug, Deserialize)]
struct SinaResult {
    data: Option<SinaData>,
}

#[derive(Debug, Deserialize)]
struct SinaData {
    feed: Option<SinaFeed>,
}

#[derive(Debug, Deserialize)]
struct SinaFeed {
    #[serde(default)]
    list: Vec<SinaRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SinaRow {
    rich_text: Option<String>,
    create_time: Option<String>,
    docurl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FutuEnvelope {
    data: Option<FutuData>,
}

#[derive(Debug, Deserialize)]
struct FutuData {
    #[serde(default)]
    news: Vec<FutuRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FutuRow {
    title: Option<String>,
    content: Option<String>,
    time: Option<Value>,
    #[serde(rename = "detailUrl")]
    detail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThsEnvelope {
    data: Option<ThsData>,
}

#[derive(Debug, Deserialize)]
struct ThsData {
    #[serde(default)]
    list: Vec<ThsRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThsRow {
    title: Option<String>,
    digest: Option<String>,
    ctime: Option<Value>,
    url: Option<String>,
}

// Feed rows are best-effort: anything without a usable headline or stamp is
// dropped rather than failing the whole pull.

fn normalize_live_feed(payload: &LiveFeedPayload, category: NewsCategory) -> Vec<NewsItem> {
    payload
        .lives_list
        .iter()
        .filter_map(|row| {
            let title = title_or_excerpt(row.title.as_deref(), row.digest.as_deref())?;
            let published = parse_stamp(row.showtime.as_deref()?)?;
            Some(NewsItem {
                category,
                title,
                summary: non_empty(row.digest.as_deref()),
                source: ProviderId::EastMoney.as_str().to_owned(),
                published,
                url: non_empty(row.url_w.as_deref()),
            })
        })
        .collect()
}

fn normalize_stock_search(payload: &SearchEnvelope) -> Vec<NewsItem> {
    let articles = payload
        .result
        .as_ref()
        .map(|result| result.articles.as_slice())
        .unwrap_or(&[]);

    articles
        .iter()
        .filter_map(|row| {
            let title = title_or_excerpt(row.title.as_deref(), row.content.as_deref())?;
            let published = parse_stamp(row.date.as_deref()?)?;
            Some(NewsItem {
                category: NewsCategory::Stock,
                title,
                summary: non_empty(row.content.as_deref())
                    .map(|text| truncate_chars(&text, SUMMARY_MAX_CHARS).to_owned()),
                source: non_empty(row.media_name.as_deref())
                    .unwrap_or_else(|| ProviderId::EastMoney.as_str().to_owned()),
                published,
                url: non_empty(row.url.as_deref()),
            })
        })
        .collect()
}

fn normalize_breakfast(payload: &BreakfastEnvelope) -> Vec<NewsItem> {
    let rows = payload
        .data
        .as_ref()
        .map(|data| data.list.as_slice())
        .unwrap_or(&[]);

    rows.iter()
        .filter_map(|row| {
            let title = title_or_excerpt(row.title.as_deref(), row.summary.as_deref())?;
            let published = parse_stamp(row.show_time.as_deref()?)?;
            Some(NewsItem {
                category: NewsCategory::Breakfast,
                title,
                summary: non_empty(row.summary.as_deref()),
                source: ProviderId::EastMoney.as_str().to_owned(),
                published,
                url: non_empty(row.url.as_deref()),
            })
        })
        .collect()
}

fn normalize_cls(payload: &ClsEnvelope) -> Vec<NewsItem> {
    let rows = payload
        .data
        .as_ref()
        .map(|data| data.roll_data.as_slice())
        .unwrap_or(&[]);

    rows.iter()
        .filter_map(|row| {
            let title = title_or_excerpt(row.title.as_deref(), row.content.as_deref())?;
            let published = CstDateTime::from_unix(unix_seconds(row.ctime.as_ref())?)?;
            Some(NewsItem {
                category: NewsCategory::Cls,
                title,
                summary: non_empty(row.content.as_deref()),
                source: ProviderId::Cls.as_str().to_owned(),
                published,
                url: non_empty(row.shareurl.as_deref()),
            })
        })
        .collect()
}

fn normalize_sina(payload: &SinaEnvelope) -> Vec<NewsItem> {
    let rows = payload
        .result
        .as_ref()
        .and_then(|result| result.data.as_ref())
        .and_then(|data| data.feed.as_ref())
        .map(|feed| feed.list.as_slice())
        .unwrap_or(&[]);

    rows.iter()
        .filter_map(|row| {
            // The feed has no separate headline; the text leads with one.
            let text = non_empty(row.rich_text.as_deref())?;
            let published = parse_stamp(row.create_time.as_deref()?)?;
            Some(NewsItem {
                category: NewsCategory::Sina,
                title: excerpt(&text),
                summary: Some(text),
                source: ProviderId::Sina.as_str().to_owned(),
                published,
                url: non_empty(row.docurl.as_deref()),
            })
        })
        .collect()
}

fn normalize_futu(payload: &FutuEnvelope) -> Vec<NewsItem> {
    let rows = payload
        .data
        .as_ref()
        .map(|data| data.news.as_slice())
        .unwrap_or(&[]);

    rows.iter()
        .filter_map(|row| {
            let title = title_or_excerpt(row.title.as_deref(), row.content.as_deref())?;
            let published = CstDateTime::from_unix(unix_seconds(row.time.as_ref())?)?;
            Some(NewsItem {
                category: NewsCategory::Futu,
                title,
                summary: non_empty(row.content.as_deref()),
                source: ProviderId::Futu.as_str().to_owned(),
                published,
                url: non_empty(row.detail_url.as_deref()),
            })
        })
        .collect()
}

fn normalize_ths(payload: &ThsEnvelope) -> Vec<NewsItem> {
    let rows = payload
        .data
        .as_ref()
        .map(|data| data.list.as_slice())
        .unwrap_or(&[]);

    rows.iter()
        .filter_map(|row| {
            let title = title_or_excerpt(row.title.as_deref(), row.digest.as_deref())?;
            let published = CstDateTime::from_unix(unix_seconds(row.ctime.as_ref())?)?;
            Some(NewsItem {
                category: NewsCategory::Ths,
                title,
                summary: non_empty(row.digest.as_deref()),
                source: ProviderId::Ths.as_str().to_owned(),
                published,
                url: non_empty(row.url.as_deref()),
            })
        })
        .collect()
}
