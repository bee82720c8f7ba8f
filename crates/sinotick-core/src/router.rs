use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::adapters::{
    BreakfastNewsAdapter, ClsNewsAdapter, EastMoneyAdapter, ExchangeSummaryAdapter,
    FutuNewsAdapter, GlobalNewsAdapter, MarketNewsAdapter, SinaNewsAdapter, StockNewsAdapter,
    TencentAdapter, ThsNewsAdapter,
};
use crate::data_source::{
    DataKind, HistoryRequest, HistorySource, IndexRequest, IndexSource, InfoRequest, InfoSource,
    IntradayRequest, IntradaySource, MarketSummaryRequest, MarketSummarySource, MinuteRequest,
    MinuteSource, NewsRequest, NewsSource, QuoteSource, SpotRequest,
};
use crate::error::RouterError;
use crate::transport::Transport;
use crate::{
    Candle, CompanyInfo, IndexSummary, IntradayTick, MarketSummary, NewsCategory, NewsItem, Quote,
};

/// A single routed request, one variant per data kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Spot(SpotRequest),
    History(HistoryRequest),
    Minute(MinuteRequest),
    Intraday(IntradayRequest),
    Info(InfoRequest),
    Index(IndexRequest),
    MarketSummary(MarketSummaryRequest),
    News(NewsRequest),
}

impl Query {
    pub const fn kind(&self) -> DataKind {
        match self {
            Self::Spot(_) => DataKind::Spot,
            Self::History(_) => DataKind::History,
            Self::Minute(_) => DataKind::Minute,
            Self::Intraday(_) => DataKind::Intraday,
            Self::Info(_) => DataKind::Info,
            Self::Index(_) => DataKind::Index,
            Self::MarketSummary(_) => DataKind::MarketSummary,
            Self::News(_) => DataKind::News,
        }
    }

    /// Parameters as `key=value` text, for error tagging and logs.
    pub fn params(&self) -> String {
        match self {
            Self::Spot(request) => spot_params(request),
            Self::History(request) => history_params(request),
            Self::Minute(request) => minute_params(request),
            Self::Intraday(request) => intraday_params(request),
            Self::Info(request) => info_params(request),
            Self::Index(request) => index_params(request),
            Self::MarketSummary(request) => summary_params(request),
            Self::News(request) => news_params(request),
        }
    }
}

/// Canonical result payload, mirroring [`Query`].
///
/// Serializes untagged: a quote renders as a quote object, series render as
/// arrays, so envelopes stay free of routing artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Records {
    Quote(Quote),
    Candles(Vec<Candle>),
    Ticks(Vec<IntradayTick>),
    Info(CompanyInfo),
    Index(IndexSummary),
    MarketSummary(MarketSummary),
    News(Vec<NewsItem>),
}

/// News adapters keyed by category.
#[derive(Clone)]
pub struct NewsSources {
    pub stock: Arc<dyn NewsSource>,
    pub market: Arc<dyn NewsSource>,
    pub cls: Arc<dyn NewsSource>,
    pub breakfast: Arc<dyn NewsSource>,
    pub global: Arc<dyn NewsSource>,
    pub sina: Arc<dyn NewsSource>,
    pub futu: Arc<dyn NewsSource>,
    pub ths: Arc<dyn NewsSource>,
}

impl NewsSources {
    /// The same source behind every category; for offline drivers.
    pub fn uniform(source: Arc<dyn NewsSource>) -> Self {
        Self {
            stock: source.clone(),
            market: source.clone(),
            cls: source.clone(),
            breakfast: source.clone(),
            global: source.clone(),
            sina: source.clone(),
            futu: source.clone(),
            ths: source,
        }
    }

    pub fn for_category(&self, category: NewsCategory) -> &Arc<dyn NewsSource> {
        match category {
            NewsCategory::Stock => &self.stock,
            NewsCategory::Market => &self.market,
            NewsCategory::Cls => &self.cls,
            NewsCategory::Breakfast => &self.breakfast,
            NewsCategory::Global => &self.global,
            NewsCategory::Sina => &self.sina,
            NewsCategory::Futu => &self.futu,
            NewsCategory::Ths => &self.ths,
        }
    }
}

/// Stateless dispatch from data kind to its fixed source adapter.
///
/// Every failure comes back as a [`RouterError`] tagged with the kind and
/// the request parameters, with the adapter's own error as the cause chain.
#[derive(Clone)]
pub struct Router {
    spot: Arc<dyn QuoteSource>,
    history: Arc<dyn HistorySource>,
    minute: Arc<dyn MinuteSource>,
    intraday: Arc<dyn IntradaySource>,
    info: Arc<dyn InfoSource>,
    index: Arc<dyn IndexSource>,
    market_summary: Arc<dyn MarketSummarySource>,
    news: NewsSources,
}

impl Router {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spot: Arc<dyn QuoteSource>,
        history: Arc<dyn HistorySource>,
        minute: Arc<dyn MinuteSource>,
        intraday: Arc<dyn IntradaySource>,
        info: Arc<dyn InfoSource>,
        index: Arc<dyn IndexSource>,
        market_summary: Arc<dyn MarketSummarySource>,
        news: NewsSources,
    ) -> Self {
        Self {
            spot,
            history,
            minute,
            intraday,
            info,
            index,
            market_summary,
            news,
        }
    }

    /// Production wiring: Tencent serves quotes, history and indices;
    /// EastMoney serves company info, minute candles and tick details; the
    /// venues serve their own statistics; one adapter per news feed.
    pub fn with_default_sources(transport: Arc<Transport>) -> Self {
        let tencent = Arc::new(TencentAdapter::new(transport.clone()));
        let eastmoney = Arc::new(EastMoneyAdapter::new(transport.clone()));
        let exchange = Arc::new(ExchangeSummaryAdapter::new(transport.clone()));
        let news = NewsSources {
            stock: Arc::new(StockNewsAdapter::new(transport.clone())),
            market: Arc::new(MarketNewsAdapter::new(transport.clone())),
            cls: Arc::new(ClsNewsAdapter::new(transport.clone())),
            breakfast: Arc::new(BreakfastNewsAdapter::new(transport.clone())),
            global: Arc::new(GlobalNewsAdapter::new(transport.clone())),
            sina: Arc::new(SinaNewsAdapter::new(transport.clone())),
            futu: Arc::new(FutuNewsAdapter::new(transport.clone())),
            ths: Arc::new(ThsNewsAdapter::new(transport)),
        };

        Self::new(
            tencent.clone(),
            tencent.clone(),
            eastmoney.clone(),
            eastmoney.clone(),
            eastmoney,
            tencent,
            exchange,
            news,
        )
    }

    pub async fn fetch(&self, query: Query) -> Result<Records, RouterError> {
        match query {
            Query::Spot(request) => self.spot(&request).await.map(Records::Quote),
            Query::History(request) => self.history(&request).await.map(Records::Candles),
            Query::Minute(request) => self.minute(&request).await.map(Records::Candles),
            Query::Intraday(request) => self.intraday(&request).await.map(Records::Ticks),
            Query::Info(request) => self.info(&request).await.map(Records::Info),
            Query::Index(request) => self.index(&request).await.map(Records::Index),
            Query::MarketSummary(request) => self
                .market_summary(&request)
                .await
                .map(Records::MarketSummary),
            Query::News(request) => self.news(&request).await.map(Records::News),
        }
    }

    pub async fn spot(&self, request: &SpotRequest) -> Result<Quote, RouterError> {
        debug!(
            provider = %self.spot.provider(),
            symbol = %request.symbol,
            "routing spot quote"
        );
        self.spot
            .fetch_quote(request)
            .await
            .map_err(|err| RouterError::new(DataKind::Spot, spot_params(request), err))
    }

    pub async fn history(&self, request: &HistoryRequest) -> Result<Vec<Candle>, RouterError> {
        debug!(
            provider = %self.history.provider(),
            symbol = %request.symbol,
            start = %request.start,
            end = %request.end,
            "routing candle history"
        );
        self.history
            .fetch_history(request)
            .await
            .map_err(|err| RouterError::new(DataKind::History, history_params(request), err))
    }

    pub async fn minute(&self, request: &MinuteRequest) -> Result<Vec<Candle>, RouterError> {
        debug!(
            provider = %self.minute.provider(),
            symbol = %request.symbol,
            period = request.period.as_str(),
            "routing minute candles"
        );
        self.minute
            .fetch_minute(request)
            .await
            .map_err(|err| RouterError::new(DataKind::Minute, minute_params(request), err))
    }

    pub async fn intraday(
        &self,
        request: &IntradayRequest,
    ) -> Result<Vec<IntradayTick>, RouterError> {
        debug!(
            provider = %self.intraday.provider(),
            symbol = %request.symbol,
            "routing intraday ticks"
        );
        self.intraday
            .fetch_intraday(request)
            .await
            .map_err(|err| RouterError::new(DataKind::Intraday, intraday_params(request), err))
    }

    pub async fn info(&self, request: &InfoRequest) -> Result<CompanyInfo, RouterError> {
        debug!(
            provider = %self.info.provider(),
            symbol = %request.symbol,
            "routing company info"
        );
        self.info
            .fetch_info(request)
            .await
            .map_err(|err| RouterError::new(DataKind::Info, info_params(request), err))
    }

    pub async fn index(&self, request: &IndexRequest) -> Result<IndexSummary, RouterError> {
        debug!(
            provider = %self.index.provider(),
            code = %request.code,
            "routing index snapshot"
        );
        self.index
            .fetch_index(request)
            .await
            .map_err(|err| RouterError::new(DataKind::Index, index_params(request), err))
    }

    pub async fn market_summary(
        &self,
        request: &MarketSummaryRequest,
    ) -> Result<MarketSummary, RouterError> {
        debug!(
            provider = %self.market_summary.provider(request),
            exchange = %request.exchange,
            "routing market summary"
        );
        self.market_summary
            .fetch_market_summary(request)
            .await
            .map_err(|err| RouterError::new(DataKind::MarketSummary, summary_params(request), err))
    }

    pub async fn news(&self, request: &NewsRequest) -> Result<Vec<NewsItem>, RouterError> {
        let source = self.news.for_category(request.category);
        debug!(
            provider = %source.provider(),
            category = %request.category,
            "routing news feed"
        );
        source
            .fetch_news(request)
            .await
            .map_err(|err| RouterError::new(DataKind::News, news_params(request), err))
    }
}

fn spot_params(request: &SpotRequest) -> String {
    format!("symbol={}", request.symbol)
}

fn history_params(request: &HistoryRequest) -> String {
    format!(
        "symbol={} start={} end={} period={} adjust={}",
        request.symbol,
        request.start,
        request.end,
        request.period.as_str(),
        request.adjust.as_str()
    )
}

fn minute_params(request: &MinuteRequest) -> String {
    format!(
        "symbol={} period={}",
        request.symbol,
        request.period.as_str()
    )
}

fn intraday_params(request: &IntradayRequest) -> String {
    format!("symbol={}", request.symbol)
}

fn info_params(request: &InfoRequest) -> String {
    format!("symbol={}", request.symbol)
}

fn index_params(request: &IndexRequest) -> String {
    format!("code={}", request.code)
}

fn summary_params(request: &MarketSummaryRequest) -> String {
    match request.date {
        Some(date) => format!("exchange={} date={date}", request.exchange),
        None => format!("exchange={} date=latest", request.exchange),
    }
}

fn news_params(request: &NewsRequest) -> String {
    let mut params = format!("category={}", request.category);
    if let Some(symbol) = &request.symbol {
        params.push_str(&format!(" symbol={symbol}"));
    }
    if let Some(limit) = request.limit {
        params.push_str(&format!(" limit={limit}"));
    }
    params
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::data_source::SourceFuture;
    use crate::error::{FetchFailure, TransportFailure};
    use crate::http_client::NoopHttpClient;
    use crate::{Adjust, IndexCode, Period, ProviderId, ProviderPolicy, Symbol};

    use super::*;

    fn offline_router() -> Router {
        let policies = ProviderId::ALL
            .iter()
            .map(|provider| ProviderPolicy::unthrottled(*provider))
            .collect();
        let transport = Arc::new(Transport::with_policies(
            Arc::new(NoopHttpClient),
            policies,
        ));
        Router::with_default_sources(transport)
    }

    #[tokio::test]
    async fn failures_carry_the_kind_and_parameters() {
        let router = offline_router();
        let request = SpotRequest::new(Symbol::parse("600000").expect("symbol"));

        let err = router.spot(&request).await.expect_err("offline must fail");

        assert_eq!(err.kind, DataKind::Spot);
        assert_eq!(err.params, "symbol=600000");
        match err.cause {
            FetchFailure::Transport(transport) => {
                assert_eq!(transport.provider, ProviderId::Tencent);
                assert_eq!(transport.attempts, 4);
                assert_eq!(transport.last, TransportFailure::Connect);
            }
            other => panic!("expected a transport failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_dispatches_news_to_the_category_adapter() {
        let router = offline_router();
        let request =
            NewsRequest::new(NewsCategory::Cls, None, None).expect("request");

        let err = router
            .fetch(Query::News(request))
            .await
            .expect_err("offline must fail");

        assert_eq!(err.kind, DataKind::News);
        assert_eq!(err.params, "category=cls");
        match err.cause {
            FetchFailure::Transport(transport) => {
                assert_eq!(transport.provider, ProviderId::Cls);
            }
            other => panic!("expected a transport failure, got {other:?}"),
        }
    }

    #[test]
    fn query_params_render_human_readable() {
        let symbol = Symbol::parse("600000").expect("symbol");
        let history = Query::History(
            HistoryRequest::new(
                symbol.clone(),
                date!(2025 - 01 - 01),
                date!(2025 - 01 - 31),
                Period::Week,
                Adjust::Backward,
            )
            .expect("request"),
        );
        assert_eq!(history.kind(), DataKind::History);
        assert_eq!(
            history.params(),
            "symbol=600000 start=2025-01-01 end=2025-01-31 period=week adjust=hfq"
        );

        let index = Query::Index(IndexRequest::new(IndexCode::parse("000001").expect("code")));
        assert_eq!(index.params(), "code=000001");

        let news = Query::News(
            NewsRequest::new(NewsCategory::Stock, Some(5), Some(symbol)).expect("request"),
        );
        assert_eq!(news.params(), "category=stock symbol=600000 limit=5");
    }

    #[test]
    fn uniform_news_sources_answer_every_category() {
        struct NullNews;

        impl NewsSource for NullNews {
            fn provider(&self) -> ProviderId {
                ProviderId::Cls
            }

            fn category(&self) -> NewsCategory {
                NewsCategory::Cls
            }

            fn default_limit(&self) -> u32 {
                10
            }

            fn max_limit(&self) -> u32 {
                20
            }

            fn fetch_news<'a>(
                &'a self,
                _request: &'a NewsRequest,
            ) -> SourceFuture<'a, Vec<NewsItem>> {
                Box::pin(async { Ok(Vec::new()) })
            }
        }

        let sources = NewsSources::uniform(Arc::new(NullNews));
        for category in NewsCategory::ALL {
            assert_eq!(sources.for_category(category).provider(), ProviderId::Cls);
        }
    }
}
