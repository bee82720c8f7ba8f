//! Contract every upstream adapter must honor: stable provider attribution,
//! documented feed bounds and a uniform failure surface when nothing is
//! reachable.

use std::fmt::Debug;
use std::sync::Arc;

use time::macros::date;

use sinotick_core::{
    Adjust, BreakfastNewsAdapter, ClsNewsAdapter, EastMoneyAdapter, ExchangeSelector,
    ExchangeSummaryAdapter, FutuNewsAdapter, GlobalNewsAdapter, HistoryRequest, HistorySource,
    IndexCode, IndexRequest, IndexSource, InfoRequest, InfoSource, IntradayRequest,
    IntradaySource, MarketNewsAdapter, MarketSummaryRequest, MarketSummarySource, MinutePeriod,
    MinuteRequest, MinuteSource, NewsCategory, NewsRequest, NewsSource, NoopHttpClient, Period,
    ProviderId, ProviderPolicy, QuoteSource, SinaNewsAdapter, SourceError, SpotRequest,
    StockNewsAdapter, Symbol, TencentAdapter, ThsNewsAdapter, Transport, TransportFailure,
};

fn offline_transport() -> Arc<Transport> {
    let policies = ProviderId::ALL
        .iter()
        .map(|provider| ProviderPolicy::unthrottled(*provider))
        .collect();
    Arc::new(Transport::with_policies(Arc::new(NoopHttpClient), policies))
}

fn symbol() -> Symbol {
    Symbol::parse("600000").expect("contract symbol")
}

/// Without wiring, every fetch must exhaust its retry budget and name the
/// provider that failed.
fn expect_offline_failure<T: Debug>(result: Result<T, SourceError>, provider: ProviderId) {
    match result {
        Err(SourceError::Transport(err)) => {
            assert_eq!(err.provider, provider, "failure must name its provider");
            assert_eq!(err.attempts, 4, "provider '{provider}': retry budget");
            assert_eq!(err.last, TransportFailure::Connect);
        }
        other => panic!("provider '{provider}': expected a transport failure, got {other:?}"),
    }
}

#[tokio::test]
async fn tencent_adapter_attributes_every_kind_it_serves() {
    let adapter = TencentAdapter::new(offline_transport());

    assert_eq!(QuoteSource::provider(&adapter), ProviderId::Tencent);
    assert_eq!(HistorySource::provider(&adapter), ProviderId::Tencent);
    assert_eq!(IndexSource::provider(&adapter), ProviderId::Tencent);

    expect_offline_failure(
        adapter.fetch_quote(&SpotRequest::new(symbol())).await,
        ProviderId::Tencent,
    );

    let history = HistoryRequest::new(
        symbol(),
        date!(2025 - 01 - 01),
        date!(2025 - 01 - 31),
        Period::Day,
        Adjust::None,
    )
    .expect("contract range");
    expect_offline_failure(adapter.fetch_history(&history).await, ProviderId::Tencent);

    let index = IndexRequest::new(IndexCode::parse("000001").expect("contract code"));
    expect_offline_failure(adapter.fetch_index(&index).await, ProviderId::Tencent);
}

#[tokio::test]
async fn eastmoney_adapter_attributes_every_kind_it_serves() {
    let adapter = EastMoneyAdapter::new(offline_transport());

    assert_eq!(MinuteSource::provider(&adapter), ProviderId::EastMoney);
    assert_eq!(IntradaySource::provider(&adapter), ProviderId::EastMoney);
    assert_eq!(InfoSource::provider(&adapter), ProviderId::EastMoney);

    expect_offline_failure(
        adapter
            .fetch_minute(&MinuteRequest::new(symbol(), MinutePeriod::M5))
            .await,
        ProviderId::EastMoney,
    );
    expect_offline_failure(
        adapter.fetch_intraday(&IntradayRequest::new(symbol())).await,
        ProviderId::EastMoney,
    );
    expect_offline_failure(
        adapter.fetch_info(&InfoRequest::new(symbol())).await,
        ProviderId::EastMoney,
    );
}

#[tokio::test]
async fn market_summary_provider_follows_the_requested_venue() {
    let adapter = ExchangeSummaryAdapter::new(offline_transport());
    let sse = MarketSummaryRequest::new(ExchangeSelector::Sse, None);
    let szse = MarketSummaryRequest::new(ExchangeSelector::Szse, None);

    assert_eq!(adapter.provider(&sse), ProviderId::Sse);
    assert_eq!(adapter.provider(&szse), ProviderId::Szse);

    expect_offline_failure(adapter.fetch_market_summary(&sse).await, ProviderId::Sse);
    expect_offline_failure(adapter.fetch_market_summary(&szse).await, ProviderId::Szse);
}

struct FeedCase {
    adapter: Arc<dyn NewsSource>,
    category: NewsCategory,
    provider: ProviderId,
    max_limit: u32,
}

#[tokio::test]
async fn every_news_feed_declares_its_bounds_and_owner() {
    let transport = offline_transport();
    let cases = [
        FeedCase {
            adapter: Arc::new(StockNewsAdapter::new(transport.clone())),
            category: NewsCategory::Stock,
            provider: ProviderId::EastMoney,
            max_limit: 100,
        },
        FeedCase {
            adapter: Arc::new(MarketNewsAdapter::new(transport.clone())),
            category: NewsCategory::Market,
            provider: ProviderId::EastMoney,
            max_limit: 100,
        },
        FeedCase {
            adapter: Arc::new(ClsNewsAdapter::new(transport.clone())),
            category: NewsCategory::Cls,
            provider: ProviderId::Cls,
            max_limit: 20,
        },
        FeedCase {
            adapter: Arc::new(BreakfastNewsAdapter::new(transport.clone())),
            category: NewsCategory::Breakfast,
            provider: ProviderId::EastMoney,
            max_limit: 50,
        },
        FeedCase {
            adapter: Arc::new(GlobalNewsAdapter::new(transport.clone())),
            category: NewsCategory::Global,
            provider: ProviderId::EastMoney,
            max_limit: 100,
        },
        FeedCase {
            adapter: Arc::new(SinaNewsAdapter::new(transport.clone())),
            category: NewsCategory::Sina,
            provider: ProviderId::Sina,
            max_limit: 100,
        },
        FeedCase {
            adapter: Arc::new(FutuNewsAdapter::new(transport.clone())),
            category: NewsCategory::Futu,
            provider: ProviderId::Futu,
            max_limit: 50,
        },
        FeedCase {
            adapter: Arc::new(ThsNewsAdapter::new(transport.clone())),
            category: NewsCategory::Ths,
            provider: ProviderId::Ths,
            max_limit: 100,
        },
    ];

    for case in cases {
        let feed = case.category;
        assert_eq!(case.adapter.category(), feed, "feed '{feed}': category");
        assert_eq!(
            case.adapter.provider(),
            case.provider,
            "feed '{feed}': provider"
        );
        assert_eq!(case.adapter.default_limit(), 10, "feed '{feed}': default");
        assert_eq!(
            case.adapter.max_limit(),
            case.max_limit,
            "feed '{feed}': max"
        );

        let request =
            NewsRequest::new(feed, Some(3), Some(symbol())).expect("contract request");
        expect_offline_failure(case.adapter.fetch_news(&request).await, case.provider);
    }
}
