//! Routing behavior over a scripted transport: kind dispatch, validation
//! short-circuits and the uniform error surface.

use serde_json::{json, Value};
use sinotick_core::{
    facade, DataKind, Exchange, FetchFailure, HttpError, ProviderId, Query, Records, SpotRequest,
    Symbol, TransportFailure, ValidationError,
};
use sinotick_tests::{offline_router, ScriptedHttpClient};
use time::macros::date;

fn tencent_quote_body() -> String {
    let mut slots = vec![Value::String(String::new()); 48];
    for (index, text) in [
        (1, "浦发银行"),
        (3, "10.50"),
        (4, "10.60"),
        (5, "10.55"),
        (6, "1234567"),
        (7, "1300123.5"),
        (21, "10.40"),
        (22, "10.70"),
        (46, "-0.94"),
        (47, "-0.10"),
    ] {
        slots[index] = Value::String(text.to_owned());
    }

    json!({
        "code": 0,
        "msg": "",
        "data": { "sh600000": { "qt": { "sh600000": slots }, "day": [] } }
    })
    .to_string()
}

#[tokio::test]
async fn inverted_history_range_fails_before_any_transport_call() {
    let client = ScriptedHttpClient::new(Vec::new());
    let router = offline_router(client.clone());

    let err = facade::history(&router, "600000", "20250103", "20250101", "day", "none")
        .await
        .expect_err("inverted range must be rejected");

    assert_eq!(err.kind, DataKind::History);
    assert_eq!(
        err.params,
        "symbol=600000 start=20250103 end=20250101 period=day adjust=none"
    );
    assert!(matches!(
        err.cause,
        FetchFailure::Validation(ValidationError::InvalidDateRange { .. })
    ));
    assert_eq!(client.calls(), 0, "rejected input must never reach the wire");
}

#[tokio::test]
async fn exhausted_retries_surface_the_provider_and_attempt_count() {
    let client = ScriptedHttpClient::new(vec![Err(HttpError::connect("connection refused")); 4]);
    let router = offline_router(client.clone());

    let err = facade::spot(&router, "600000")
        .await
        .expect_err("a dead upstream must fail");

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
    assert_eq!(client.calls(), 4);
}

#[tokio::test]
async fn spot_queries_dispatch_to_tencent_and_normalize_the_quote() {
    let body = tencent_quote_body();
    let client = ScriptedHttpClient::ok_json(&[body.as_str()]);
    let router = offline_router(client.clone());

    let symbol = Symbol::parse("600000").expect("symbol");
    let records = router
        .fetch(Query::Spot(SpotRequest::new(symbol)))
        .await
        .expect("scripted quote");

    let quote = match records {
        Records::Quote(quote) => quote,
        other => panic!("expected a quote, got {other:?}"),
    };
    assert_eq!(quote.name, "浦发银行");
    assert_eq!(quote.last.to_string(), "10.50");
    assert_eq!(quote.prev_close.to_string(), "10.60");
    assert_eq!(quote.volume, 1_234_567);
    assert_eq!(quote.change.to_string(), "-0.10");

    let sent = client.requests();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].url.contains("ifzq.gtimg.cn"));
    assert_eq!(
        sent[0].query.get("param").map(String::as_str),
        Some("sh600000,day,,,1,")
    );
}

#[tokio::test]
async fn market_summary_routes_to_the_requested_venue() {
    let sse_body = json!({
        "result": [
            {
                "PRODUCT_NAME": "主板",
                "LIST_NUM": "1688",
                "TRADE_DATE": "20250110"
            },
            {
                "PRODUCT_NAME": "股票",
                "LIST_NUM": "2270",
                "TOTAL_VALUE": "527000.12",
                "NEGO_VALUE": "430000.5",
                "AVG_PE_RATIO": "14.35",
                "TOTAL_SHARES": "48210.7",
                "NEGO_SHARES": "44120.3",
                "TRADE_DATE": "20250110"
            }
        ]
    })
    .to_string();
    let client = ScriptedHttpClient::ok_json(&[sse_body.as_str()]);
    let router = offline_router(client.clone());

    let summary = facade::market_summary(&router, "sse", None)
        .await
        .expect("scripted sse overview");
    assert_eq!(summary.exchange, Exchange::Sse);
    assert_eq!(summary.trade_date, date!(2025 - 01 - 10));
    assert_eq!(summary.listed_companies, Some(2270));
    assert_eq!(summary.avg_pe.map(|pe| pe.to_string()), Some("14.35".to_owned()));
    assert!(router_hit(&client, "query.sse.com.cn"));

    let szse_body = json!([
        {
            "data": [
                {
                    "证券类别": "股票",
                    "数量": "2845",
                    "成交金额": "11,000.55",
                    "总市值": "330,000.2",
                    "流通市值": "260,000.9"
                }
            ]
        }
    ])
    .to_string();
    let client = ScriptedHttpClient::ok_json(&[szse_body.as_str()]);
    let router = offline_router(client.clone());

    let summary = facade::market_summary(&router, "szse", Some("20250110"))
        .await
        .expect("scripted szse overview");
    assert_eq!(summary.exchange, Exchange::Szse);
    assert_eq!(summary.trade_date, date!(2025 - 01 - 10));
    assert_eq!(summary.listed_companies, Some(2845));
    assert_eq!(
        summary.turnover.map(|value| value.to_string()),
        Some("11000.55".to_owned())
    );
    assert!(router_hit(&client, "www.szse.cn"));
}

fn router_hit(client: &ScriptedHttpClient, host: &str) -> bool {
    client.requests().iter().any(|request| request.url.contains(host))
}
