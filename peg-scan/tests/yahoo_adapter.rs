//! Wire-level tests for the Yahoo Finance adapter against a local mock server.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use peg_common::config::MarketConfig;
use peg_scan::{MarketDataProvider, ProviderError, YahooFinanceAdapter};

const CRUMB_PATH: &str = "/v1/test/getcrumb";
const SUMMARY_PATH: &str = "/v10/finance/quoteSummary/HDFCBANK.NS";

fn adapter(server: &MockServer) -> YahooFinanceAdapter {
    let config = MarketConfig {
        timeout_secs: 5,
        requests_per_minute: 6000,
        ..Default::default()
    };
    YahooFinanceAdapter::from_config(&config)
        .with_base_urls(server.uri(), server.uri())
        .with_auth_urls(
            format!("{}/consent", server.uri()),
            format!("{}{}", server.uri(), CRUMB_PATH),
        )
}

async fn mount_crumb(server: &MockServer, crumb: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(CRUMB_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(crumb))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn summary_body() -> serde_json::Value {
    json!({
        "quoteSummary": {
            "result": [{
                "summaryDetail": {"trailingPE": {"raw": 20.0, "fmt": "20.00"}},
                "defaultKeyStatistics": {
                    "trailingEps": {"raw": 10.0, "fmt": "10.00"},
                    "forwardEps": {"raw": 15.0, "fmt": "15.00"}
                }
            }],
            "error": null
        }
    })
}

// ============================================================================
// Ticker search
// ============================================================================

#[tokio::test]
async fn test_search_sends_query_and_picks_accepted_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .and(query_param("q", "HDFC Bank Ltd."))
        .and(query_param("quotesCount", "5"))
        .and(query_param("newsCount", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quotes": [
                {"symbol": "HDB", "exchange": "NYQ"},
                {"symbol": "HDFCBANK.NS", "exchange": "NSI"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ticker = adapter(&server).search_ticker("HDFC Bank Ltd.").await.unwrap();
    assert_eq!(ticker.as_deref(), Some("HDFCBANK.NS"));
}

#[tokio::test]
async fn test_search_without_accepted_exchange_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quotes": [{"symbol": "HDB", "exchange": "NYQ"}]
        })))
        .mount(&server)
        .await;

    assert_eq!(adapter(&server).search_ticker("HDFC Bank").await, Ok(None));
}

#[tokio::test]
async fn test_search_rate_limited_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    assert_eq!(
        adapter(&server).search_ticker("Infosys Ltd.").await,
        Err(ProviderError::RateLimited {
            retry_after_secs: Some(7)
        })
    );
}

#[tokio::test]
async fn test_search_rate_limited_without_header_uses_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    assert_eq!(
        adapter(&server).search_ticker("Infosys Ltd.").await,
        Err(ProviderError::RateLimited {
            retry_after_secs: Some(60)
        })
    );
}

#[tokio::test]
async fn test_search_bad_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        adapter(&server).search_ticker("Infosys Ltd.").await,
        Err(ProviderError::InvalidResponse(_))
    ));
}

// ============================================================================
// Fundamentals
// ============================================================================

#[tokio::test]
async fn test_fundamentals_reuses_crumb() {
    let server = MockServer::start().await;
    mount_crumb(&server, "abc123", 1).await;
    Mock::given(method("GET"))
        .and(path(SUMMARY_PATH))
        .and(query_param("crumb", "abc123"))
        .and(query_param("modules", "summaryDetail,defaultKeyStatistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body()))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    let first = adapter.fundamentals("HDFCBANK.NS").await.unwrap();
    let second = adapter.fundamentals("HDFCBANK.NS").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.trailing_pe, Some(20.0));
    assert_eq!(first.trailing_eps, Some(10.0));
    assert_eq!(first.forward_eps, Some(15.0));
    assert_eq!(first.forward_pe, None);
}

#[tokio::test]
async fn test_rejected_crumb_is_refetched() {
    let server = MockServer::start().await;
    mount_crumb(&server, "stale", 2).await;
    Mock::given(method("GET"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    assert!(matches!(adapter.fundamentals("HDFCBANK.NS").await, Err(ProviderError::Auth(_))));
    assert!(matches!(adapter.fundamentals("HDFCBANK.NS").await, Err(ProviderError::Auth(_))));
}

#[tokio::test]
async fn test_forbidden_summary_is_auth_error() {
    let server = MockServer::start().await;
    mount_crumb(&server, "abc123", 1).await;
    Mock::given(method("GET"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    assert!(matches!(
        adapter(&server).fundamentals("HDFCBANK.NS").await,
        Err(ProviderError::Auth(_))
    ));
}

#[tokio::test]
async fn test_unknown_ticker_is_data_not_available() {
    let server = MockServer::start().await;
    mount_crumb(&server, "abc123", 1).await;
    Mock::given(method("GET"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(matches!(
        adapter(&server).fundamentals("HDFCBANK.NS").await,
        Err(ProviderError::DataNotAvailable(_))
    ));
}

#[tokio::test]
async fn test_failed_crumb_skips_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CRUMB_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body()))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        adapter(&server).fundamentals("HDFCBANK.NS").await,
        Err(ProviderError::Auth(_))
    ));
}
