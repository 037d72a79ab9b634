//! Contract tests for the Yahoo Finance adapter.
//!
//! A scripted transport answers by URL fragment, so payload parsing, status
//! mapping and session refresh are checked against recorded response shapes.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ipoflow_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, MarketDataProvider, ResolveError,
    ResolverConfig, RetryPolicy, SnapshotResolver, SourceErrorKind, Symbol, YahooAdapter,
};
use ipoflow_tests::symbol;

const CHART_OK: &str = r#"{"chart":{"result":[{
    "meta":{"currency":"USD","symbol":"ARM","gmtoffset":-18000},
    "timestamp":[1709303400,1709562600,1709582400],
    "indicators":{"quote":[{"close":[10.0,11.0,11.5]}]}
}],"error":null}}"#;

const CHART_NOT_FOUND: &str = r#"{"chart":{"result":null,"error":{
    "code":"Not Found","description":"No data found, symbol may be delisted"
}}}"#;

const PROFILE_OK: &str = r#"{"quoteSummary":{"result":[{
    "assetProfile":{"sector":"Technology","industry":"Semiconductors"},
    "price":{"marketCap":{"raw":54000000000,"fmt":"54B"},"shortName":"Arm Holdings plc"}
}],"error":null}}"#;

const HOLDERS_OK: &str = r#"{"quoteSummary":{"result":[{"fundOwnership":{"ownershipList":[
    {"organization":"Vanguard Total Stock Market Index Fund",
     "pctHeld":{"raw":0.0142,"fmt":"1.42%"}},
    {"organization":"Fidelity Contrafund","pctHeld":{"raw":0.0097,"fmt":"0.97%"}}
]}}],"error":null}}"#;

const QUOTE_OK: &str = r#"{"quoteResponse":{
    "result":[{"symbol":"ARM","marketCap":53900000000}],"error":null
}}"#;

type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Answers each request with the queued responses of the first matching route.
/// The last queued response of a route is repeated.
#[derive(Default)]
struct ScriptedHttpClient {
    routes: Mutex<Vec<(&'static str, VecDeque<HttpResponse>)>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHttpClient {
    fn new() -> Self {
        Self::default()
            .route("fc.yahoo.com", HttpResponse::new(404, ""))
            .route("getcrumb", HttpResponse::new(200, "abcCrumb123"))
    }

    fn route(self, fragment: &'static str, response: HttpResponse) -> Self {
        {
            let mut routes = self.routes.lock().expect("lock");
            match routes.iter_mut().find(|(existing, _)| *existing == fragment) {
                Some((_, queue)) => queue.push_back(response),
                None => routes.push((fragment, VecDeque::from([response]))),
            }
        }
        self
    }

    fn requests_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .expect("lock")
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.requests.lock().expect("lock").push(request.url.clone());

        let response = {
            let mut routes = self.routes.lock().expect("lock");
            routes
                .iter_mut()
                .find(|(fragment, _)| request.url.contains(fragment))
                .map(|(_, queue)| {
                    if queue.len() > 1 {
                        queue.pop_front().expect("non-empty queue")
                    } else {
                        queue.front().cloned().expect("non-empty queue")
                    }
                })
                .unwrap_or_else(|| HttpResponse::new(500, "unscripted route"))
        };

        Box::pin(async move { Ok(response) })
    }
}

fn adapter(client: ScriptedHttpClient) -> (YahooAdapter, Arc<ScriptedHttpClient>) {
    let client = Arc::new(client);
    let adapter = YahooAdapter::with_http_client(client.clone());
    (adapter, client)
}

fn arm() -> Symbol {
    symbol("ARM")
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn chart_payload_becomes_ascending_daily_closes() {
    // Given: A chart with two sessions, the second reported twice
    let (adapter, client) = adapter(
        ScriptedHttpClient::new().route("/v8/finance/chart/ARM", HttpResponse::ok_json(CHART_OK)),
    );

    // When: Full history is requested
    let points = adapter.full_price_history(&arm()).await.expect("history");

    // Then: One close per exchange-local date, latest duplicate wins
    let rows = points
        .iter()
        .map(|point| (point.date.format_iso(), point.close))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![(String::from("2024-03-01"), 10.0), (String::from("2024-03-04"), 11.5)]
    );
    assert!(!adapter.is_offline());
    assert_eq!(client.requests_matching("crumb=abcCrumb123"), 1);
    assert_eq!(client.requests_matching("range=max"), 1);
}

#[tokio::test]
async fn unknown_ticker_resolves_to_no_data() {
    let (adapter, _) = adapter(
        ScriptedHttpClient::new()
            .route("/v8/finance/chart/", HttpResponse::new(404, CHART_NOT_FOUND)),
    );

    let error = SnapshotResolver::new(adapter)
        .resolve(&symbol("NOPE"))
        .await
        .expect_err("no data");

    assert_eq!(error.code(), "resolve.no_data");
}

// =============================================================================
// Status mapping
// =============================================================================

#[tokio::test]
async fn http_429_is_reported_as_throttling() {
    let (adapter, _) = adapter(
        ScriptedHttpClient::new()
            .route("/v8/finance/chart/", HttpResponse::new(429, "Too Many Requests")),
    );
    let resolver = SnapshotResolver::with_config(
        adapter,
        ResolverConfig {
            retry: RetryPolicy::no_retry(),
            ..ResolverConfig::default()
        },
    );

    let error = resolver.resolve(&arm()).await.expect_err("throttled");

    assert!(matches!(error, ResolveError::RateLimited { attempts: 1, .. }));
}

#[tokio::test]
async fn server_error_is_unavailable_and_bad_json_is_invalid() {
    let (adapter, _) = adapter(
        ScriptedHttpClient::new()
            .route("/v8/finance/chart/", HttpResponse::new(503, ""))
            .route("modules=assetProfile", HttpResponse::ok_json("<html>oops</html>")),
    );

    let history_error = adapter.full_price_history(&arm()).await.expect_err("503");
    let profile_error = adapter.profile(&arm()).await.expect_err("bad json");

    assert_eq!(history_error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(profile_error.kind(), SourceErrorKind::InvalidResponse);
}

#[tokio::test]
async fn rejected_session_is_refreshed_once() {
    // Given: The first profile call is rejected with 401
    let (adapter, client) = adapter(
        ScriptedHttpClient::new()
            .route("modules=assetProfile", HttpResponse::new(401, "Invalid Crumb"))
            .route("modules=assetProfile", HttpResponse::ok_json(PROFILE_OK)),
    );

    // When: The profile is requested
    let profile = adapter.profile(&arm()).await.expect("profile after refresh");

    // Then: A new crumb was fetched and the retry succeeded
    assert_eq!(profile.sector.as_deref(), Some("Technology"));
    assert_eq!(client.requests_matching("getcrumb"), 2);
    assert_eq!(client.requests_matching("modules=assetProfile"), 2);
}

// =============================================================================
// Profile, market cap and holders
// =============================================================================

#[tokio::test]
async fn profile_quote_and_holders_payloads_are_parsed() {
    let (adapter, client) = adapter(
        ScriptedHttpClient::new()
            .route("modules=assetProfile", HttpResponse::ok_json(PROFILE_OK))
            .route("/v7/finance/quote", HttpResponse::ok_json(QUOTE_OK))
            .route("modules=fundOwnership", HttpResponse::ok_json(HOLDERS_OK)),
    );

    let profile = adapter.profile(&arm()).await.expect("profile");
    let fast_cap = adapter.fast_market_cap(&arm()).await.expect("quote");
    let holders = adapter
        .mutual_fund_holders(&arm())
        .await
        .expect("holders")
        .expect("holder listing present");

    assert_eq!(profile.industry.as_deref(), Some("Semiconductors"));
    assert_eq!(profile.market_cap, Some(54_000_000_000.0));
    assert_eq!(profile.short_name.as_deref(), Some("Arm Holdings plc"));
    assert_eq!(fast_cap, Some(53_900_000_000.0));
    assert_eq!(holders.len(), 2);
    assert_eq!(holders[0].holder_name, "Vanguard Total Stock Market Index Fund");
    assert_eq!(holders[1].pct_of_float, 0.0097);
    // The crumb is fetched once and reused for the session.
    assert_eq!(client.requests_matching("getcrumb"), 1);
}
