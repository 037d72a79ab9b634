//! Behavior-driven tests for the market snapshot resolver.
//!
//! A scripted provider replays queued outcomes per operation so retry,
//! degradation and fallback paths can be driven without network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ipoflow_core::{
    track, Degradation, FundHolder, MarketDataProvider, PricePoint, ProfileFields, ProviderFuture,
    ProviderId, ResolveError, ResolverConfig, RetryPolicy, SectorOverride, SnapshotResolver,
    SourceError, Symbol, UNKNOWN_LABEL,
};
use ipoflow_tests::date;

type Script<T> = Mutex<VecDeque<Result<T, SourceError>>>;

#[derive(Default)]
struct ScriptedProvider {
    history: Script<Vec<PricePoint>>,
    profile: Script<ProfileFields>,
    fast_cap: Script<Option<f64>>,
    holders: Script<Option<Vec<FundHolder>>>,
    history_delay: Option<Duration>,
    history_calls: AtomicU32,
    holder_calls: AtomicU32,
}

impl ScriptedProvider {
    /// Every history call stalls for `delay` before answering.
    fn with_stalled_history(mut self, delay: Duration) -> Self {
        self.history_delay = Some(delay);
        self
    }

    fn with_history(self, outcome: Result<Vec<PricePoint>, SourceError>) -> Self {
        self.history.lock().expect("lock").push_back(outcome);
        self
    }

    fn with_profile(self, outcome: Result<ProfileFields, SourceError>) -> Self {
        self.profile.lock().expect("lock").push_back(outcome);
        self
    }

    fn with_fast_cap(self, outcome: Result<Option<f64>, SourceError>) -> Self {
        self.fast_cap.lock().expect("lock").push_back(outcome);
        self
    }

    fn with_holders(self, outcome: Result<Option<Vec<FundHolder>>, SourceError>) -> Self {
        self.holders.lock().expect("lock").push_back(outcome);
        self
    }
}

fn next<T: Default>(script: &Script<T>) -> Result<T, SourceError> {
    script
        .lock()
        .expect("lock")
        .pop_front()
        .unwrap_or_else(|| Ok(T::default()))
}

impl MarketDataProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Static
    }

    fn full_price_history<'a>(
        &'a self,
        _symbol: &'a Symbol,
    ) -> ProviderFuture<'a, Vec<PricePoint>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = next(&self.history);
        let delay = self.history_delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }

    fn profile<'a>(&'a self, _symbol: &'a Symbol) -> ProviderFuture<'a, ProfileFields> {
        let outcome = next(&self.profile);
        Box::pin(async move { outcome })
    }

    fn fast_market_cap<'a>(&'a self, _symbol: &'a Symbol) -> ProviderFuture<'a, Option<f64>> {
        let outcome = next(&self.fast_cap);
        Box::pin(async move { outcome })
    }

    fn mutual_fund_holders<'a>(
        &'a self,
        _symbol: &'a Symbol,
    ) -> ProviderFuture<'a, Option<Vec<FundHolder>>> {
        self.holder_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = next(&self.holders);
        Box::pin(async move { outcome })
    }
}

fn symbol() -> Symbol {
    Symbol::parse(" arm ").expect("valid symbol")
}

fn history(dates: &[&str]) -> Vec<PricePoint> {
    dates
        .iter()
        .enumerate()
        .map(|(index, day)| {
            PricePoint::new(date(day), 50.0 + index as f64)
                .expect("point")
        })
        .collect()
}

fn full_profile() -> ProfileFields {
    ProfileFields {
        sector: Some(String::from("Technology")),
        industry: Some(String::from("Semiconductors")),
        market_cap: Some(5.4e10),
        short_name: Some(String::from("Arm Holdings plc")),
    }
}

fn resolver(provider: ScriptedProvider) -> SnapshotResolver<Arc<ScriptedProvider>> {
    SnapshotResolver::new(Arc::new(provider))
}

// =============================================================================
// Resolver: price history
// =============================================================================

#[tokio::test]
async fn when_history_is_available_first_trade_date_is_earliest_point() {
    // Given: A provider with out-of-order history and a complete profile
    let provider = ScriptedProvider::default()
        .with_history(Ok(history(&["2023-09-15", "2023-09-14", "2023-09-18"])))
        .with_profile(Ok(full_profile()));

    // When: The ticker is resolved
    let snapshot = resolver(provider).resolve(&symbol()).await.expect("resolves");

    // Then: The series is ascending and starts at the listing date
    assert_eq!(snapshot.security.symbol.as_str(), "ARM");
    assert_eq!(snapshot.security.first_trade_date.format_iso(), "2023-09-14");
    assert_eq!(snapshot.prices.first().date, snapshot.security.first_trade_date);
    assert_eq!(snapshot.prices.len(), 3);
    assert!(snapshot.degradations.is_empty());
    assert_eq!(snapshot.fund_holders, None);
}

#[tokio::test]
async fn when_history_is_empty_resolution_fails_with_no_data() {
    let provider = ScriptedProvider::default().with_history(Ok(Vec::new()));

    let error = resolver(provider).resolve(&symbol()).await.expect_err("no data");

    assert_eq!(error, ResolveError::NoData { symbol: symbol() });
    assert_eq!(error.to_string(), "No trading data found for ARM.");
}

#[tokio::test]
async fn when_provider_reports_not_found_resolution_fails_without_retry() {
    let provider = Arc::new(
        ScriptedProvider::default().with_history(Err(SourceError::not_found("unknown ticker"))),
    );
    let resolver = SnapshotResolver::new(Arc::clone(&provider));

    let error = resolver.resolve(&symbol()).await.expect_err("no data");

    assert!(matches!(error, ResolveError::NoData { .. }));
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Resolver: throttling and retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_throttled_once_resolver_backs_off_and_succeeds() {
    // Given: One throttled response followed by real data
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_history(Err(SourceError::rate_limited("429")))
            .with_history(Ok(history(&["2024-01-02"])))
            .with_profile(Ok(full_profile())),
    );
    let resolver = SnapshotResolver::new(Arc::clone(&provider));
    let started = tokio::time::Instant::now();

    // When: The ticker is resolved
    let snapshot = resolver.resolve(&symbol()).await.expect("resolves after retry");

    // Then: Exactly one 2s backoff was taken
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(snapshot.prices.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn when_throttling_persists_resolver_gives_up_after_three_attempts() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_history(Err(SourceError::rate_limited("429")))
            .with_history(Err(SourceError::rate_limited("429")))
            .with_history(Err(SourceError::rate_limited("429"))),
    );
    let resolver = SnapshotResolver::new(Arc::clone(&provider));
    let started = tokio::time::Instant::now();

    let error = resolver.resolve(&symbol()).await.expect_err("throttled");

    assert_eq!(
        error,
        ResolveError::RateLimited {
            symbol: symbol(),
            attempts: 3
        }
    );
    assert!(error.retryable());
    // 2s + 4s of backoff.
    assert!(started.elapsed() >= Duration::from_secs(6));
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn when_retries_are_disabled_first_throttle_is_surfaced() {
    let provider = ScriptedProvider::default().with_history(Err(SourceError::rate_limited("429")));
    let config = ResolverConfig {
        retry: RetryPolicy::no_retry(),
        ..ResolverConfig::default()
    };

    let error = SnapshotResolver::with_config(provider, config)
        .resolve(&symbol())
        .await
        .expect_err("throttled");

    assert_eq!(error.code(), "resolve.rate_limited");
}

// =============================================================================
// Resolver: per-call timeout
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_history_call_hangs_it_times_out_once_without_retry() {
    // Given: A provider whose history call never answers within the call timeout
    let provider =
        Arc::new(ScriptedProvider::default().with_stalled_history(Duration::from_secs(3600)));
    let resolver = SnapshotResolver::new(Arc::clone(&provider));
    let started = tokio::time::Instant::now();

    // When: The ticker is resolved with the default configuration
    let error = resolver.resolve(&symbol()).await.expect_err("timed out");

    // Then: One attempt is cut off at the 5s call timeout
    assert_eq!(
        error,
        ResolveError::Unavailable {
            symbol: symbol(),
            message: String::from("price_history timed out after 5000ms"),
        }
    );
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn when_timeouts_are_retryable_every_attempt_is_used() {
    // Given: A hanging provider and a policy that retries timeouts
    let provider =
        Arc::new(ScriptedProvider::default().with_stalled_history(Duration::from_secs(3600)));
    let config = ResolverConfig {
        retry: RetryPolicy {
            retry_on_timeout: true,
            ..RetryPolicy::default()
        },
        call_timeout: Duration::from_secs(1),
    };
    let resolver = SnapshotResolver::with_config(Arc::clone(&provider), config);
    let started = tokio::time::Instant::now();

    // When: The ticker is resolved
    let error = resolver.resolve(&symbol()).await.expect_err("timed out");

    // Then: max_retries + 1 attempts, each cut off, with 2s + 4s of backoff between them
    assert!(matches!(error, ResolveError::Unavailable { .. }));
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_secs(9));
}

#[tokio::test]
async fn when_upstream_is_down_resolution_fails_as_unavailable() {
    let provider =
        ScriptedProvider::default().with_history(Err(SourceError::unavailable("status 503")));

    let error = resolver(provider).resolve(&symbol()).await.expect_err("down");

    assert!(matches!(
        error,
        ResolveError::Unavailable { ref message, .. } if message == "status 503"
    ));
}

// =============================================================================
// Resolver: degradation policy
// =============================================================================

#[tokio::test]
async fn when_profile_fails_defaults_are_applied_and_recorded() {
    // Given: Price data but a failing profile and no fast market cap
    let provider = ScriptedProvider::default()
        .with_history(Ok(history(&["2024-02-01", "2024-02-02"])))
        .with_profile(Err(SourceError::unavailable("quoteSummary 500")))
        .with_fast_cap(Ok(None));

    // When: The ticker is resolved
    let snapshot = resolver(provider).resolve(&symbol()).await.expect("resolves");

    // Then: Every profile field is defaulted and named
    let security = &snapshot.security;
    assert_eq!(security.sector, UNKNOWN_LABEL);
    assert_eq!(security.industry, UNKNOWN_LABEL);
    assert_eq!(security.market_cap_usd, 0.0);
    assert_eq!(security.display_name, "ARM");
    assert_eq!(
        snapshot.degradations,
        vec![
            Degradation::Sector,
            Degradation::Industry,
            Degradation::MarketCap,
            Degradation::DisplayName,
        ]
    );
}

#[tokio::test]
async fn when_profile_cap_is_zero_fast_market_cap_is_used() {
    let provider = ScriptedProvider::default()
        .with_history(Ok(history(&["2024-02-01"])))
        .with_profile(Ok(ProfileFields {
            market_cap: Some(0.0),
            ..full_profile()
        }))
        .with_fast_cap(Ok(Some(1.25e9)));

    let snapshot = resolver(provider).resolve(&symbol()).await.expect("resolves");

    assert_eq!(snapshot.security.market_cap_usd, 1.25e9);
    assert!(!snapshot.degradations.contains(&Degradation::MarketCap));
}

// =============================================================================
// Resolver: fund holders
// =============================================================================

#[tokio::test]
async fn when_holder_lookup_fails_result_is_absent_not_an_error() {
    let provider = ScriptedProvider::default()
        .with_holders(Err(SourceError::invalid_response("bad json")));

    let holders = resolver(provider).fund_holders(&symbol()).await;

    assert_eq!(holders, None);
}

#[tokio::test]
async fn when_security_is_recent_ipo_holders_are_not_requested() {
    // Given: A listing only 10 days old
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_history(Ok(history(&["2024-03-01", "2024-03-04"])))
            .with_profile(Ok(full_profile())),
    );
    let resolver = SnapshotResolver::new(Arc::clone(&provider));

    // When: The full pipeline runs
    let report = track(
        &resolver,
        &symbol(),
        date("2024-03-11"),
        SectorOverride::AutoDetect,
    )
    .await
    .expect("report");

    // Then: Predictions are produced and no holder call was made
    assert_eq!(report.status_label, "Recent IPO");
    assert_eq!(provider.holder_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn when_security_is_mature_pipeline_fetches_holders() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_history(Ok(history(&["2020-12-10", "2024-03-08"])))
            .with_profile(Ok(full_profile()))
            .with_holders(Ok(Some(vec![
                FundHolder::new("Vanguard Total Stock Market Index Fund", 0.0283).expect("holder")
            ]))),
    );
    let resolver = SnapshotResolver::new(Arc::clone(&provider));

    let report = track(
        &resolver,
        &symbol(),
        date("2024-03-11"),
        SectorOverride::AutoDetect,
    )
    .await
    .expect("report");

    assert_eq!(report.status_label, "Mature Company");
    assert_eq!(provider.holder_calls.load(Ordering::SeqCst), 1);
    let json = serde_json::to_value(&report).expect("serializes");
    assert_eq!(json["outlook"]["kind"], "fund_holders");
    assert_eq!(json["outlook"]["holders"]["rows"][0]["pct_of_float"], "2.83%");
}
