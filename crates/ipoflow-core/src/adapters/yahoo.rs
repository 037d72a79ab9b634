use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::http_client::{
    HttpAuth, HttpClient, HttpErrorKind, HttpRequest, HttpResponse, NoopHttpClient,
};
use crate::provider::{
    MarketDataProvider, ProfileFields, ProviderFuture, SourceError, SourceErrorKind,
};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RequestBudget;
use crate::{FundHolder, PricePoint, ProviderId, Symbol, TradeDate};

const REFERER: &str = "https://finance.yahoo.com/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

// ============================================================================
// Session: cookie + crumb
// ============================================================================

/// Yahoo's unofficial API wants a session cookie (from fc.yahoo.com, kept in
/// the transport's cookie jar) plus a crumb token passed as a query parameter.
#[derive(Debug)]
struct YahooSession {
    crumb: Mutex<Option<(String, Instant)>>,
    ttl: Duration,
    cookie_override: Option<String>,
}

impl YahooSession {
    fn new() -> Self {
        Self {
            crumb: Mutex::new(None),
            ttl: Duration::from_secs(60 * 60),
            cookie_override: std::env::var("YAHOO_COOKIE").ok().filter(|value| !value.is_empty()),
        }
    }

    fn auth(&self) -> HttpAuth {
        self.cookie_override
            .clone()
            .map_or(HttpAuth::None, HttpAuth::Cookie)
    }

    fn cached_crumb(&self) -> Option<String> {
        let guard = self.crumb.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|(_, fetched_at)| fetched_at.elapsed() < self.ttl)
            .map(|(crumb, _)| crumb.clone())
    }

    fn invalidate(&self) {
        *self.crumb.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn crumb(&self, http: &dyn HttpClient, timeout: Duration) -> Result<String, SourceError> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }

        debug!("refreshing yahoo session");
        if self.cookie_override.is_none() {
            let cookie_request = HttpRequest::get(COOKIE_URL)
                .with_header("referer", REFERER)
                .with_timeout(timeout);
            // fc.yahoo.com answers 404 but still sets the session cookie.
            http.execute(cookie_request)
                .await
                .map_err(|error| transport_error("session cookie", error.kind(), error.message()))?;
        }

        for endpoint in CRUMB_URLS {
            let request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_auth(&self.auth())
                .with_timeout(timeout);
            let Ok(response) = http.execute(request).await else {
                continue;
            };

            if is_throttled(&response) {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }

            let body = response.body.trim();
            let looks_like_crumb = response.is_success()
                && !body.is_empty()
                && body.len() < 100
                && !body.contains(' ')
                && !body.contains('<');
            if looks_like_crumb {
                *self.crumb.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some((body.to_owned(), Instant::now()));
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Yahoo Finance provider with an offline deterministic mode.
///
/// The default instance uses [`NoopHttpClient`] and never touches the network.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    session: Arc<YahooSession>,
    budget: RequestBudget,
    policy: ProviderPolicy,
    use_real_api: bool,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(NoopHttpClient))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let policy = ProviderPolicy::yahoo_default();
        Self {
            use_real_api: !http_client.is_mock(),
            http_client,
            session: Arc::new(YahooSession::new()),
            budget: RequestBudget::from_policy(&policy),
            policy,
        }
    }

    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.budget = RequestBudget::from_policy(&policy);
        self.policy = policy;
        self
    }

    pub const fn is_offline(&self) -> bool {
        !self.use_real_api
    }

    /// GET a JSON document, refreshing the session once on 401/403.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let timeout = self.policy.request_timeout;
        let mut response = self.get_with_crumb(url, timeout).await?;

        if response.status == 401 || response.status == 403 {
            debug!(status = response.status, "yahoo rejected session, retrying once");
            self.session.invalidate();
            response = self.get_with_crumb(url, timeout).await?;
        }

        debug!(status = response.status, url, "yahoo response");
        let body = classify_response(response)?;
        serde_json::from_str(&body).map_err(|error| {
            SourceError::invalid_response(format!("failed to parse yahoo payload: {error}"))
        })
    }

    async fn get_with_crumb(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, SourceError> {
        let crumb = self.session.crumb(self.http_client.as_ref(), timeout).await?;
        let request = HttpRequest::get(format!("{url}&crumb={}", urlencoding::encode(&crumb)))
            .with_header("referer", REFERER)
            .with_auth(&self.session.auth())
            .with_timeout(timeout);

        self.http_client
            .execute(request)
            .await
            .map_err(|error| transport_error("request", error.kind(), error.message()))
    }

    async fn fetch_history(&self, symbol: &Symbol) -> Result<Vec<PricePoint>, SourceError> {
        self.budget.acquire()?;
        if self.is_offline() {
            return Ok(offline::price_history(symbol, TradeDate::today_utc()));
        }

        let url = format!(
            "{CHART_URL}/{}?range=max&interval=1d&includeAdjustedClose=true",
            urlencoding::encode(symbol.as_str())
        );
        match self.get_json::<ChartEnvelope>(&url).await {
            Ok(envelope) => parse_price_history(envelope),
            // Unknown tickers come back as 404 with a "Not Found" chart error.
            Err(error) if error.kind() == SourceErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    async fn fetch_profile(&self, symbol: &Symbol) -> Result<ProfileFields, SourceError> {
        self.budget.acquire()?;
        if self.is_offline() {
            return Ok(offline::profile(symbol));
        }

        let url = format!(
            "{QUOTE_SUMMARY_URL}/{}?modules=assetProfile,price",
            urlencoding::encode(symbol.as_str())
        );
        let summary = self.get_json::<QuoteSummaryEnvelope>(&url).await?;
        Ok(parse_profile(first_summary_result(summary)?))
    }

    async fn fetch_fast_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, SourceError> {
        self.budget.acquire()?;
        if self.is_offline() {
            return Ok(offline::fast_market_cap(symbol));
        }

        let url = format!(
            "{QUOTE_URL}?symbols={}&fields=marketCap",
            urlencoding::encode(symbol.as_str())
        );
        let quotes = self.get_json::<QuoteEnvelope>(&url).await?;
        Ok(quotes
            .quote_response
            .result
            .into_iter()
            .find(|quote| quote.symbol.eq_ignore_ascii_case(symbol.as_str()))
            .and_then(|quote| quote.market_cap)
            .filter(|value| value.is_finite() && *value > 0.0))
    }

    async fn fetch_fund_holders(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<Vec<FundHolder>>, SourceError> {
        self.budget.acquire()?;
        if self.is_offline() {
            return Ok(Some(offline::fund_holders(symbol)));
        }

        let url = format!(
            "{QUOTE_SUMMARY_URL}/{}?modules=fundOwnership",
            urlencoding::encode(symbol.as_str())
        );
        let summary = self.get_json::<QuoteSummaryEnvelope>(&url).await?;
        Ok(parse_fund_holders(first_summary_result(summary)?))
    }
}

impl MarketDataProvider for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn full_price_history<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, Vec<PricePoint>> {
        Box::pin(self.fetch_history(symbol))
    }

    fn profile<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, ProfileFields> {
        Box::pin(self.fetch_profile(symbol))
    }

    fn fast_market_cap<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, Option<f64>> {
        Box::pin(self.fetch_fast_market_cap(symbol))
    }

    fn mutual_fund_holders<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> ProviderFuture<'a, Option<Vec<FundHolder>>> {
        Box::pin(self.fetch_fund_holders(symbol))
    }
}

fn is_throttled(response: &HttpResponse) -> bool {
    response.status == 429 || response.body.to_ascii_lowercase().contains("too many requests")
}

fn classify_response(response: HttpResponse) -> Result<String, SourceError> {
    if is_throttled(&response) {
        return Err(SourceError::rate_limited(format!(
            "yahoo throttled the request (status {})",
            response.status
        )));
    }
    if response.status == 404 {
        return Err(SourceError::not_found("yahoo has no data for this symbol"));
    }
    if !response.is_success() {
        return Err(SourceError::unavailable(format!(
            "yahoo returned status {}",
            response.status
        )));
    }
    Ok(response.body)
}

fn transport_error(stage: &str, kind: HttpErrorKind, message: &str) -> SourceError {
    match kind {
        HttpErrorKind::Timeout => {
            SourceError::unavailable(format!("yahoo {stage} timed out: {message}"))
        }
        HttpErrorKind::Connect | HttpErrorKind::Other => {
            SourceError::unavailable(format!("yahoo {stage} failed: {message}"))
        }
    }
}

// ============================================================================
// Payload parsing
// ============================================================================

fn parse_price_history(envelope: ChartEnvelope) -> Result<Vec<PricePoint>, SourceError> {
    if let Some(error) = envelope.chart.error {
        if error.code.eq_ignore_ascii_case("not found") {
            return Ok(Vec::new());
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let gmt_offset = result.meta.map_or(0, |meta| meta.gmt_offset);
    let closes = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|series| series.adjclose)
        .filter(|series| series.len() == result.timestamp.len())
        .or_else(|| result.indicators.quote.into_iter().next().map(|quote| quote.close))
        .unwrap_or_default();

    // Keyed by session date: sorts the series and collapses intraday duplicates
    // Yahoo appends for the live session.
    let mut by_date = BTreeMap::new();
    for (timestamp, close) in result.timestamp.iter().zip(closes) {
        let Some(close) = close.filter(|value| value.is_finite() && *value >= 0.0) else {
            continue;
        };
        let Some(date) = TradeDate::from_unix_timestamp(*timestamp, gmt_offset) else {
            continue;
        };
        by_date.insert(date, close);
    }

    by_date
        .into_iter()
        .map(|(date, close)| {
            PricePoint::new(date, close)
                .map_err(|error| SourceError::invalid_response(error.to_string()))
        })
        .collect()
}

fn first_summary_result(envelope: QuoteSummaryEnvelope) -> Result<QuoteSummaryResult, SourceError> {
    if let Some(error) = envelope.quote_summary.error {
        if error.code.eq_ignore_ascii_case("not found") {
            return Err(SourceError::not_found(format!(
                "yahoo quoteSummary: {}",
                error.description.unwrap_or(error.code)
            )));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo quoteSummary error {}",
            error.code
        )));
    }

    envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::not_found("yahoo quoteSummary returned no result"))
}

fn parse_profile(result: QuoteSummaryResult) -> ProfileFields {
    let (sector, industry) = result
        .asset_profile
        .map(|profile| (non_blank(profile.sector), non_blank(profile.industry)))
        .unwrap_or_default();
    let (market_cap, short_name) = result
        .price
        .map(|price| {
            (
                price.market_cap.and_then(RawValue::positive),
                non_blank(price.short_name).or_else(|| non_blank(price.long_name)),
            )
        })
        .unwrap_or_default();

    ProfileFields {
        sector,
        industry,
        market_cap,
        short_name,
    }
}

fn parse_fund_holders(result: QuoteSummaryResult) -> Option<Vec<FundHolder>> {
    let ownership = result.fund_ownership?;
    let holders = ownership
        .ownership_list
        .into_iter()
        .filter_map(|entry| {
            let name = non_blank(entry.organization)?;
            let pct = entry.pct_held.and_then(|value| value.raw)?;
            FundHolder::new(name, pct).ok()
        })
        .collect::<Vec<_>>();

    if holders.is_empty() {
        None
    } else {
        Some(holders)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "gmtoffset", default)]
    gmt_offset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "assetProfile", default)]
    asset_profile: Option<AssetProfile>,
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(rename = "fundOwnership", default)]
    fund_ownership: Option<FundOwnership>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceModule {
    #[serde(rename = "marketCap", default)]
    market_cap: Option<RawValue>,
    #[serde(rename = "shortName", default)]
    short_name: Option<String>,
    #[serde(rename = "longName", default)]
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FundOwnership {
    #[serde(rename = "ownershipList", default)]
    ownership_list: Vec<OwnershipEntry>,
}

#[derive(Debug, Deserialize)]
struct OwnershipEntry {
    #[serde(default)]
    organization: Option<String>,
    #[serde(rename = "pctHeld", default)]
    pct_held: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; `{}` means missing.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

impl RawValue {
    fn positive(self) -> Option<f64> {
        self.raw.filter(|value| value.is_finite() && *value > 0.0)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(default)]
    result: Vec<QuoteRow>,
}

#[derive(Debug, Deserialize)]
struct QuoteRow {
    symbol: String,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<f64>,
}

// ============================================================================
// Offline data
// ============================================================================

mod offline {
    use super::*;

    const PROFILES: [(&str, &str); 5] = [
        ("Healthcare", "Biotechnology"),
        ("Technology", "Semiconductors"),
        ("Communication Services", "Internet Content & Information"),
        ("Industrials", "Aerospace & Defense"),
        ("Consumer Cyclical", "Specialty Retail"),
    ];

    const FUNDS: [&str; 6] = [
        "Vanguard Total Stock Market Index Fund",
        "Vanguard Extended Market Index Fund",
        "iShares Russell 2000 ETF",
        "Fidelity Small Cap Index Fund",
        "Vanguard Small-Cap Index Fund",
        "SPDR S&P Biotech ETF",
    ];

    /// Weekday closes from a symbol-derived listing date through `today`.
    pub(super) fn price_history(symbol: &Symbol, today: TradeDate) -> Vec<PricePoint> {
        let seed = symbol.seed();
        let days_listed = 30 + (seed % 900) as i64;
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut price = 10.0 + (seed % 40) as f64;

        let mut points = Vec::new();
        let mut date = today.minus_days(days_listed);
        while date <= today {
            let weekday = date.into_inner().weekday().number_days_from_monday();
            if weekday < 5 {
                if let Ok(point) = PricePoint::new(date, (price * 100.0).round() / 100.0) {
                    points.push(point);
                }
                let drift = (rng.i64(-30..=31) as f64) / 1_000.0;
                price = (price * (1.0 + drift)).max(0.5);
            }
            date = date.plus_days(1);
        }
        points
    }

    pub(super) fn profile(symbol: &Symbol) -> ProfileFields {
        let seed = symbol.seed();
        let (sector, industry) = PROFILES[(seed % PROFILES.len() as u64) as usize];
        // Every seventh symbol leaves the profile cap blank so the fallback path runs.
        let market_cap = (seed % 7 != 0).then(|| market_cap(seed));

        ProfileFields {
            sector: Some(sector.to_owned()),
            industry: Some(industry.to_owned()),
            market_cap,
            short_name: Some(format!("{symbol} Holdings Inc.")),
        }
    }

    pub(super) fn fast_market_cap(symbol: &Symbol) -> Option<f64> {
        Some(market_cap(symbol.seed()))
    }

    pub(super) fn fund_holders(symbol: &Symbol) -> Vec<FundHolder> {
        let seed = symbol.seed();
        FUNDS
            .iter()
            .enumerate()
            .filter_map(|(rank, name)| {
                let pct = (0.031 - rank as f64 * 0.004) + (seed % 10) as f64 / 10_000.0;
                FundHolder::new(*name, pct).ok()
            })
            .collect()
    }

    fn market_cap(seed: u64) -> f64 {
        (0.3 + (seed % 400) as f64 / 100.0) * 1e9
    }
}
