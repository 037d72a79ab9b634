//! Market snapshot resolution.
//!
//! [`SnapshotResolver`] turns a ticker into an immutable [`MarketSnapshot`].
//! Price history is authoritative: it is the only call whose failure aborts a
//! query. Profile fields degrade to named defaults (see [`Degradation`]) and
//! fund holders degrade to `None`.
//!
//! Throttled calls are retried under the configured [`RetryPolicy`]; every
//! provider call runs under `call_timeout`.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::provider::{MarketDataProvider, ProfileFields, SourceError, SourceErrorKind};
use crate::retry::RetryPolicy;
use crate::{
    Degradation, FundHolder, MarketSnapshot, PricePoint, PriceSeries, ProviderId, Security, Symbol,
    ValidationError, UNKNOWN_LABEL,
};

/// Resolver tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub retry: RetryPolicy,
    /// Upper bound for a single provider call.
    pub call_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Failures that abort snapshot resolution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("No trading data found for {symbol}.")]
    NoData { symbol: Symbol },
    #[error(
        "The data provider is rate limiting requests for {symbol} ({attempts} attempts). \
         Please try again in a few minutes."
    )]
    RateLimited { symbol: Symbol, attempts: u32 },
    #[error("Market data for {symbol} is unavailable: {message}")]
    Unavailable { symbol: Symbol, message: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ResolveError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoData { .. } => "resolve.no_data",
            Self::RateLimited { .. } => "resolve.rate_limited",
            Self::Unavailable { .. } => "resolve.unavailable",
            Self::Validation(_) => "resolve.validation",
        }
    }

    /// Whether the same query may succeed later.
    pub const fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unavailable { .. })
    }
}

/// Last error of a retried call together with how many attempts were made.
#[derive(Debug)]
struct CallFailure {
    error: SourceError,
    attempts: u32,
}

/// Resolves tickers into [`MarketSnapshot`] values through one provider.
#[derive(Debug, Clone)]
pub struct SnapshotResolver<P> {
    provider: P,
    config: ResolverConfig,
}

impl<P> SnapshotResolver<P>
where
    P: MarketDataProvider,
{
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ResolverConfig::default())
    }

    pub fn with_config(provider: P, config: ResolverConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    /// Resolves `symbol` into a snapshot without fund holders.
    pub async fn resolve(&self, symbol: &Symbol) -> Result<MarketSnapshot, ResolveError> {
        let history = self
            .with_retry(symbol, "price_history", || {
                self.provider.full_price_history(symbol)
            })
            .await
            .map_err(|failure| history_failure(symbol, failure))?;

        let prices = match PriceSeries::new(normalize_history(history)) {
            Ok(prices) => prices,
            Err(ValidationError::EmptyPriceSeries) => {
                info!(%symbol, "provider returned no price history");
                return Err(ResolveError::NoData {
                    symbol: symbol.clone(),
                });
            }
            Err(error) => return Err(error.into()),
        };

        let profile = match self
            .with_retry(symbol, "profile", || self.provider.profile(symbol))
            .await
        {
            Ok(profile) => profile,
            Err(failure) => {
                warn!(
                    %symbol,
                    code = failure.error.code(),
                    error = %failure.error,
                    "profile unavailable, using defaults"
                );
                ProfileFields::default()
            }
        };

        let mut degradations = Vec::new();
        let sector = profile.sector.unwrap_or_else(|| {
            degradations.push(Degradation::Sector);
            UNKNOWN_LABEL.to_owned()
        });
        let industry = profile.industry.unwrap_or_else(|| {
            degradations.push(Degradation::Industry);
            UNKNOWN_LABEL.to_owned()
        });

        let market_cap = match profile.market_cap.filter(|cap| is_usable_cap(*cap)) {
            Some(cap) => Some(cap),
            None => self.fast_market_cap(symbol).await,
        };
        let market_cap_usd = market_cap.unwrap_or_else(|| {
            degradations.push(Degradation::MarketCap);
            0.0
        });

        let display_name = profile.short_name.unwrap_or_else(|| {
            degradations.push(Degradation::DisplayName);
            symbol.to_string()
        });

        for degradation in &degradations {
            debug!(%symbol, ?degradation, "profile field defaulted");
        }

        let security = Security::new(
            symbol.clone(),
            prices.first_trade_date(),
            sector,
            industry,
            market_cap_usd,
            display_name,
        )?;

        info!(
            %symbol,
            first_trade_date = %security.first_trade_date,
            points = prices.len(),
            degraded = degradations.len(),
            "resolved market snapshot"
        );

        Ok(MarketSnapshot::new(security, prices).with_degradations(degradations))
    }

    /// Best-effort fund holder lookup; any failure or empty listing is `None`.
    pub async fn fund_holders(&self, symbol: &Symbol) -> Option<Vec<FundHolder>> {
        match self
            .with_retry(symbol, "fund_holders", || {
                self.provider.mutual_fund_holders(symbol)
            })
            .await
        {
            Ok(Some(holders)) if !holders.is_empty() => Some(holders),
            Ok(_) => {
                debug!(%symbol, "provider has no fund holder listing");
                None
            }
            Err(failure) => {
                warn!(
                    %symbol,
                    code = failure.error.code(),
                    error = %failure.error,
                    "fund holders unavailable"
                );
                None
            }
        }
    }

    async fn fast_market_cap(&self, symbol: &Symbol) -> Option<f64> {
        match self
            .with_retry(symbol, "fast_market_cap", || {
                self.provider.fast_market_cap(symbol)
            })
            .await
        {
            Ok(cap) => cap.filter(|cap| is_usable_cap(*cap)),
            Err(failure) => {
                debug!(%symbol, error = %failure.error, "fast market cap unavailable");
                None
            }
        }
    }

    async fn with_retry<T, F, Fut>(
        &self,
        symbol: &Symbol,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, CallFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let policy = &self.config.retry;
        let max_attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let (outcome, timed_out) =
                match tokio::time::timeout(self.config.call_timeout, call()).await {
                    Ok(outcome) => (outcome, false),
                    Err(_) => (
                        Err(SourceError::unavailable(format!(
                            "{operation} timed out after {}ms",
                            self.config.call_timeout.as_millis()
                        ))),
                        true,
                    ),
                };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let should_retry = attempt < max_attempts
                && (error.is_rate_limited() || (timed_out && policy.retry_on_timeout));
            if !should_retry {
                return Err(CallFailure {
                    error,
                    attempts: attempt,
                });
            }

            let delay = policy.delay_for_attempt(attempt - 1);
            warn!(
                %symbol,
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "provider call failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn history_failure(symbol: &Symbol, failure: CallFailure) -> ResolveError {
    let symbol = symbol.clone();
    match failure.error.kind() {
        SourceErrorKind::NotFound => ResolveError::NoData { symbol },
        SourceErrorKind::RateLimited => ResolveError::RateLimited {
            symbol,
            attempts: failure.attempts,
        },
        SourceErrorKind::Unavailable
        | SourceErrorKind::InvalidResponse
        | SourceErrorKind::Internal => ResolveError::Unavailable {
            symbol,
            message: failure.error.message().to_owned(),
        },
    }
}

/// Sorts by date and keeps the last close per date.
fn normalize_history(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.sort_by_key(|point| point.date);
    points.reverse();
    points.dedup_by_key(|point| point.date);
    points.reverse();
    points
}

fn is_usable_cap(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
