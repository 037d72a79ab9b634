//! Market data provider contract consumed by the snapshot resolver.
//!
//! # Operations
//!
//! - `full_price_history` returns `Vec<PricePoint>`; an empty list means an
//!   unknown ticker.
//! - `profile` returns [`ProfileFields`]; any field may be absent.
//! - `fast_market_cap` returns `Option<f64>`; absence is not an error.
//! - `mutual_fund_holders` returns `Option<Vec<FundHolder>>`; `None` means the
//!   listing is unavailable.
//!
//! Every operation may fail with [`SourceErrorKind::RateLimited`], which callers
//! can tell apart from [`SourceErrorKind::NotFound`] to decide whether to retry.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{FundHolder, PricePoint, ProviderId, Symbol};

/// Boxed future returned by provider operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Best-effort company profile. Absence of any field is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub short_name: Option<String>,
}

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    NotFound,
    RateLimited,
    Unavailable,
    InvalidResponse,
    Internal,
}

/// Structured provider error used by the resolver retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self.kind, SourceErrorKind::RateLimited)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Read-only market data provider.
///
/// Implementations must be `Send + Sync`; the resolver may be shared across tasks.
pub trait MarketDataProvider: Send + Sync {
    /// Identifier recorded in output metadata.
    fn id(&self) -> ProviderId;

    /// Full daily close history, ascending by date. Empty for unknown tickers.
    fn full_price_history<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, Vec<PricePoint>>;

    /// Sector, industry, market cap and short name, each optional.
    fn profile<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, ProfileFields>;

    /// Cheaper capitalization figure used only as a fallback.
    fn fast_market_cap<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, Option<f64>>;

    /// Mutual fund holders in provider order, `None` when the provider has no table.
    fn mutual_fund_holders<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> ProviderFuture<'a, Option<Vec<FundHolder>>>;
}

impl<P> MarketDataProvider for std::sync::Arc<P>
where
    P: MarketDataProvider + ?Sized,
{
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn full_price_history<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, Vec<PricePoint>> {
        (**self).full_price_history(symbol)
    }

    fn profile<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, ProfileFields> {
        (**self).profile(symbol)
    }

    fn fast_market_cap<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, Option<f64>> {
        (**self).fast_market_cap(symbol)
    }

    fn mutual_fund_holders<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> ProviderFuture<'a, Option<Vec<FundHolder>>> {
        (**self).mutual_fund_holders(symbol)
    }
}
