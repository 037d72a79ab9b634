//! # ipoflow core
//!
//! Post-IPO catalyst tracking: resolve a ticker into a market snapshot, then
//! derive regulatory deadlines, maturity and expected passive-index inclusions.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo Finance, offline mode) |
//! | [`cache`] | TTL cache and caching provider decorator |
//! | [`domain`] | Domain models (Symbol, TradeDate, PriceSeries, MarketSnapshot) |
//! | [`engine`] | Catalyst inference rules |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Validation errors |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Market data provider trait and source errors |
//! | [`provider_policy`] | Per-provider request budget and timeout |
//! | [`report`] | Presentation view model |
//! | [`resolver`] | Snapshot resolver with retry and degradation |
//! | [`retry`] | Backoff policies |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Client-side request budget |
//! | [`tracker`] | End-to-end report pipeline |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ipoflow_core::{track, SectorOverride, SnapshotResolver, Symbol, TradeDate, YahooAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = SnapshotResolver::new(YahooAdapter::default());
//!     let symbol = Symbol::parse("arm")?;
//!
//!     let today = TradeDate::today_utc();
//!     let report = track(&resolver, &symbol, today, SectorOverride::AutoDetect).await?;
//!     println!("{} is a {}", report.symbol, report.status_label);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  CLI / User      │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ SnapshotResolver │────▶│ RetryPolicy      │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ CachedProvider   │────▶│ YahooAdapter     │──▶ HttpClient
//! └────────┬─────────┘     └──────────────────┘
//!          │ MarketSnapshot
//!          ▼
//! ┌──────────────────┐
//! │ engine (pure)    │──▶ CatalystReport
//! └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Only a missing or throttled price history aborts a query:
//!
//! ```rust
//! use ipoflow_core::ResolveError;
//!
//! fn explain(error: &ResolveError) -> &'static str {
//!     match error {
//!         ResolveError::NoData { .. } => "check the ticker",
//!         ResolveError::RateLimited { .. } => "try again later",
//!         _ => "upstream problem",
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod provider_policy;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod source;
pub mod throttling;
pub mod tracker;

// Adapter implementations
pub use adapters::YahooAdapter;

// Caching
pub use cache::{CacheStore, CacheTtls, CachedProvider};

// Domain models
pub use domain::{
    Degradation, FundHolder, MarketSnapshot, PricePoint, PriceSeries, Security, Symbol, TradeDate,
    UNKNOWN_LABEL,
};

// Inference engine
pub use engine::{
    assess, CatalystAssessment, Deadline, DeadlineKind, DeadlineStatus, InclusionPrediction,
    Probability, ReturnMetrics, SectorCategory, SectorOverride,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};

// Error types
pub use error::ValidationError;

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

// Provider contract
pub use provider::{MarketDataProvider, ProfileFields, ProviderFuture, SourceError, SourceErrorKind};

// Provider policies
pub use provider_policy::ProviderPolicy;

// Report view model
pub use report::{build_report, CatalystReport, HolderTable, MaturityStatus, Outlook};

// Resolution
pub use resolver::{ResolveError, ResolverConfig, SnapshotResolver};

// Retry logic
pub use retry::{Backoff, RetryPolicy};

// Source identifiers
pub use source::ProviderId;

// Throttling
pub use throttling::RequestBudget;

// Pipeline
pub use tracker::track;
