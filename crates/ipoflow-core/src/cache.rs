//! In-memory TTL caching in front of a provider.
//!
//! Entries are keyed by ticker and replaced wholesale on refresh; values are
//! shared as `Arc`s and never mutated in place. The lock is only held around
//! map access, never across an upstream call, so a dropped query leaves the
//! cache consistent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::provider::{MarketDataProvider, ProfileFields, ProviderFuture, SourceError};
use crate::{FundHolder, PricePoint, ProviderId, Symbol};

/// Time-to-live per data family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Price history, profile and fast market cap.
    pub market_data: Duration,
    pub fund_holders: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            market_data: Duration::from_secs(60 * 60),
            fund_holders: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

/// Thread-safe TTL map of shared values.
#[derive(Debug)]
pub struct CacheStore<V> {
    inner: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    ttl: Duration,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
        }
    }
}

impl<V> CacheStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Live entry for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let map = self.inner.read().await;
        map.get(key).and_then(|entry| {
            if Instant::now() < entry.expires_at {
                Some(Arc::clone(&entry.value))
            } else {
                None
            }
        })
    }

    /// Replace the entry for `key`. A zero TTL disables storage.
    pub async fn put(&self, key: impl Into<String>, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if self.ttl.is_zero() {
            return value;
        }

        let entry = CacheEntry {
            value: Arc::clone(&value),
            expires_at: Instant::now() + self.ttl,
        };
        self.inner.write().await.insert(key.into(), entry);
        value
    }

    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.inner.write().await.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Provider decorator that memoizes successful calls per ticker.
///
/// Errors are never cached.
#[derive(Debug, Clone)]
pub struct CachedProvider<P> {
    provider: P,
    history: CacheStore<Vec<PricePoint>>,
    profiles: CacheStore<ProfileFields>,
    fast_caps: CacheStore<Option<f64>>,
    holders: CacheStore<Option<Vec<FundHolder>>>,
}

impl<P> CachedProvider<P> {
    pub fn new(provider: P) -> Self {
        Self::with_ttls(provider, CacheTtls::default())
    }

    pub fn with_ttls(provider: P, ttls: CacheTtls) -> Self {
        Self {
            provider,
            history: CacheStore::new(ttls.market_data),
            profiles: CacheStore::new(ttls.market_data),
            fast_caps: CacheStore::new(ttls.market_data),
            holders: CacheStore::new(ttls.fund_holders),
        }
    }
}

macro_rules! cached_call {
    ($self:ident, $store:ident, $symbol:ident, $operation:literal, $call:expr) => {
        Box::pin(async move {
            if let Some(hit) = $self.$store.get($symbol.as_str()).await {
                debug!(symbol = %$symbol, operation = $operation, "cache hit");
                return Ok((*hit).clone());
            }
            let fresh = $call.await?;
            let stored = $self.$store.put($symbol.as_str(), fresh).await;
            Ok::<_, SourceError>((*stored).clone())
        })
    };
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn id(&self) -> ProviderId {
        self.provider.id()
    }

    fn full_price_history<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> ProviderFuture<'a, Vec<PricePoint>> {
        cached_call!(
            self,
            history,
            symbol,
            "full_price_history",
            self.provider.full_price_history(symbol)
        )
    }

    fn profile<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, ProfileFields> {
        cached_call!(self, profiles, symbol, "profile", self.provider.profile(symbol))
    }

    fn fast_market_cap<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, Option<f64>> {
        cached_call!(
            self,
            fast_caps,
            symbol,
            "fast_market_cap",
            self.provider.fast_market_cap(symbol)
        )
    }

    fn mutual_fund_holders<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> ProviderFuture<'a, Option<Vec<FundHolder>>> {
        cached_call!(
            self,
            holders,
            symbol,
            "mutual_fund_holders",
            self.provider.mutual_fund_holders(symbol)
        )
    }
}
