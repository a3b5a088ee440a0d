use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::external::data_provider::{DataProviderError, FinancialDataProvider, NewsFeed};
use crate::models::{CompanyProfile, StatementKind, StatementTable};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Profile(String),
    Statement(String, StatementKind),
    Peers(String),
    News(String),
}

#[derive(Debug, Clone)]
enum CachedValue {
    Profile(CompanyProfile),
    Statement(StatementTable),
    Peers(Vec<String>),
    News(NewsFeed),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// An expiry past chrono's range never arrives
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.fetched_at
            .checked_add_signed(ttl)
            .is_some_and(|expires_at| now >= expires_at)
    }
}

/// Memoizes successful lookups per symbol for a fixed TTL.
///
/// Failures pass straight through and are never stored, so a bad API key or
/// a transient outage does not stick.
pub struct CachedProvider {
    inner: Arc<dyn FinancialDataProvider>,
    cache: Arc<DashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn FinancialDataProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<CachedValue> {
        if let Some(entry) = self.cache.get(key) {
            if !entry.is_expired(Utc::now(), self.ttl) {
                return Some(entry.value.clone());
            }
            drop(entry); // release the read lock before removing
            self.cache.remove(key);
        }
        None
    }

    fn store(&self, key: CacheKey, value: CachedValue) {
        self.cache.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Drop every entry whose TTL has elapsed; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let ttl = self.ttl;
        let before = self.cache.len();
        self.cache.retain(|_, entry| !entry.is_expired(now, ttl));
        before.saturating_sub(self.cache.len())
    }

    /// Sweep expired entries every `period` in the background, so symbols
    /// that are never asked for again do not stay in memory.
    pub fn spawn_cleanup(self: &Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = period.max(std::time::Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired();
                if removed > 0 {
                    info!("Evicted {} expired cache entries, {} left", removed, cache.len());
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[async_trait]
impl FinancialDataProvider for CachedProvider {
    async fn company_profile(
        &self,
        api_key: &str,
        symbol: &str,
    ) -> Result<CompanyProfile, DataProviderError> {
        let key = CacheKey::Profile(symbol.to_string());
        if let Some(CachedValue::Profile(p)) = self.lookup(&key) {
            debug!("Cache hit: profile {}", symbol);
            return Ok(p);
        }
        let profile = self.inner.company_profile(api_key, symbol).await?;
        self.store(key, CachedValue::Profile(profile.clone()));
        Ok(profile)
    }

    async fn statement(
        &self,
        api_key: &str,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<StatementTable, DataProviderError> {
        let key = CacheKey::Statement(symbol.to_string(), kind);
        if let Some(CachedValue::Statement(t)) = self.lookup(&key) {
            debug!("Cache hit: {} {}", kind, symbol);
            return Ok(t);
        }
        let table = self.inner.statement(api_key, symbol, kind).await?;
        self.store(key, CachedValue::Statement(table.clone()));
        Ok(table)
    }

    async fn peers(&self, api_key: &str, symbol: &str) -> Result<Vec<String>, DataProviderError> {
        let key = CacheKey::Peers(symbol.to_string());
        if let Some(CachedValue::Peers(p)) = self.lookup(&key) {
            debug!("Cache hit: peers {}", symbol);
            return Ok(p);
        }
        let peers = self.inner.peers(api_key, symbol).await?;
        self.store(key, CachedValue::Peers(peers.clone()));
        Ok(peers)
    }

    async fn news(&self, api_key: &str, symbol: &str) -> Result<NewsFeed, DataProviderError> {
        let key = CacheKey::News(symbol.to_string());
        if let Some(CachedValue::News(n)) = self.lookup(&key) {
            debug!("Cache hit: news {}", symbol);
            return Ok(n);
        }
        let feed = self.inner.news(api_key, symbol).await?;
        self.store(key, CachedValue::News(feed.clone()));
        Ok(feed)
    }
}
