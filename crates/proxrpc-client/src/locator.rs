//! Resolution of indirect references
//!
//! An indirect reference names an object adapter (`printer @ Printers`) or
//! just a well-known identity (`printer`). Before an invocation can be sent,
//! a [`Locator`] service turns that name into endpoints.
//!
//! # Caching
//!
//! Answers are kept in a [`LocatorCache`] shared by every proxy resolving
//! through the same locator. The cache lock is only held to look up or
//! update an entry, never across the locator round trip, so lookups for
//! unrelated keys are not serialized. Two tasks missing on the same key both
//! ask the locator; the last answer wins.
//!
//! After [`LocatorInfo::invalidate`] the next resolution of that key always
//! goes back to the locator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use proxrpc_common::config::names;
use proxrpc_common::{
    Endpoint, Failure, Identity, LocatorKey, LookupKind, Properties, Reference, Target,
};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::trace::{TraceLevels, LOCATOR_TARGET};

/// Client side of the locator service.
///
/// `Ok(None)` means the locator does not know the adapter or object.
pub trait Locator: Send + Sync {
    /// Reference for the adapter `adapter_id`, normally direct.
    fn find_adapter_by_id<'a>(
        &'a self,
        adapter_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Reference>, Failure>>;

    /// Reference for the well-known object `identity`. Either direct or
    /// indirect through an adapter.
    fn find_object_by_id<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> BoxFuture<'a, Result<Option<Reference>, Failure>>;
}

/// A cached locator answer.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub reference: Arc<Reference>,
    /// Increases with every insert into the cache, across all keys.
    pub version: u64,
    pub inserted_at: Instant,
}

/// Locator answers keyed by adapter id or object identity.
#[derive(Debug)]
pub struct LocatorCache {
    entries: RwLock<HashMap<LocatorKey, CacheEntry>>,
    next_version: AtomicU64,
    /// `None` keeps entries until invalidated.
    ttl: Option<Duration>,
}

impl LocatorCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_version: AtomicU64::new(1),
            ttl,
        }
    }

    /// Cache configured by `Proxrpc.Default.LocatorCacheTimeout` (seconds).
    /// A negative value never expires entries; `0` disables caching.
    pub fn from_properties(props: &Properties) -> Self {
        let timeout = props.get_property_as_int_with_default(names::LOCATOR_CACHE_TIMEOUT, -1);
        let ttl = u64::try_from(timeout).ok().map(Duration::from_secs);
        Self::new(ttl)
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Entry for `key` unless it is missing or older than the TTL.
    pub async fn get(&self, key: &LocatorKey) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        match self.ttl {
            Some(ttl) if entry.inserted_at.elapsed() >= ttl => None,
            _ => Some(entry.clone()),
        }
    }

    /// Stores `reference` under `key`, replacing any previous entry.
    ///
    /// # Returns
    ///
    /// The version of the new entry, or `None` when caching is disabled.
    pub async fn insert(&self, key: LocatorKey, reference: Arc<Reference>) -> Option<u64> {
        if self.ttl == Some(Duration::ZERO) {
            return None;
        }
        let version = self.next_version.fetch_add(1, Ordering::AcqRel);
        let entry = CacheEntry {
            reference,
            version,
            inserted_at: Instant::now(),
        };
        self.entries.write().await.insert(key, entry);
        Some(version)
    }

    pub async fn remove(&self, key: &LocatorKey) -> Option<CacheEntry> {
        self.entries.write().await.remove(key)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// A locator together with the cache of its answers.
pub struct LocatorInfo {
    locator: Arc<dyn Locator>,
    cache: LocatorCache,
    trace: TraceLevels,
}

impl LocatorInfo {
    pub fn new(locator: Arc<dyn Locator>, cache: LocatorCache, trace: TraceLevels) -> Self {
        Self {
            locator,
            cache,
            trace,
        }
    }

    pub fn cache(&self) -> &LocatorCache {
        &self.cache
    }

    /// Resolves `reference` to a direct reference.
    ///
    /// Direct references come back unchanged. Indirect ones keep their
    /// identity, facet and mode and get the endpoints the locator (or its
    /// cache) reports. Endpoints cached on the reference itself are ignored,
    /// so an [`invalidate`](Self::invalidate) always leads to a fresh lookup.
    ///
    /// # Errors
    ///
    /// - [`Failure::NotRegistered`] if the locator does not know the adapter
    ///   or object
    /// - [`Failure::NoEndpoint`] if the answer carries no endpoints
    /// - whatever failure the locator call itself reports
    pub async fn resolve(&self, reference: &Reference) -> Result<Arc<Reference>, Failure> {
        let endpoints = match &reference.target {
            Target::Direct { .. } => return Ok(Arc::new(reference.clone())),
            Target::Indirect {
                adapter_id: Some(adapter_id),
                ..
            } => self.adapter_endpoints(adapter_id).await?,
            Target::Indirect {
                adapter_id: None, ..
            } => self.object_endpoints(&reference.identity).await?,
        };

        if endpoints.is_empty() {
            return Err(Failure::NoEndpoint(reference.to_string()));
        }
        Ok(Arc::new(reference.with_endpoints(endpoints)))
    }

    /// Drops the cached resolution of `reference`.
    ///
    /// For a well-known object the adapter entry it pointed at is dropped as
    /// well. Nothing happens for direct references or keys not in the cache.
    pub async fn invalidate(&self, reference: &Reference) {
        let Some(key) = reference.locator_key() else {
            return;
        };

        let removed = self.cache.remove(&key).await;
        if self.trace.locator >= 1 {
            debug!(
                target: LOCATOR_TARGET,
                key = %key,
                present = removed.is_some(),
                "removed locator cache entry"
            );
        }

        let pointed_adapter = removed
            .as_ref()
            .filter(|_| matches!(key, LocatorKey::Object(_)))
            .and_then(|entry| entry.reference.adapter_id().map(str::to_string));
        if let Some(adapter_id) = pointed_adapter {
            let adapter_key = LocatorKey::Adapter(adapter_id);
            self.cache.remove(&adapter_key).await;
            if self.trace.locator >= 1 {
                debug!(target: LOCATOR_TARGET, key = %adapter_key, "removed locator cache entry");
            }
        }
    }

    async fn adapter_endpoints(&self, adapter_id: &str) -> Result<Vec<Endpoint>, Failure> {
        let key = LocatorKey::Adapter(adapter_id.to_string());
        if let Some(entry) = self.cached(&key).await {
            return Ok(entry.reference.endpoints().to_vec());
        }

        if self.trace.locator >= 2 {
            debug!(target: LOCATOR_TARGET, adapter_id, "asking locator for adapter");
        }
        let found = self
            .locator
            .find_adapter_by_id(adapter_id)
            .await?
            .ok_or_else(|| Failure::NotRegistered {
                kind: LookupKind::Adapter,
                id: adapter_id.to_string(),
            })?;

        let endpoints = found.endpoints().to_vec();
        self.store(key, found).await;
        Ok(endpoints)
    }

    async fn object_endpoints(&self, identity: &Identity) -> Result<Vec<Endpoint>, Failure> {
        let key = LocatorKey::Object(identity.clone());
        let found = match self.cached(&key).await {
            Some(entry) => entry.reference,
            None => {
                if self.trace.locator >= 2 {
                    debug!(target: LOCATOR_TARGET, identity = %identity, "asking locator for object");
                }
                let found = self
                    .locator
                    .find_object_by_id(identity)
                    .await?
                    .ok_or_else(|| Failure::NotRegistered {
                        kind: LookupKind::Object,
                        id: identity.to_string(),
                    })?;
                self.store(key, found).await
            }
        };

        match found.adapter_id() {
            Some(adapter_id) => self.adapter_endpoints(adapter_id).await,
            None => Ok(found.endpoints().to_vec()),
        }
    }

    async fn cached(&self, key: &LocatorKey) -> Option<CacheEntry> {
        let entry = self.cache.get(key).await;
        if self.trace.locator >= 1 {
            match &entry {
                Some(entry) => debug!(
                    target: LOCATOR_TARGET,
                    key = %key,
                    version = entry.version,
                    endpoints = entry.reference.endpoints().len(),
                    "locator cache hit"
                ),
                None => debug!(target: LOCATOR_TARGET, key = %key, "locator cache miss"),
            }
        }
        entry
    }

    async fn store(&self, key: LocatorKey, found: Reference) -> Arc<Reference> {
        let found = Arc::new(found);
        let version = self.cache.insert(key.clone(), Arc::clone(&found)).await;
        if self.trace.locator >= 1 {
            debug!(
                target: LOCATOR_TARGET,
                key = %key,
                resolved = %found,
                version = ?version,
                "cached locator answer"
            );
        }
        found
    }
}

impl std::fmt::Debug for LocatorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatorInfo")
            .field("cache", &self.cache)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}
