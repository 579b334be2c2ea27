//! Cache-policy-aware request context.
//!
//! Every outbound adapter call passes through [`RequestContext::execute`],
//! the single choke point that decides between cache and network per
//! [`CachePolicy`] and guarantees at most one in-flight fetch per key.
//!
//! Coalescing uses a `DashMap` keyed by the rendered cache key plus a
//! `tokio::sync::broadcast` channel per flight: the first caller spawns the
//! fetch as a detached task and everyone (leader included) waits on the
//! broadcast, so cancelling any single caller never tears down a fetch other
//! waiters depend on.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::error::RepoError;
use crate::local::LocalDb;
use crate::types::Repository;

/// Per-call knob controlling how a request may use cache and network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve a fresh cached value, otherwise fetch and store.
    Normal,
    /// Serve from cache only. A miss yields `None`; the network is never
    /// touched and the call never joins an in-flight fetch.
    OnlyCached,
    /// Always fetch. Overwrites the cache on success; a failed fetch leaves
    /// the previous entry untouched.
    ForceRefresh,
}

/// Deterministic cache key derived from the call signature.
///
/// Two logically identical requests (same adapter, operation and arguments)
/// render to the same key regardless of call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    repository: &'static str,
    operation: &'static str,
    args: String,
}

impl CacheKey {
    pub fn new(repository: Repository, operation: &'static str, args: &[&str]) -> Self {
        Self {
            repository: repository.as_str(),
            operation,
            args: args.join(":"),
        }
    }

    fn render(&self) -> String {
        format!("{}:{}:{}", self.repository, self.operation, self.args)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// A cached response with its write time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: String,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.stored_at);
        // a timestamp from the future (clock skew) counts as fresh
        age.to_std().map_or(true, |age| age <= ttl)
    }
}

/// Where cached responses live.
///
/// Only the request context writes through this; every other component sees
/// the cache read-only via [`RequestContext::execute`].
#[derive(Clone)]
pub enum CacheStore {
    /// Persistent store sharing the installed-projects database.
    Sqlite(LocalDb),
    /// Ephemeral in-process store.
    Memory(Arc<DashMap<String, CacheEntry>>),
}

impl CacheStore {
    pub fn memory() -> Self {
        CacheStore::Memory(Arc::new(DashMap::new()))
    }

    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, RepoError> {
        match self {
            CacheStore::Sqlite(db) => {
                let Some((payload, stored_at)) = db
                    .read_cache(key)
                    .await
                    .map_err(|err| RepoError::Cache(err.to_string()))?
                else {
                    return Ok(None);
                };
                match DateTime::parse_from_rfc3339(&stored_at) {
                    Ok(stored_at) => Ok(Some(CacheEntry {
                        payload,
                        stored_at: stored_at.with_timezone(&Utc),
                    })),
                    Err(_) => {
                        warn!(key, "cache entry has unreadable timestamp, treating as miss");
                        Ok(None)
                    }
                }
            }
            CacheStore::Memory(map) => Ok(map.get(key).map(|entry| entry.clone())),
        }
    }

    async fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), RepoError> {
        match self {
            CacheStore::Sqlite(db) => db
                .write_cache(key, &entry.payload, &entry.stored_at.to_rfc3339())
                .await
                .map_err(|err| RepoError::Cache(err.to_string())),
            CacheStore::Memory(map) => {
                map.insert(key.to_string(), entry.clone());
                Ok(())
            }
        }
    }

    async fn clear(&self) -> Result<u64, RepoError> {
        match self {
            CacheStore::Sqlite(db) => db
                .clear_cache()
                .await
                .map_err(|err| RepoError::Cache(err.to_string())),
            CacheStore::Memory(map) => {
                let count = map.len() as u64;
                map.clear();
                Ok(count)
            }
        }
    }
}

type FlightResult = Result<CacheEntry, RepoError>;

/// The single entry point for all adapter requests.
#[derive(Clone)]
pub struct RequestContext {
    store: CacheStore,
    in_flight: Arc<DashMap<String, broadcast::Sender<FlightResult>>>,
    ttl: Duration,
}

impl RequestContext {
    pub fn new(store: CacheStore, ttl: Duration) -> Self {
        Self {
            store,
            in_flight: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Run `fetch` under `policy`, keyed by `key`.
    ///
    /// Returns `Ok(None)` on a cache miss under [`CachePolicy::OnlyCached`]
    /// and when the upstream reports the resource as not found; fetch errors
    /// propagate unchanged and never evict an existing cache entry.
    pub async fn execute<T, F, Fut>(
        &self,
        policy: CachePolicy,
        key: CacheKey,
        fetch: F,
    ) -> Result<Option<T>, RepoError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepoError>> + Send + 'static,
    {
        let key = key.render();
        match policy {
            CachePolicy::OnlyCached => {
                let Some(entry) = self.store.read(&key).await? else {
                    return Ok(None);
                };
                Ok(decode(&key, &entry))
            }
            CachePolicy::Normal => {
                if let Some(entry) = self.store.read(&key).await? {
                    if entry.is_fresh(self.ttl) {
                        // A structurally invalid entry falls through to a
                        // fresh fetch instead of poisoning the call.
                        if let Some(value) = decode(&key, &entry) {
                            return Ok(Some(value));
                        }
                    }
                }
                self.fetch_shared(key, fetch).await
            }
            CachePolicy::ForceRefresh => self.fetch_shared(key, fetch).await,
        }
    }

    /// Write `value` under `key` without fetching.
    ///
    /// Lets a slug-keyed fetch also populate the id-keyed entries that
    /// cached-only resolution reads later.
    pub async fn prime<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), RepoError> {
        let entry = CacheEntry {
            payload: serde_json::to_string(value)?,
            stored_at: Utc::now(),
        };
        self.store.write(&key.render(), &entry).await
    }

    /// Drop every cached response. Returns the number of removed entries.
    pub async fn clear(&self) -> Result<u64, RepoError> {
        self.store.clear().await
    }

    async fn fetch_shared<T, F, Fut>(&self, key: String, fetch: F) -> Result<Option<T>, RepoError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepoError>> + Send + 'static,
    {
        let mut rx = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                debug!(key = %key, "joining in-flight fetch");
                entry.get().subscribe()
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = broadcast::channel(16);
                entry.insert(tx.clone());

                let store = self.store.clone();
                let in_flight = Arc::clone(&self.in_flight);
                let fut = fetch();
                // Detached: the flight must outlive any single caller's
                // cancellation scope, since other waiters share its result.
                tokio::spawn(async move {
                    let result: FlightResult = match fut.await {
                        Ok(value) => match serde_json::to_string(&value) {
                            Ok(payload) => {
                                let entry = CacheEntry {
                                    payload,
                                    stored_at: Utc::now(),
                                };
                                if let Err(err) = store.write(&key, &entry).await {
                                    warn!(key = %key, error = %err, "failed to store cache entry");
                                }
                                Ok(entry)
                            }
                            Err(err) => Err(RepoError::from(err)),
                        },
                        Err(err) => Err(err),
                    };
                    // Remove before broadcasting so callers arriving after
                    // completion start a fresh fetch instead of subscribing
                    // to a finished flight.
                    in_flight.remove(&key);
                    let _ = tx.send(result);
                });
                rx
            }
        };

        match rx.recv().await {
            Ok(Ok(entry)) => serde_json::from_str(&entry.payload)
                .map(Some)
                .map_err(RepoError::from),
            Ok(Err(RepoError::NotFound(what))) => {
                debug!(what = %what, "upstream reports not found");
                Ok(None)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(RepoError::Transport(
                "in-flight fetch dropped before completing".to_string(),
            )),
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, entry: &CacheEntry) -> Option<T> {
    match serde_json::from_str(&entry.payload) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "cache entry is structurally invalid, treating as miss");
            None
        }
    }
}
