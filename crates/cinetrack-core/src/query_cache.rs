use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use cinetrack_config::CacheConfig;
use crate::keys::QueryKey;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

type InFlight = Shared<BoxFuture<'static, Result<Value, String>>>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{key} failed: {message}")]
    Load { key: String, message: String },
    #[error("cached value for {key} has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What a reader of one key currently sees
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Idle,
    Pending,
    Success(Value),
    Error(String),
}

#[derive(Default)]
struct Slot {
    value: Option<Value>,
    error: Option<String>,
    updated_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<(u64, InFlight)>,
}

impl Slot {
    /// Forget the registered load; it still answers its own waiters but can
    /// no longer settle this slot
    fn detach(&mut self, key: &QueryKey) {
        if self.in_flight.take().is_some() {
            debug!("Detached in-flight fetch: {}", key);
        }
    }

    fn fresh_value(&self, ttl: Duration) -> Option<&Value> {
        let updated_at = self.updated_at?;
        if self.invalidated || updated_at.elapsed() >= ttl {
            return None;
        }
        self.value.as_ref()
    }
}

/// Key-addressed cache of async results
///
/// Values are kept as JSON so a snapshot taken before an optimistic patch
/// compares equal to what gets restored. The lock is never held across an
/// `.await`.
pub struct QueryCache {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    ttl: Duration,
    next_fetch: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(key: &QueryKey, value: Value) -> Result<T, QueryError> {
    serde_json::from_value(value).map_err(|source| QueryError::Decode { key: key.to_string(), source })
}

pub(crate) fn encode<T: Serialize>(key: &QueryKey, value: &T) -> Result<Value, QueryError> {
    serde_json::to_value(value).map_err(|source| QueryError::Decode { key: key.to_string(), source })
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
            next_fetch: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        // Slots are replaced whole, so a poisoned map is still consistent
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the cached value if fresh, otherwise load it
    ///
    /// Concurrent callers for the same key share one in-flight load; only the
    /// first caller's `loader` runs. A failed load is recorded as the key's
    /// error state and returned to every waiter. There is no retry.
    pub async fn fetch<T, E, F, Fut>(&self, key: &QueryKey, loader: F) -> Result<T, QueryError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        E: fmt::Display + Send + 'static,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (fetch_id, in_flight) = {
            let mut slots = self.lock();
            let slot = slots.entry(key.clone()).or_default();
            if let Some(value) = slot.fresh_value(self.ttl) {
                debug!("Cache hit: {}", key);
                return decode(key, value.clone());
            }
            match &slot.in_flight {
                Some((id, shared)) => {
                    debug!("Joining in-flight fetch: {}", key);
                    (*id, shared.clone())
                }
                None => {
                    debug!("Cache miss: {}", key);
                    let id = self.next_fetch.fetch_add(1, Ordering::Relaxed);
                    let load = loader();
                    let shared = async move {
                        let loaded = load.await.map_err(|e| e.to_string())?;
                        serde_json::to_value(loaded).map_err(|e| e.to_string())
                    }
                    .boxed()
                    .shared();
                    slot.in_flight = Some((id, shared.clone()));
                    (id, shared)
                }
            }
        };

        let result = in_flight.await;

        {
            let mut slots = self.lock();
            if let Some(slot) = slots.get_mut(key) {
                // Only the fetch that is still registered may settle the slot
                if matches!(&slot.in_flight, Some((id, _)) if *id == fetch_id) {
                    slot.in_flight = None;
                    match &result {
                        Ok(value) => {
                            slot.value = Some(value.clone());
                            slot.error = None;
                            slot.updated_at = Some(Instant::now());
                            slot.invalidated = false;
                        }
                        Err(message) => {
                            warn!("Query {} failed: {}", key, message);
                            slot.error = Some(message.clone());
                        }
                    }
                }
            }
        }

        match result {
            Ok(value) => decode(key, value),
            Err(message) => Err(QueryError::Load { key: key.to_string(), message }),
        }
    }

    pub fn state(&self, key: &QueryKey) -> QueryState {
        let slots = self.lock();
        let Some(slot) = slots.get(key) else {
            return QueryState::Idle;
        };
        match (&slot.value, &slot.error, &slot.in_flight) {
            (_, Some(message), None) => QueryState::Error(message.clone()),
            (Some(value), _, _) => QueryState::Success(value.clone()),
            (None, _, Some(_)) => QueryState::Pending,
            (None, None, None) => QueryState::Idle,
        }
    }

    /// Whether a load is registered for `key`, with or without a cached value
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.lock().get(key).is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Current value regardless of freshness
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>, QueryError> {
        let value = self.lock().get(key).and_then(|slot| slot.value.clone());
        value.map(|v| decode(key, v)).transpose()
    }

    pub fn set<T: Serialize>(&self, key: &QueryKey, value: &T) -> Result<(), QueryError> {
        let value = encode(key, value)?;
        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_default();
        slot.detach(key);
        slot.value = Some(value);
        slot.error = None;
        slot.updated_at = Some(Instant::now());
        slot.invalidated = false;
        Ok(())
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock()
            .get(key)
            .map_or(true, |slot| slot.fresh_value(self.ttl).is_none())
    }

    /// Mark every key under `prefix` stale; returns how many were marked
    ///
    /// A load already running for a marked key started before the change
    /// and is detached, so the next read fetches again.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let mut slots = self.lock();
        let mut marked = 0;
        for (key, slot) in slots.iter_mut() {
            if key.starts_with(prefix) {
                slot.invalidated = true;
                slot.detach(key);
                marked += 1;
            }
        }
        if marked > 0 {
            debug!("Invalidated {} entries under {}", marked, prefix);
        }
        marked
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Read-modify-write of one key's value in a single critical section
    ///
    /// `update` sees the current value and returns the replacement (`None`
    /// leaves the key without a value). Returns the value that was replaced.
    /// Any in-flight load for the key is detached so it cannot write over
    /// the new value.
    pub(crate) fn replace_value<F>(&self, key: &QueryKey, update: F) -> Result<Option<Value>, QueryError>
    where
        F: FnOnce(Option<&Value>) -> Result<Option<Value>, QueryError>,
    {
        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_default();
        let replacement = update(slot.value.as_ref())?;
        slot.detach(key);
        if replacement.is_some() && slot.updated_at.is_none() {
            slot.updated_at = Some(Instant::now());
        }
        Ok(std::mem::replace(&mut slot.value, replacement))
    }
}
