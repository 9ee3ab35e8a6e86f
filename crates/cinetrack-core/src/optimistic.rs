use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use crate::keys::QueryKey;
use crate::query_cache::{decode, encode, QueryCache, QueryError};

/// A patch applied to one cache key ahead of the server's answer
///
/// Holds the exact value the key had before the patch (or its absence).
/// Settle it with [`confirm`](Self::confirm), [`commit`](Self::commit) or
/// [`rollback`](Self::rollback); dropping it unsettled rolls back.
#[must_use = "an unsettled optimistic update rolls back when dropped"]
pub struct OptimisticUpdate<'a> {
    cache: &'a QueryCache,
    key: QueryKey,
    snapshot: Option<Value>,
    settled: bool,
}

impl QueryCache {
    /// Snapshot `key` and apply `patch` in one critical section
    ///
    /// `patch` receives the current value (`None` when the key holds
    /// nothing) and returns the provisional one.
    pub fn optimistic<T, F>(&self, key: &QueryKey, patch: F) -> Result<OptimisticUpdate<'_>, QueryError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> Option<T>,
    {
        let snapshot = self.replace_value(key, |current| {
            let typed = current.map(|v| decode::<T>(key, v.clone())).transpose()?;
            patch(typed).map(|t| encode(key, &t)).transpose()
        })?;
        debug!("Applied optimistic patch to {}", key);
        Ok(OptimisticUpdate {
            cache: self,
            key: key.clone(),
            snapshot,
            settled: false,
        })
    }
}

impl OptimisticUpdate<'_> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn snapshot(&self) -> Option<&Value> {
        self.snapshot.as_ref()
    }

    /// Keep the patch, letting `reconcile` swap provisional data for the
    /// authoritative record. Skipped when the key holds nothing.
    pub fn confirm<T, F>(mut self, reconcile: F) -> Result<(), QueryError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(T) -> T,
    {
        let key = self.key.clone();
        self.cache.replace_value(&key, |current| match current {
            Some(value) => {
                let reconciled = reconcile(decode::<T>(&key, value.clone())?);
                encode(&key, &reconciled).map(Some)
            }
            None => Ok(None),
        })?;
        self.settled = true;
        Ok(())
    }

    /// Keep the patch as applied
    pub fn commit(mut self) {
        self.settled = true;
    }

    /// Put back exactly what the key held before the patch
    pub fn rollback(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;
        let snapshot = self.snapshot.take();
        let restored = self.cache.replace_value(&self.key, |_| Ok(snapshot));
        if let Err(e) = restored {
            warn!("Failed to roll back {}: {}", self.key, e);
        } else {
            warn!("Rolled back optimistic patch on {}", self.key);
        }
    }
}

impl Drop for OptimisticUpdate<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}
