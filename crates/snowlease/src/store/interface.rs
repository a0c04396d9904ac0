use core::{future::Future, time::Duration};
use std::sync::Arc;

use crate::store::StoreResult;

/// The capability set the leasing protocol consumes from a shared key-value
/// store.
///
/// Implementations must make [`create_if_absent`] atomic across every client
/// of the store. All other operations may be plain reads and writes. Expired
/// keys must behave exactly like absent ones.
///
/// [`create_if_absent`]: CoordinationStore::create_if_absent
pub trait CoordinationStore: Send + Sync + 'static {
    /// Creates `key` with `value` and `ttl` only if it does not exist.
    ///
    /// Returns `true` if this call created the key.
    fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Reads the current value of `key`, if present.
    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    /// Deletes `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Resets the time-to-live of `key` to `ttl`.
    ///
    /// Returns `false` if the key no longer exists, in which case nothing is
    /// refreshed.
    fn refresh_ttl(&self, key: &str, ttl: Duration)
    -> impl Future<Output = StoreResult<bool>> + Send;

    /// Reads many keys at once. The result has one entry per key, in order,
    /// with `None` for absent keys.
    fn batch_get(
        &self,
        keys: &[String],
    ) -> impl Future<Output = StoreResult<Vec<Option<String>>>> + Send;
}

impl<S: CoordinationStore> CoordinationStore for Arc<S> {
    fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        (**self).create_if_absent(key, value, ttl)
    }

    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).delete(key)
    }

    fn refresh_ttl(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        (**self).refresh_ttl(key, ttl)
    }

    fn batch_get(
        &self,
        keys: &[String],
    ) -> impl Future<Output = StoreResult<Vec<Option<String>>>> + Send {
        (**self).batch_get(keys)
    }
}
