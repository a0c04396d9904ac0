use core::time::Duration;

use crate::store::{CoordinationStore, StoreResult};

/// A best-effort mutual-exclusion lock held in the coordination store.
///
/// The lock is a single key holding a random token with a short TTL. It is only
/// as strong as the store's atomic create-if-absent and the get-then-delete
/// release: if the holder stalls past `ttl`, another node can take the lock
/// and both will believe they hold it. Callers must not rely on it for
/// anything stronger than reducing contention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLock {
    key: String,
    token: String,
    ttl: Duration,
}

impl StoreLock {
    /// Tries to take the lock at `key` with a fresh random token.
    ///
    /// Returns `Ok(None)` if someone else currently holds it.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn try_acquire<S: CoordinationStore>(
        store: &S,
        key: &str,
        ttl: Duration,
    ) -> StoreResult<Option<Self>> {
        let lock = Self {
            key: key.to_owned(),
            token: new_token(),
            ttl,
        };
        if store.create_if_absent(&lock.key, &lock.token, ttl).await? {
            tracing::trace!(key, "lock acquired");
            Ok(Some(lock))
        } else {
            Ok(None)
        }
    }

    /// Deletes the lock only if it still holds this lock's token.
    ///
    /// Returns whether the key was deleted. A `false` means the lock expired
    /// and was possibly taken over by another node, which is left alone.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn release_if_owned<S: CoordinationStore>(&self, store: &S) -> StoreResult<bool> {
        let current = store.get(&self.key).await?;
        if current.as_deref() == Some(self.token.as_str()) {
            store.delete(&self.key).await?;
            tracing::trace!(key = %self.key, "lock released");
            Ok(true)
        } else {
            tracing::debug!(key = %self.key, "lock no longer owned, leaving it in place");
            Ok(false)
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

fn new_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}
