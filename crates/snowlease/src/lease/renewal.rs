use core::time::Duration;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;

use crate::{
    lease::{Lease, LeaseConfig, RenewalPolicy},
    store::CoordinationStore,
};

/// Lease liveness shared between the renewal task and the generator.
#[derive(Debug)]
struct LeaseState {
    /// Reference point for `deadline_ms`.
    origin: Instant,
    /// Earliest moment the lease record may expire, in ms since `origin`.
    deadline_ms: AtomicU64,
    lost: AtomicBool,
    policy: RenewalPolicy,
}

impl LeaseState {
    fn new(lease: &Lease, lease_ttl: Duration, policy: RenewalPolicy) -> Self {
        let state = Self {
            origin: lease.acquired_at,
            deadline_ms: AtomicU64::new(0),
            lost: AtomicBool::new(false),
            policy,
        };
        state.extend_from(lease.acquired_at, lease_ttl);
        state
    }

    fn extend_from(&self, refreshed_at: Instant, lease_ttl: Duration) {
        let deadline = refreshed_at.saturating_duration_since(self.origin) + lease_ttl;
        self.deadline_ms
            .fetch_max(deadline.as_millis() as u64, Ordering::AcqRel);
    }

    fn deadline(&self) -> Instant {
        self.origin + Duration::from_millis(self.deadline_ms.load(Ordering::Acquire))
    }

    fn mark_lost(&self) {
        self.lost.store(true, Ordering::Release);
    }

    fn is_lost(&self) -> bool {
        if self.lost.load(Ordering::Acquire) {
            return true;
        }
        self.policy == RenewalPolicy::FailClosed && Instant::now() >= self.deadline()
    }
}

/// Handle to the background task that keeps a lease alive.
///
/// The task refreshes the lease TTL every `renew_interval` until it is
/// cancelled. Cancelling stops the ticks and nothing else: the lease record is
/// left to expire on its own. Dropping the handle cancels the task.
///
/// Under [`RenewalPolicy::FailClosed`] the lease counts as lost once its TTL
/// could have run out without a successful refresh, or as soon as a refresh
/// finds the key gone. The task then stops refreshing, since the record may
/// already belong to another node. Under [`RenewalPolicy::FailOpen`] failures
/// are logged and the task keeps trying.
#[derive(Debug)]
pub struct LeaseRenewal {
    worker_id: u64,
    token: CancellationToken,
    state: Arc<LeaseState>,
    handle: Option<JoinHandle<()>>,
}

impl LeaseRenewal {
    /// Spawns the renewal task for `lease` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<S: CoordinationStore>(store: S, lease: &Lease, config: &LeaseConfig) -> Self {
        Self::spawn_with_token(store, lease, config, CancellationToken::new())
    }

    /// Like [`Self::spawn`], but also stops when `token` (or any parent of it)
    /// is cancelled, so one shutdown token can stop every renewal.
    ///
    /// The handle holds a child of `token`: cancelling, shutting down or
    /// dropping it stops only this renewal and leaves `token` untouched.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn_with_token<S: CoordinationStore>(
        store: S,
        lease: &Lease,
        config: &LeaseConfig,
        token: CancellationToken,
    ) -> Self {
        let token = token.child_token();
        let state = Arc::new(LeaseState::new(lease, config.lease_ttl, config.renewal_policy));
        let task = RenewalTask {
            store,
            key: lease.key.clone(),
            worker_id: lease.worker_id,
            lease_ttl: config.lease_ttl,
            renew_interval: config.renew_interval,
            state: Arc::clone(&state),
            token: token.clone(),
        };
        let handle = tokio::spawn(task.run());

        Self {
            worker_id: lease.worker_id,
            token,
            state,
            handle: Some(handle),
        }
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    /// Whether the lease can no longer be trusted. Always `false` under
    /// [`RenewalPolicy::FailOpen`].
    pub fn is_lost(&self) -> bool {
        self.state.is_lost()
    }

    /// Whether the task has exited (cancelled, or stopped after losing the
    /// lease).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signals the task to stop without waiting for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels the task and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(worker_id = self.worker_id, error = %e, "renewal task failed");
            }
        }
    }
}

impl Drop for LeaseRenewal {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct RenewalTask<S> {
    store: S,
    key: String,
    worker_id: u64,
    lease_ttl: Duration,
    renew_interval: Duration,
    state: Arc<LeaseState>,
    token: CancellationToken,
}

impl<S: CoordinationStore> RenewalTask<S> {
    async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.renew_interval, self.renew_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if !self.tick().await {
                return;
            }
        }

        tracing::info!(worker_id = self.worker_id, "lease renewal stopped");
    }

    /// One renewal. Returns `false` once the task should stop for good.
    async fn tick(&self) -> bool {
        let fail_closed = self.state.policy == RenewalPolicy::FailClosed;
        let started = Instant::now();

        if fail_closed && started >= self.state.deadline() {
            self.give_up("lease TTL elapsed without a successful renewal");
            return false;
        }

        let result = tokio::select! {
            () = self.token.cancelled() => return true,
            result = self.store.refresh_ttl(&self.key, self.lease_ttl) => result,
        };

        match result {
            Ok(true) => {
                self.state.extend_from(started, self.lease_ttl);
                tracing::debug!(worker_id = self.worker_id, "renewed lease");
            }
            Ok(false) if fail_closed => {
                self.give_up("lease key is gone from the store");
                return false;
            }
            Ok(false) => {
                tracing::warn!(
                    worker_id = self.worker_id,
                    key = %self.key,
                    "lease key is gone from the store, continuing"
                );
            }
            Err(e) => {
                tracing::warn!(worker_id = self.worker_id, error = %e, "failed to renew lease");
            }
        }
        true
    }

    fn give_up(&self, reason: &str) {
        self.state.mark_lost();
        tracing::error!(
            worker_id = self.worker_id,
            key = %self.key,
            reason,
            "lease lost, generator stops issuing IDs"
        );
    }
}
