//! Worker-ID leasing against a shared [`CoordinationStore`].
//!
//! - [`config`]: tunables and their validation.
//! - [`lock`]: the store-backed mutual-exclusion lock.
//! - [`protocol`]: lock, scan, claim the lowest free worker ID, unlock.
//! - [`renewal`]: the background task that keeps a claimed lease alive.
//!
//! [`CoordinationStore`]: crate::store::CoordinationStore

pub mod config;
pub mod lock;
pub mod protocol;
pub mod renewal;

pub use config::*;
pub use lock::*;
pub use protocol::*;
pub use renewal::*;
