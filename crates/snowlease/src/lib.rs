#![doc = include_str!("../README.md")]

mod error;
mod facade;
mod generator;
mod id;
pub mod lease;
pub mod store;
mod time;

pub use crate::error::*;
pub use crate::facade::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::lease::{
    Lease, LeaseConfig, LeaseRenewal, RenewalPolicy, StoreLock, acquire_lease, acquire_lease_for,
    acquire_worker_id,
};
pub use crate::store::{CoordinationStore, MemoryStore, StoreError, StoreResult};
pub use crate::time::*;
