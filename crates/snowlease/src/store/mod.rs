//! The coordination-store seam.
//!
//! Leasing only needs five verbs from the shared store: atomic
//! create-if-absent with a TTL, get, delete, TTL refresh and an ordered batch
//! get. [`CoordinationStore`] captures exactly that set so any networked
//! key-value service offering them can back the leasing protocol.
//! [`MemoryStore`] is the in-process implementation used by the CLI and tests.

mod error;
mod interface;
mod memory;

pub use error::*;
pub use interface::*;
pub use memory::*;
