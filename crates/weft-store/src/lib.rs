//! Weft Store
//!
//! This crate owns the current pipeline graph. [`GraphStore`] is the only
//! place the graph is mutated: every mutation re-projects action-node context
//! from the edges and then saves the whole `{nodes, edges}` document through a
//! [`Snapshot`].
//!
//! The snapshot is a local convenience cache, not a source of truth. It is
//! loaded once when the store opens and saved after every mutation.

mod error;
mod snapshot;
mod store;

pub use error::{SnapshotError, StoreError};
pub use snapshot::{FileSnapshot, MemorySnapshot, Snapshot};
pub use store::GraphStore;
