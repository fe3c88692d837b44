//! Cross-surface state replication
//!
//! - `snapshot`: the replicated record
//! - `store`: the shared publish/subscribe store
//! - `replicator`: identity, versioning and the in-flight write guard

pub mod replicator;
pub mod snapshot;
pub mod store;

pub use replicator::Replicator;
pub use snapshot::{SessionSnapshot, SnapshotImage};
pub use store::{MemoryStore, SharedStore};
