//! Infrastructure layer: store implementations behind the posting and
//! reporting contracts.

pub mod in_memory;


pub use in_memory::{InMemoryLedger, InMemorySnapshotStore};
