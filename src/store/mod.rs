//! Implementations of the engine's collaborator ports.

mod file;
mod memory;

pub use file::{DEFAULT_LOCK_LEASE, JsonFileDedupStore, JsonFileRecordSource, JsonLinesSink};
pub use memory::{CollectingSink, InMemoryDedupStore, InMemoryRecordSource};
