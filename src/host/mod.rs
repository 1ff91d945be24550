//! Host integration for the fare engine.
//!
//! The [`RecordStore`] trait is the narrow boundary to whatever persists
//! records; [`RecomputeEngine`] runs serialized recompute cycles against it,
//! and [`MemoryStore`] is an in-memory store for embedding and tests.

mod engine;
mod memory;
mod store;

pub use engine::{EngineSettings, LinkOutcome, RecomputeEngine, RecomputeOutcome};
pub use memory::MemoryStore;
pub use store::RecordStore;
