//! Capability traits
//!
//! The orchestrator depends only on these interfaces, never on a specific
//! numeric runtime.

mod inference;

pub use inference::{InferenceBackend, ModelInputSet};
