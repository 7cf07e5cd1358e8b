//! Reference voice selection

mod catalog;

pub use catalog::{SelectedVoice, VoiceCatalog, VoiceSample};
