//! Core traits and types for chunked voice-cloning speech synthesis
//!
//! This crate provides foundational types used across all other crates:
//! - Error types (input, resource, inference)
//! - Audio types (per-chunk audio, final fixed-point waveform, reference voice)
//! - Voice filter vocabulary (gender, group, area, emotion)
//! - The `InferenceBackend` capability trait wrapped around the neural model

pub mod audio;
pub mod error;
pub mod traits;
pub mod voice;

pub use audio::{AudioChunk, FinalWaveform, ReferenceVoice};
pub use error::{Error, InferenceError, InferenceStage, InputError, ResourceError, Result};
pub use traits::{InferenceBackend, ModelInputSet};
pub use voice::{Area, Emotion, Gender, Group, VoiceFilter};
