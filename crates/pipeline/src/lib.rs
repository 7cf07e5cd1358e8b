//! Chunked voice-cloning synthesis pipeline
//!
//! This crate turns arbitrary-length text into one waveform in a reference
//! speaker's voice:
//! - Chunk sizing from the reference speaking rate
//! - Sequential three-stage inference per chunk (ONNX or stub backend)
//! - Crossfaded reassembly with NaN/Inf/clipping repair
//! - WAV I/O and resampling
//! - Reference sample catalog
//! - Shared engine and async synthesis service

pub mod audio;
pub mod service;
pub mod telemetry;
pub mod tts;
pub mod voices;

// Audio exports
pub use audio::{encode_wav, load_wav_mono, resample, write_wav, Reassembler};

// TTS exports
pub use tts::{
    create_stub_engine, ChunkBudget, ChunkSizingPolicy, StubBackend, StubFault, SynthesisParams,
    Synthesized, TtsEngine,
};

#[cfg(feature = "onnx")]
pub use tts::{create_onnx_engine, OnnxBackend};

// Voice selection exports
pub use voices::{SelectedVoice, VoiceCatalog, VoiceSample};

// Service exports
pub use service::{
    SharedEngine, SpeechSynthesizer, SynthesisOutput, SynthesisRequest, SynthesisService,
};

pub use telemetry::init_tracing;
