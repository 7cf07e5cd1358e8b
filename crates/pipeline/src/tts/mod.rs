//! Chunked voice-cloning synthesis
//!
//! Features:
//! - Chunk budgets derived from the reference speaker's rate
//! - Strictly sequential three-stage inference per chunk
//! - Seeded, reproducible initial noise
//! - ONNX Runtime backend (optional, feature `onnx`)
//! - Model-free stub backend for tests and dry runs

mod engine;
mod noise;
mod sizing;
mod stub;

#[cfg(feature = "onnx")]
mod onnx;

pub use engine::{SynthesisParams, Synthesized, TtsEngine};
pub use noise::{chunk_seed, gaussian_noise};
pub use sizing::{estimate_frames, ChunkBudget, ChunkSizingPolicy, FrameEstimate};
pub use stub::{StubBackend, StubFault, StubIntermediate, StubRefined};

#[cfg(feature = "onnx")]
pub use onnx::{OnnxBackend, OnnxIntermediate, OnnxRefined};

use vietvoice_config::Settings;
use vietvoice_core::Result;

/// Engine over the stub backend, configured from settings
pub fn create_stub_engine(settings: &Settings) -> Result<TtsEngine<StubBackend>> {
    let synthesis = settings.synthesis.clone();
    let backend = StubBackend::new(synthesis.sample_rate).with_hop_length(synthesis.hop_length);
    TtsEngine::new(backend, StubBackend::vocabulary()?, synthesis)
}

/// Engine over the ONNX model files named in settings
#[cfg(feature = "onnx")]
pub fn create_onnx_engine(settings: &Settings) -> Result<TtsEngine<OnnxBackend>> {
    use vietvoice_text_processing::Vocabulary;

    let vocab = Vocabulary::load(settings.models.vocab_path())?;
    let backend = OnnxBackend::load(&settings.models, settings.synthesis.sample_rate)?;
    TtsEngine::new(backend, vocab, settings.synthesis.clone())
}
