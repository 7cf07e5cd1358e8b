//! Centralized constants for synthesis
//!
//! Single source of truth for default values and fixed model parameters.
//! Anything a deployment may want to tune lives in `SynthesisConfig`; the
//! values here are either defaults for it or properties of the model.

/// Fixed properties of the voice-cloning model
pub mod model {
    /// Output sample rate the model was trained at (Hz)
    pub const SAMPLE_RATE: u32 = 24_000;

    /// Audio samples per mel frame
    pub const HOP_LENGTH: usize = 256;

    /// Vocabulary index used for characters missing from the vocabulary
    pub const UNKNOWN_TOKEN_ID: i32 = 0;

    /// Onnx session file names inside the model directory
    pub const PREPROCESS_MODEL: &str = "preprocess.onnx";
    pub const TRANSFORMER_MODEL: &str = "transformer.onnx";
    pub const DECODE_MODEL: &str = "decode.onnx";
    pub const VOCAB_FILE: &str = "vocab.txt";
}

/// Synthesis defaults
pub mod synthesis {
    /// Refinement steps (flow-matching function evaluations)
    pub const NFE_STEP: u32 = 32;

    /// Upper bound on refinement steps
    pub const MAX_NFE_STEP: u32 = 100;

    /// Speaking speed multiplier (<1 slower, >1 faster)
    pub const SPEED: f64 = 0.9;

    /// Accepted speed range, inclusive
    pub const MIN_SPEED: f64 = 0.1;
    pub const MAX_SPEED: f64 = 3.0;

    pub const RANDOM_SEED: u64 = 9527;

    /// Crossfade between chunks (seconds)
    pub const CROSS_FADE_DURATION: f64 = 0.1;

    /// Longest audio one chunk is allowed to produce (seconds)
    pub const MAX_CHUNK_DURATION: f64 = 15.0;

    /// Shortest estimated chunk duration before merging (seconds)
    pub const MIN_TARGET_DURATION: f64 = 1.0;
}

/// Chunking limits
pub mod chunking {
    /// Character budget never drops below this
    pub const MIN_CHARS_PER_CHUNK: usize = 20;

    /// Chunks with fewer words are merged into a neighbour when possible
    pub const MIN_WORDS_PER_CHUNK: usize = 4;

    /// Extra weight per pause punctuation mark in text length estimates
    pub const PAUSE_PUNCTUATION_WEIGHT: usize = 3;

    /// Punctuation that makes the speaker pause
    pub const PAUSE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];
}

/// Output audio levels
pub mod audio {
    /// Peak level after normalization, relative to full scale
    pub const NORMALIZE_PEAK: f32 = 0.9;

    /// Magnitude above which samples are treated as clipped
    pub const CLIP_KNEE: f32 = 0.9;

    /// Repaired samples never exceed this magnitude
    pub const CLIP_CEILING: f32 = 0.98;

    /// Peaks below this are considered silence and not amplified
    pub const SILENCE_FLOOR: f32 = 1e-6;
}

/// Default on-disk locations
pub mod paths {
    pub const MODEL_DIR: &str = "models";
    pub const VOICE_CATALOG: &str = "samples/catalog.yaml";
    pub const CONFIG_DIR: &str = "config";
    /// File stem of the base layer inside the config directory
    pub const CONFIG_DEFAULT: &str = "default";
}

/// Environment variable handling
pub mod env {
    /// Prefix for environment overrides, e.g. `VIETVOICE__SYNTHESIS__SPEED`
    pub const PREFIX: &str = "VIETVOICE";
    pub const SEPARATOR: &str = "__";
}
