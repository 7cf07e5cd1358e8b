//! Three-stage inference capability
//!
//! A voice-cloning model is driven as `preprocess -> refine -> decode`.
//! Each stage is treated as a deterministic function of its inputs, the
//! model weights and the refinement step count.
//!
//! # Example
//!
//! ```ignore
//! let intermediate = backend.preprocess(&inputs)?;
//! let refined = backend.refine(intermediate, config.nfe_step)?;
//! let samples = backend.decode(refined)?;
//! ```

use std::sync::Arc;

use crate::error::InferenceError;

/// Per-chunk model input bundle
///
/// Owned by a single orchestration call and dropped once the chunk's audio
/// has been decoded. The reference waveform is shared across all chunks of
/// a request.
#[derive(Debug, Clone)]
pub struct ModelInputSet {
    /// Position of the source text chunk
    pub chunk_index: usize,
    /// Text of the chunk (reference transcript excluded)
    pub chunk_text: String,
    /// Reference waveform at the model sample rate, in [-1, 1]
    pub reference_samples: Arc<[f32]>,
    /// Vocabulary indices of reference transcript followed by chunk text
    pub text_ids: Vec<i32>,
    /// Frames covered by the reference audio
    pub ref_frames: usize,
    /// Estimated total frames (reference + target)
    pub max_frames: usize,
    /// Noise seed for this chunk
    pub seed: u64,
}

impl ModelInputSet {
    /// Frames the model is expected to generate for the target text
    pub fn target_frames(&self) -> usize {
        self.max_frames.saturating_sub(self.ref_frames)
    }
}

/// Opaque neural model exposed as three sequential stages
///
/// Implementations must be shareable across threads; per-call parameters
/// travel in [`ModelInputSet`], never through mutable backend state.
pub trait InferenceBackend: Send + Sync {
    /// Output of the preprocessing stage
    type Intermediate: Send;
    /// Output of the refinement stage
    type Refined: Send;

    /// Backend name for logs
    fn name(&self) -> &str;

    /// Sample rate of decoded audio
    fn sample_rate(&self) -> u32;

    /// Prepare features and initial state for one chunk
    fn preprocess(&self, inputs: &ModelInputSet) -> Result<Self::Intermediate, InferenceError>;

    /// Run `steps` refinement passes
    fn refine(
        &self,
        intermediate: Self::Intermediate,
        steps: u32,
    ) -> Result<Self::Refined, InferenceError>;

    /// Turn the refined representation into float audio for the target text only
    fn decode(&self, refined: Self::Refined) -> Result<Vec<f32>, InferenceError>;
}
