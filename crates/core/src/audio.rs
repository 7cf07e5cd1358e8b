//! Audio types flowing through synthesis

use std::sync::Arc;

/// Decoded float audio for one text chunk
///
/// `index` is the position of the source text chunk; reassembly relies on it
/// to keep the narrative order.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub index: usize,
    pub samples: Vec<f32>,
}

impl AudioChunk {
    pub fn new(index: usize, samples: Vec<f32>) -> Self {
        Self { index, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Final 16-bit mono waveform of one synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct FinalWaveform {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl FinalWaveform {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds, always finite and non-negative
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Voice-cloning conditioning input: audio plus its transcript
///
/// Samples sit behind an `Arc` so every chunk of a request can share the
/// same decoded reference without copying it.
#[derive(Debug, Clone)]
pub struct ReferenceVoice {
    samples: Arc<[f32]>,
    sample_rate: u32,
    text: String,
}

impl ReferenceVoice {
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32, text: impl Into<String>) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            text: text.into(),
        }
    }

    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
