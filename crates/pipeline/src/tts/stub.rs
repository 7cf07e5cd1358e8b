//! Model-free inference backend
//!
//! Produces a quiet seeded tone whose length follows the frame estimate, so
//! the whole pipeline can run without model files. Faults can be injected
//! to exercise the abort and repair paths.

use std::sync::atomic::{AtomicUsize, Ordering};

use vietvoice_config::constants::model::HOP_LENGTH;
use vietvoice_core::{
    InferenceBackend, InferenceError, InferenceStage, ModelInputSet, ResourceError,
};
use vietvoice_text_processing::Vocabulary;

use super::noise::gaussian_noise;

const TONE_HZ: f32 = 220.0;
const TONE_AMPLITUDE: f32 = 0.3;
const NOISE_AMPLITUDE: f32 = 0.01;

/// Injected misbehaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFault {
    /// Fail at `stage`, on every chunk or only on `chunk`
    FailAt {
        stage: InferenceStage,
        chunk: Option<usize>,
    },
    /// Emit NaN, infinite and over-range samples at the start of each chunk
    CorruptOutput,
}

#[derive(Debug)]
pub struct StubIntermediate {
    chunk_index: usize,
    target_frames: usize,
    seed: u64,
}

#[derive(Debug)]
pub struct StubRefined {
    chunk_index: usize,
    target_frames: usize,
    seed: u64,
}

/// Deterministic stand-in for the neural model
#[derive(Debug)]
pub struct StubBackend {
    sample_rate: u32,
    hop_length: usize,
    fault: Option<StubFault>,
    preprocess_calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(sample_rate: u32) -> Self {
        tracing::warn!("Using stub inference backend - audio output is a synthetic tone");
        Self {
            sample_rate,
            hop_length: HOP_LENGTH,
            fault: None,
            preprocess_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length.max(1);
        self
    }

    pub fn with_fault(mut self, fault: StubFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Number of chunks that entered preprocessing
    pub fn preprocess_calls(&self) -> usize {
        self.preprocess_calls.load(Ordering::Relaxed)
    }

    /// Vocabulary covering the cleaned-text alphabet
    pub fn vocabulary() -> Result<Vocabulary, ResourceError> {
        const ALPHABET: &str = " .,!?'@$%&/abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789\
            àáảãạăằắẳẵặâầấẩẫậèéẻẽẹêềếểễệđìíỉĩịòóỏõọôồốổỗộơờớởỡợùúủũụưừứửữựỳỵỷỹý";
        let mut lines: Vec<String> = vec!["<unk>".to_string()];
        lines.extend(ALPHABET.chars().map(String::from));
        lines.extend(
            ALPHABET
                .chars()
                .filter(|c| !c.is_ascii())
                .flat_map(char::to_uppercase)
                .map(String::from),
        );
        Vocabulary::from_lines(lines.iter().map(String::as_str))
    }

    fn check(&self, stage: InferenceStage, chunk: usize) -> Result<(), InferenceError> {
        match self.fault {
            Some(StubFault::FailAt { stage: s, chunk: c }) if s == stage && c.map_or(true, |c| c == chunk) => {
                Err(InferenceError::stage(stage, chunk, "injected failure"))
            }
            _ => Ok(()),
        }
    }
}

impl InferenceBackend for StubBackend {
    type Intermediate = StubIntermediate;
    type Refined = StubRefined;

    fn name(&self) -> &str {
        "stub"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn preprocess(&self, inputs: &ModelInputSet) -> Result<Self::Intermediate, InferenceError> {
        self.preprocess_calls.fetch_add(1, Ordering::Relaxed);
        self.check(InferenceStage::Preprocess, inputs.chunk_index)?;
        if inputs.text_ids.is_empty() {
            return Err(InferenceError::stage(
                InferenceStage::Preprocess,
                inputs.chunk_index,
                "no text ids",
            ));
        }
        Ok(StubIntermediate {
            chunk_index: inputs.chunk_index,
            target_frames: inputs.target_frames(),
            seed: inputs.seed,
        })
    }

    fn refine(
        &self,
        intermediate: Self::Intermediate,
        steps: u32,
    ) -> Result<Self::Refined, InferenceError> {
        self.check(InferenceStage::Refine, intermediate.chunk_index)?;
        tracing::trace!(chunk = intermediate.chunk_index, steps, "Stub refinement");
        Ok(StubRefined {
            chunk_index: intermediate.chunk_index,
            target_frames: intermediate.target_frames,
            seed: intermediate.seed,
        })
    }

    fn decode(&self, refined: Self::Refined) -> Result<Vec<f32>, InferenceError> {
        self.check(InferenceStage::Decode, refined.chunk_index)?;

        let len = refined.target_frames * self.hop_length;
        let noise = gaussian_noise(refined.seed, len);
        let step = std::f32::consts::TAU * TONE_HZ / self.sample_rate.max(1) as f32;

        let mut samples: Vec<f32> = noise
            .iter()
            .enumerate()
            .map(|(i, n)| TONE_AMPLITUDE * (step * i as f32).sin() + NOISE_AMPLITUDE * n)
            .collect();

        if self.fault == Some(StubFault::CorruptOutput) {
            let corrupt = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 4.0, -1.5];
            for (s, bad) in samples.iter_mut().zip(corrupt) {
                *s = bad;
            }
        }

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn inputs(chunk_index: usize, seed: u64) -> ModelInputSet {
        ModelInputSet {
            chunk_index,
            chunk_text: "xin chào.".to_string(),
            reference_samples: Arc::from(vec![0.0f32; 2560]),
            text_ids: vec![1, 2, 3],
            ref_frames: 11,
            max_frames: 21,
            seed,
        }
    }

    fn run(backend: &StubBackend, inputs: &ModelInputSet) -> Result<Vec<f32>, InferenceError> {
        let intermediate = backend.preprocess(inputs)?;
        let refined = backend.refine(intermediate, 32)?;
        backend.decode(refined)
    }

    #[test]
    fn test_length_follows_frames() {
        let backend = StubBackend::new(24000);
        let audio = run(&backend, &inputs(0, 1)).unwrap();
        assert_eq!(audio.len(), 10 * HOP_LENGTH);
        assert!(audio.iter().all(|s| s.abs() < 0.5));
    }

    #[test]
    fn test_seeded() {
        let backend = StubBackend::new(24000);
        assert_eq!(
            run(&backend, &inputs(0, 7)).unwrap(),
            run(&backend, &inputs(0, 7)).unwrap()
        );
        assert_ne!(
            run(&backend, &inputs(0, 7)).unwrap(),
            run(&backend, &inputs(0, 8)).unwrap()
        );
    }

    #[test]
    fn test_fault_on_specific_chunk() {
        let backend = StubBackend::new(24000).with_fault(StubFault::FailAt {
            stage: InferenceStage::Decode,
            chunk: Some(2),
        });
        assert!(run(&backend, &inputs(0, 1)).is_ok());
        let err = run(&backend, &inputs(2, 1)).unwrap_err();
        assert_eq!(err.failed_stage(), Some(InferenceStage::Decode));
        assert_eq!(backend.preprocess_calls(), 2);
    }

    #[test]
    fn test_corrupt_output() {
        let backend = StubBackend::new(24000).with_fault(StubFault::CorruptOutput);
        let audio = run(&backend, &inputs(0, 1)).unwrap();
        assert!(audio[0].is_nan());
        assert!(audio[1].is_infinite());
        assert_eq!(audio[3], 4.0);
    }

    #[test]
    fn test_vocabulary_covers_alphabet() {
        let vocab = StubBackend::vocabulary().unwrap();
        assert!(vocab.contains(' '));
        assert!(vocab.contains('đ'));
        assert!(vocab.contains('Đ'));
        assert!(vocab.contains('Ỹ'));
        assert_eq!(vocab.index_of('<'), 0);
    }
}
