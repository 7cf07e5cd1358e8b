//! Inference orchestration
//!
//! `TtsEngine` turns text plus a reference voice into one waveform:
//!
//! 1. clean and chunk the text against the reference speaking rate
//! 2. build a `ModelInputSet` per chunk
//! 3. run preprocess, refine and decode for each chunk, strictly in order
//! 4. hand the ordered audio chunks to the reassembler
//!
//! The engine holds no per-call mutable state. Speed and seed travel in
//! [`SynthesisParams`], so one engine can serve concurrent requests.

use std::sync::Arc;
use std::time::Instant;

use vietvoice_config::synthesis::validate_speed;
use vietvoice_config::SynthesisConfig;
use vietvoice_core::{
    AudioChunk, FinalWaveform, InferenceBackend, InputError, ModelInputSet, ReferenceVoice, Result,
};
use vietvoice_text_processing::{clean_text, has_speakable_content, Vocabulary};

use super::noise::chunk_seed;
use super::sizing::{estimate_frames, ChunkSizingPolicy};
use crate::audio::{resample, Reassembler};

/// Per-call parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    /// Speed multiplier (<1 slower, >1 faster)
    pub speed: f64,
    /// Base noise seed; chunk `i` uses `seed + i`
    pub seed: u64,
}

impl SynthesisParams {
    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self {
            speed: config.speed,
            seed: config.random_seed,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of one synthesis call
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub waveform: FinalWaveform,
    pub chunk_count: usize,
}

impl Synthesized {
    pub fn duration_secs(&self) -> f64 {
        self.waveform.duration_secs()
    }
}

/// Chunked voice-cloning synthesis over an inference backend
pub struct TtsEngine<B: InferenceBackend> {
    backend: B,
    vocab: Vocabulary,
    config: SynthesisConfig,
    policy: ChunkSizingPolicy,
    reassembler: Reassembler,
}

impl<B: InferenceBackend> TtsEngine<B> {
    /// Build an engine; configuration is validated here, before any inference
    pub fn new(backend: B, vocab: Vocabulary, config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        if backend.sample_rate() != config.sample_rate {
            return Err(vietvoice_core::Error::config(format!(
                "backend {} produces {} Hz audio but sample_rate is {}",
                backend.name(),
                backend.sample_rate(),
                config.sample_rate
            )));
        }

        tracing::info!(
            backend = backend.name(),
            nfe_step = config.nfe_step,
            sample_rate = config.sample_rate,
            cross_fade_duration = config.cross_fade_duration,
            max_chunk_duration = config.max_chunk_duration,
            "TTS engine ready"
        );

        Ok(Self {
            policy: ChunkSizingPolicy::from_config(&config),
            reassembler: Reassembler::new(config.cross_fade_duration, config.sample_rate),
            backend,
            vocab,
            config,
        })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Default per-call parameters from configuration
    pub fn default_params(&self) -> SynthesisParams {
        SynthesisParams::from_config(&self.config)
    }

    /// Chunk `text` and build the model inputs for every chunk, in order
    pub fn prepare_inputs(
        &self,
        reference: &ReferenceVoice,
        text: &str,
        params: &SynthesisParams,
    ) -> Result<Vec<ModelInputSet>> {
        validate_speed(params.speed)?;

        let cleaned = clean_text(text);
        if !has_speakable_content(&cleaned) {
            return Err(InputError::EmptyText.into());
        }

        let reference_text = clean_text(reference.text());
        if !has_speakable_content(&reference_text) {
            return Err(InputError::InvalidReference("transcript is empty".to_string()).into());
        }
        let reference_samples = self.reference_samples(reference)?;
        let reference_secs = reference.duration_secs();

        if let Err(e) = self.config.check_reference_duration(reference_secs) {
            tracing::warn!(error = %e, "Reference sample is too long for the chunk window");
        }

        let budget = self.policy.budget(&reference_text, reference_secs);
        let chunks = self.policy.plan(&cleaned, &budget);

        tracing::debug!(
            chars_per_second = budget.chars_per_second,
            max_chars = budget.max_chars,
            chunks = chunks.len(),
            "Text chunked"
        );

        let separator = if reference_text.ends_with(char::is_whitespace) {
            ""
        } else {
            " "
        };

        let inputs = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let frames = estimate_frames(
                    reference_samples.len(),
                    self.config.hop_length,
                    &reference_text,
                    &chunk,
                    params.speed,
                );
                let model_text = format!("{}{}{}", reference_text, separator, chunk);
                ModelInputSet {
                    chunk_index: index,
                    text_ids: self.vocab.encode(&model_text),
                    chunk_text: chunk,
                    reference_samples: Arc::clone(&reference_samples),
                    ref_frames: frames.ref_frames,
                    max_frames: frames.max_frames,
                    seed: chunk_seed(params.seed, index),
                }
            })
            .collect();

        Ok(inputs)
    }

    /// Reference audio at the model rate, shared across chunks
    fn reference_samples(&self, reference: &ReferenceVoice) -> Result<Arc<[f32]>> {
        if reference.samples().is_empty() {
            return Err(InputError::InvalidReference("audio is empty".to_string()).into());
        }
        if reference.sample_rate() == self.config.sample_rate {
            return Ok(Arc::clone(reference.samples()));
        }
        tracing::debug!(
            from = reference.sample_rate(),
            to = self.config.sample_rate,
            "Resampling reference audio"
        );
        Ok(resample(reference.samples(), reference.sample_rate(), self.config.sample_rate).into())
    }

    /// Run the three inference stages for one chunk
    pub fn synthesize_chunk(&self, inputs: &ModelInputSet) -> Result<AudioChunk> {
        let started = Instant::now();

        let intermediate = self.backend.preprocess(inputs)?;
        let refined = self.backend.refine(intermediate, self.config.nfe_step)?;
        let samples = self.backend.decode(refined)?;

        tracing::debug!(
            chunk = inputs.chunk_index,
            text_ids = inputs.text_ids.len(),
            max_frames = inputs.max_frames,
            samples = samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chunk synthesized"
        );

        Ok(AudioChunk::new(inputs.chunk_index, samples))
    }

    /// Synthesize `text` in the reference voice
    ///
    /// Any stage failure aborts the call; no partial audio is returned.
    pub fn synthesize(
        &self,
        text: &str,
        reference: &ReferenceVoice,
        params: &SynthesisParams,
    ) -> Result<Synthesized> {
        let started = Instant::now();
        let inputs = self.prepare_inputs(reference, text, params)?;
        let chunk_count = inputs.len();

        let mut chunks = Vec::with_capacity(chunk_count);
        for input in &inputs {
            chunks.push(self.synthesize_chunk(input)?);
        }
        drop(inputs);

        let waveform = self.reassembler.assemble(chunks);

        tracing::info!(
            chunks = chunk_count,
            speed = params.speed,
            duration_secs = waveform.duration_secs(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synthesis complete"
        );

        Ok(Synthesized {
            waveform,
            chunk_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::stub::{StubBackend, StubFault};
    use vietvoice_core::{Error, InferenceError, InferenceStage};

    fn engine(backend: StubBackend) -> TtsEngine<StubBackend> {
        TtsEngine::new(
            backend,
            StubBackend::vocabulary().unwrap(),
            SynthesisConfig::default(),
        )
        .unwrap()
    }

    fn reference() -> ReferenceVoice {
        // two seconds of audio, 52 bytes of transcript: 390 chars per chunk
        ReferenceVoice::new(vec![0.1f32; 48000], 24000, "Xin chào, tôi là giọng đọc mẫu nhé bạn.")
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SynthesisConfig {
            nfe_step: 0,
            ..Default::default()
        };
        let result = TtsEngine::new(
            StubBackend::new(24000),
            StubBackend::vocabulary().unwrap(),
            config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_sample_rate_mismatch() {
        let result = TtsEngine::new(
            StubBackend::new(16000),
            StubBackend::vocabulary().unwrap(),
            SynthesisConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_prepare_inputs() {
        let engine = engine(StubBackend::new(24000));
        let params = engine.default_params();
        let inputs = engine
            .prepare_inputs(&reference(), "Hôm nay trời đẹp", &params)
            .unwrap();

        assert_eq!(inputs.len(), 1);
        let input = &inputs[0];
        assert_eq!(input.chunk_text, "Hôm nay trời đẹp.");
        assert_eq!(input.ref_frames, 48000 / 256 + 1);
        assert!(input.max_frames > input.ref_frames);
        assert_eq!(input.seed, 9527);

        let expected = engine
            .vocabulary()
            .encode("Xin chào, tôi là giọng đọc mẫu nhé bạn. Hôm nay trời đẹp.");
        assert_eq!(input.text_ids, expected);
    }

    #[test]
    fn test_prepare_inputs_shares_reference() {
        let engine = engine(StubBackend::new(24000));
        let long_text = "Câu này khá dài để buộc phải chia nhỏ. ".repeat(20);
        let inputs = engine
            .prepare_inputs(&reference(), &long_text, &engine.default_params())
            .unwrap();
        assert!(inputs.len() > 1);
        for (i, input) in inputs.iter().enumerate() {
            assert_eq!(input.chunk_index, i);
            assert_eq!(input.seed, 9527 + i as u64);
            assert!(Arc::ptr_eq(&input.reference_samples, &inputs[0].reference_samples));
        }
    }

    #[test]
    fn test_speed_changes_frames_only() {
        let engine = engine(StubBackend::new(24000));
        let base = engine.default_params();
        let slow = engine
            .prepare_inputs(&reference(), "Một hai ba bốn năm sáu", &base.with_speed(0.5))
            .unwrap();
        let fast = engine
            .prepare_inputs(&reference(), "Một hai ba bốn năm sáu", &base.with_speed(2.0))
            .unwrap();
        assert!(slow[0].max_frames > fast[0].max_frames);
        assert_eq!(slow[0].text_ids, fast[0].text_ids);
        assert!((engine.config().speed - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = engine(StubBackend::new(24000));
        let params = engine.default_params();

        let err = engine.prepare_inputs(&reference(), "  🎉 \n ", &params).unwrap_err();
        assert!(matches!(err, Error::Input(InputError::EmptyText)));

        let err = engine
            .prepare_inputs(&reference(), "xin chào", &params.with_speed(0.0))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let silent = ReferenceVoice::new(Vec::<f32>::new(), 24000, "xin chào");
        let err = engine.prepare_inputs(&silent, "xin chào", &params).unwrap_err();
        assert!(matches!(err, Error::Input(InputError::InvalidReference(_))));
    }

    #[test]
    fn test_out_of_range_speed_rejected_before_inference() {
        let engine = engine(StubBackend::new(24000));
        for speed in [1e-6, 1e-300, 3.5] {
            let params = engine.default_params().with_speed(speed);
            let err = engine.prepare_inputs(&reference(), "xin chào", &params).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            assert!(engine.synthesize("xin chào", &reference(), &params).is_err());
        }
        assert_eq!(engine.backend().preprocess_calls(), 0);
    }

    #[test]
    fn test_reference_resampled_to_model_rate() {
        let engine = engine(StubBackend::new(24000));
        let reference = ReferenceVoice::new(vec![0.1f32; 16000], 16000, "Một giây âm thanh.");
        let inputs = engine
            .prepare_inputs(&reference, "xin chào", &engine.default_params())
            .unwrap();
        assert_eq!(inputs[0].reference_samples.len(), 24000);
    }

    #[test]
    fn test_synthesize_single_chunk() {
        let engine = engine(StubBackend::new(24000));
        let result = engine
            .synthesize("Xin chào các bạn", &reference(), &engine.default_params())
            .unwrap();
        assert_eq!(result.chunk_count, 1);
        assert!(!result.waveform.is_empty());
        assert_eq!(result.waveform.sample_rate, 24000);
        assert!(result.duration_secs() > 0.0);
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let engine = engine(StubBackend::new(24000));
        let params = engine.default_params();
        let text = "Một hai ba. Bốn năm sáu. Bảy tám chín mười.";
        let a = engine.synthesize(text, &reference(), &params).unwrap();
        let b = engine.synthesize(text, &reference(), &params).unwrap();
        assert_eq!(a.waveform, b.waveform);

        let c = engine
            .synthesize(text, &reference(), &params.with_seed(1))
            .unwrap();
        assert_ne!(a.waveform.samples, c.waveform.samples);
    }

    #[test]
    fn test_stage_failure_aborts() {
        let backend = StubBackend::new(24000).with_fault(StubFault::FailAt {
            stage: InferenceStage::Refine,
            chunk: Some(1),
        });
        let engine = engine(backend);
        let long_text = "Câu này khá dài để buộc phải chia nhỏ. ".repeat(20);
        let err = engine
            .synthesize(&long_text, &reference(), &engine.default_params())
            .unwrap_err();

        match err {
            Error::Inference(InferenceError::Stage { stage, chunk, .. }) => {
                assert_eq!(stage, InferenceStage::Refine);
                assert_eq!(chunk, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // chunk 2 onwards never started
        assert_eq!(engine.backend().preprocess_calls(), 2);
    }

    #[test]
    fn test_corrupt_output_is_repaired() {
        let engine = engine(StubBackend::new(24000).with_fault(StubFault::CorruptOutput));
        let result = engine
            .synthesize("Xin chào các bạn", &reference(), &engine.default_params())
            .unwrap();
        let ceiling = (0.9 * i16::MAX as f32).round() as i16;
        assert!(result
            .waveform
            .samples
            .iter()
            .all(|s| s.unsigned_abs() <= ceiling as u16));
    }
}
