//! Async synthesis service
//!
//! The engine is expensive to build, so it lives in a [`SharedEngine`] slot
//! that is filled on first use and reused until reset. Each request resolves
//! its reference voice, then runs synthesis on the blocking pool so request
//! handlers stay responsive while the model works.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use vietvoice_core::{
    FinalWaveform, InferenceBackend, InferenceError, InputError, Result, VoiceFilter,
};

use crate::audio::write_wav;
use crate::tts::{Synthesized, TtsEngine};
use crate::voices::{SelectedVoice, VoiceCatalog};

type EngineFactory<B> = Box<dyn Fn() -> Result<TtsEngine<B>> + Send + Sync>;

/// Lazily built, process-wide engine
pub struct SharedEngine<B: InferenceBackend> {
    slot: Mutex<Option<Arc<TtsEngine<B>>>>,
    factory: EngineFactory<B>,
}

impl<B: InferenceBackend> SharedEngine<B> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<TtsEngine<B>> + Send + Sync + 'static,
    {
        Self {
            slot: Mutex::new(None),
            factory: Box::new(factory),
        }
    }

    /// The engine, building it on first call
    ///
    /// Concurrent first callers wait for a single build. A failed build
    /// leaves the slot empty, so the next call tries again.
    pub fn get(&self) -> Result<Arc<TtsEngine<B>>> {
        let mut slot = self.slot.lock();
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let started = Instant::now();
        let engine = match (self.factory)() {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::error!(error = %e, "Engine initialization failed");
                return Err(e);
            }
        };
        tracing::info!(
            backend = engine.backend().name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Engine initialized"
        );
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Drop the cached engine; in-flight calls keep their handle
    pub fn reset(&self) {
        if self.slot.lock().take().is_some() {
            tracing::info!("Engine reset");
        }
    }
}

/// One synthesis request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,

    /// Catalog criteria, ignored when an explicit reference is given
    #[serde(default)]
    pub filter: VoiceFilter,

    /// Which catalog match to use (0-based, wraps)
    #[serde(default)]
    pub iteration: usize,

    #[serde(default)]
    pub reference_audio: Option<PathBuf>,

    #[serde(default)]
    pub reference_text: Option<String>,

    /// Overrides the configured speed for this call only
    #[serde(default)]
    pub speed: Option<f64>,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Also write the result here as WAV
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: VoiceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_iteration(mut self, iteration: usize) -> Self {
        self.iteration = iteration;
        self
    }

    pub fn with_reference(mut self, audio: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.reference_audio = Some(audio.into());
        self.reference_text = Some(text.into());
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

/// Result of a synthesis request
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub waveform: FinalWaveform,
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub chunk_count: usize,
    pub elapsed: Duration,
}

impl SynthesisOutput {
    fn new(synthesized: Synthesized, elapsed: Duration) -> Self {
        Self {
            sample_rate: synthesized.waveform.sample_rate,
            duration_secs: synthesized.duration_secs(),
            chunk_count: synthesized.chunk_count,
            waveform: synthesized.waveform,
            elapsed,
        }
    }
}

/// Text-to-speech front door for request handlers
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one request to a complete waveform
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput>;

    /// Sample rate of produced audio
    fn sample_rate(&self) -> u32;
}

/// Voice resolution plus blocking-pool synthesis over a shared engine
pub struct SynthesisService<B: InferenceBackend + 'static> {
    engine: Arc<SharedEngine<B>>,
    catalog: Arc<VoiceCatalog>,
    sample_rate: u32,
}

impl<B: InferenceBackend + 'static> SynthesisService<B> {
    pub fn new(engine: Arc<SharedEngine<B>>, catalog: VoiceCatalog, sample_rate: u32) -> Self {
        Self {
            engine,
            catalog: Arc::new(catalog),
            sample_rate,
        }
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    /// Whether the engine has been built; never blocks on a build
    pub fn is_ready(&self) -> bool {
        self.engine.is_initialized()
    }

    /// Build the engine ahead of the first request
    pub async fn warm_up(&self) -> Result<()> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.get().map(|_| ()))
            .await
            .map_err(|e| InferenceError::Worker(e.to_string()))?
    }

    /// Explicit reference if given, otherwise a catalog pick
    pub fn resolve_reference(&self, request: &SynthesisRequest) -> Result<SelectedVoice> {
        match (&request.reference_audio, &request.reference_text) {
            (Some(audio), Some(text)) => Ok(SelectedVoice::new(audio.clone(), text.clone())),
            (None, None) => Ok(self.catalog.select(&request.filter, request.iteration)?),
            _ => Err(InputError::IncompleteReference.into()),
        }
    }
}

#[async_trait]
impl<B: InferenceBackend + 'static> SpeechSynthesizer for SynthesisService<B> {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput> {
        let started = Instant::now();
        let voice = self.resolve_reference(&request)?;
        let shared = Arc::clone(&self.engine);

        tracing::debug!(
            reference = %voice.path.display(),
            text_len = request.text.len(),
            speed = ?request.speed,
            "Synthesis request accepted"
        );

        let synthesized = tokio::task::spawn_blocking(move || -> Result<Synthesized> {
            let engine = shared.get()?;
            let reference = voice.load(engine.sample_rate())?;

            let mut params = engine.default_params();
            if let Some(speed) = request.speed {
                params = params.with_speed(speed);
            }
            if let Some(seed) = request.seed {
                params = params.with_seed(seed);
            }

            let result = engine.synthesize(&request.text, &reference, &params)?;
            if let Some(path) = &request.output_path {
                write_wav(path, &result.waveform)?;
            }
            Ok(result)
        })
        .await
        .map_err(|e| InferenceError::Worker(e.to_string()))??;

        Ok(SynthesisOutput::new(synthesized, started.elapsed()))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
