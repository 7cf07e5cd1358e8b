//! ONNX Runtime backend
//!
//! Drives the exported voice-cloning model as three sessions:
//! - `preprocess`: reference audio, text ids and frame budget to the eight
//!   conditioning tensors
//! - `transformer`: one flow-matching step, fed back `nfe_step - 1` times
//! - `decode`: refined mel noise to the target waveform

use std::path::Path;

use ndarray::{Array1, Array2, Array3, ArrayD};
use ort::session::{builder::GraphOptimizationLevel, Session};

use vietvoice_config::ModelPaths;
use vietvoice_core::{InferenceBackend, InferenceError, InferenceStage, ModelInputSet, ResourceError};

use super::noise::gaussian_noise;

/// Conditioning tensors produced by the preprocess session
pub struct OnnxIntermediate {
    chunk_index: usize,
    noise: ArrayD<f32>,
    rope_cos_q: ArrayD<f32>,
    rope_sin_q: ArrayD<f32>,
    rope_cos_k: ArrayD<f32>,
    rope_sin_k: ArrayD<f32>,
    cat_mel_text: ArrayD<f32>,
    cat_mel_text_drop: ArrayD<f32>,
    ref_signal_len: ArrayD<i64>,
}

pub struct OnnxRefined {
    chunk_index: usize,
    noise: ArrayD<f32>,
    ref_signal_len: ArrayD<i64>,
}

/// Three-session ONNX model
pub struct OnnxBackend {
    preprocess: Session,
    transformer: Session,
    decode: Session,
    sample_rate: u32,
}

fn stage_error(stage: InferenceStage, chunk: usize) -> impl Fn(ort::Error) -> InferenceError {
    move |e| InferenceError::stage(stage, chunk, e.to_string())
}

impl OnnxBackend {
    /// Load all three sessions from the model directory
    pub fn load(paths: &ModelPaths, sample_rate: u32) -> Result<Self, ResourceError> {
        let threads = paths.intra_threads;
        let backend = Self {
            preprocess: Self::load_session(&paths.preprocess_path(), threads)?,
            transformer: Self::load_session(&paths.transformer_path(), threads)?,
            decode: Self::load_session(&paths.decode_path(), threads)?,
            sample_rate,
        };
        tracing::info!(
            model_dir = %paths.model_dir.display(),
            intra_threads = threads,
            "ONNX sessions loaded"
        );
        Ok(backend)
    }

    fn load_session(path: &Path, intra_threads: usize) -> Result<Session, ResourceError> {
        if !path.exists() {
            return Err(ResourceError::NotFound(path.to_path_buf()));
        }

        let mut builder = Session::builder()
            .map_err(|e| ResourceError::Model(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ResourceError::Model(e.to_string()))?;
        if intra_threads > 0 {
            builder = builder
                .with_intra_threads(intra_threads)
                .map_err(|e| ResourceError::Model(e.to_string()))?;
        }
        builder
            .commit_from_file(path)
            .map_err(|e| ResourceError::Model(format!("Failed to load {}: {}", path.display(), e)))
    }
}

fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

impl InferenceBackend for OnnxBackend {
    type Intermediate = OnnxIntermediate;
    type Refined = OnnxRefined;

    fn name(&self) -> &str {
        "onnx"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn preprocess(&self, inputs: &ModelInputSet) -> Result<Self::Intermediate, InferenceError> {
        let chunk = inputs.chunk_index;
        let err = stage_error(InferenceStage::Preprocess, chunk);

        let pcm = to_pcm16(&inputs.reference_samples);
        let audio = Array3::from_shape_vec((1, 1, pcm.len()), pcm).map_err(|e| {
            InferenceError::stage(InferenceStage::Preprocess, chunk, e.to_string())
        })?;
        let text_ids = Array2::from_shape_vec((1, inputs.text_ids.len()), inputs.text_ids.clone())
            .map_err(|e| InferenceError::stage(InferenceStage::Preprocess, chunk, e.to_string()))?;
        let max_duration = Array1::from_vec(vec![inputs.max_frames as i64]);

        let outputs = self
            .preprocess
            .run(ort::inputs![audio.view(), text_ids.view(), max_duration.view()].map_err(&err)?)
            .map_err(&err)?;

        if outputs.len() < 8 {
            return Err(InferenceError::ShapeMismatch {
                expected: "8 preprocess outputs".to_string(),
                actual: outputs.len().to_string(),
            });
        }

        let f32_output = |i: usize| -> Result<ArrayD<f32>, InferenceError> {
            Ok(outputs[i].try_extract_tensor::<f32>().map_err(&err)?.to_owned())
        };

        // Replace the model's own noise with the seeded draw
        let model_noise = f32_output(0)?;
        let noise = ArrayD::from_shape_vec(
            model_noise.raw_dim(),
            gaussian_noise(inputs.seed, model_noise.len()),
        )
        .map_err(|e| InferenceError::stage(InferenceStage::Preprocess, chunk, e.to_string()))?;

        Ok(OnnxIntermediate {
            chunk_index: chunk,
            noise,
            rope_cos_q: f32_output(1)?,
            rope_sin_q: f32_output(2)?,
            rope_cos_k: f32_output(3)?,
            rope_sin_k: f32_output(4)?,
            cat_mel_text: f32_output(5)?,
            cat_mel_text_drop: f32_output(6)?,
            ref_signal_len: outputs[7].try_extract_tensor::<i64>().map_err(&err)?.to_owned(),
        })
    }

    fn refine(
        &self,
        intermediate: Self::Intermediate,
        steps: u32,
    ) -> Result<Self::Refined, InferenceError> {
        let chunk = intermediate.chunk_index;
        let err = stage_error(InferenceStage::Refine, chunk);

        let mut noise = intermediate.noise;
        let mut time_step = Array1::from_vec(vec![0i32]);

        for _ in 0..steps.saturating_sub(1) {
            let outputs = self
                .transformer
                .run(
                    ort::inputs![
                        noise.view(),
                        intermediate.rope_cos_q.view(),
                        intermediate.rope_sin_q.view(),
                        intermediate.rope_cos_k.view(),
                        intermediate.rope_sin_k.view(),
                        intermediate.cat_mel_text.view(),
                        intermediate.cat_mel_text_drop.view(),
                        time_step.view(),
                    ]
                    .map_err(&err)?,
                )
                .map_err(&err)?;

            if outputs.len() < 2 {
                return Err(InferenceError::ShapeMismatch {
                    expected: "2 transformer outputs".to_string(),
                    actual: outputs.len().to_string(),
                });
            }
            let next_noise = outputs[0].try_extract_tensor::<f32>().map_err(&err)?.to_owned();
            let next_step = outputs[1].try_extract_tensor::<i32>().map_err(&err)?;
            time_step = Array1::from_iter(next_step.iter().copied());
            noise = next_noise;
        }

        Ok(OnnxRefined {
            chunk_index: chunk,
            noise,
            ref_signal_len: intermediate.ref_signal_len,
        })
    }

    fn decode(&self, refined: Self::Refined) -> Result<Vec<f32>, InferenceError> {
        let err = stage_error(InferenceStage::Decode, refined.chunk_index);

        let outputs = self
            .decode
            .run(ort::inputs![refined.noise.view(), refined.ref_signal_len.view()].map_err(&err)?)
            .map_err(&err)?;

        if outputs.len() == 0 {
            return Err(InferenceError::ShapeMismatch {
                expected: "1 decode output".to_string(),
                actual: "0".to_string(),
            });
        }

        // Exports differ: some emit float audio, some int16 PCM
        if let Ok(audio) = outputs[0].try_extract_tensor::<f32>() {
            return Ok(audio.iter().copied().collect());
        }
        let pcm = outputs[0].try_extract_tensor::<i16>().map_err(&err)?;
        Ok(pcm.iter().map(|&s| s as f32 / 32768.0).collect())
    }
}
