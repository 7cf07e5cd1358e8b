//! Synthesis knobs consumed by the orchestration core
//!
//! Every value has a documented default. `validate` must pass before any
//! inference work starts.

use serde::{Deserialize, Serialize};

use crate::constants::{model, synthesis};
use crate::ConfigError;

/// Numeric configuration for one synthesis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Refinement step count
    #[serde(default = "default_nfe_step")]
    pub nfe_step: u32,

    /// Default speed multiplier; a request may override it
    #[serde(default = "default_speed")]
    pub speed: f64,

    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Output sample rate (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Samples per model frame
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,

    /// Crossfade between adjacent chunks (seconds, 0 = hard splice)
    #[serde(default = "default_cross_fade_duration")]
    pub cross_fade_duration: f64,

    /// Maximum synthesized duration per chunk (seconds)
    #[serde(default = "default_max_chunk_duration")]
    pub max_chunk_duration: f64,

    /// Chunks estimated shorter than this are merged (seconds)
    #[serde(default = "default_min_target_duration")]
    pub min_target_duration: f64,
}

fn default_nfe_step() -> u32 {
    synthesis::NFE_STEP
}
fn default_speed() -> f64 {
    synthesis::SPEED
}
fn default_random_seed() -> u64 {
    synthesis::RANDOM_SEED
}
fn default_sample_rate() -> u32 {
    model::SAMPLE_RATE
}
fn default_hop_length() -> usize {
    model::HOP_LENGTH
}
fn default_cross_fade_duration() -> f64 {
    synthesis::CROSS_FADE_DURATION
}
fn default_max_chunk_duration() -> f64 {
    synthesis::MAX_CHUNK_DURATION
}
fn default_min_target_duration() -> f64 {
    synthesis::MIN_TARGET_DURATION
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            nfe_step: default_nfe_step(),
            speed: default_speed(),
            random_seed: default_random_seed(),
            sample_rate: default_sample_rate(),
            hop_length: default_hop_length(),
            cross_fade_duration: default_cross_fade_duration(),
            max_chunk_duration: default_max_chunk_duration(),
            min_target_duration: default_min_target_duration(),
        }
    }
}

impl SynthesisConfig {
    /// Reject out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nfe_step == 0 || self.nfe_step > synthesis::MAX_NFE_STEP {
            return Err(ConfigError::invalid(
                "nfe_step",
                format!(
                    "must be between 1 and {}, got {}",
                    synthesis::MAX_NFE_STEP,
                    self.nfe_step
                ),
            ));
        }
        validate_speed(self.speed)?;
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("sample_rate", "must be positive"));
        }
        if self.hop_length == 0 {
            return Err(ConfigError::invalid("hop_length", "must be positive"));
        }
        if !(self.max_chunk_duration.is_finite() && self.max_chunk_duration > 0.0) {
            return Err(ConfigError::invalid(
                "max_chunk_duration",
                format!("must be positive, got {}", self.max_chunk_duration),
            ));
        }
        if !(self.min_target_duration.is_finite() && self.min_target_duration >= 0.0) {
            return Err(ConfigError::invalid(
                "min_target_duration",
                format!("must be non-negative, got {}", self.min_target_duration),
            ));
        }
        if !(self.cross_fade_duration.is_finite() && self.cross_fade_duration >= 0.0) {
            return Err(ConfigError::invalid(
                "cross_fade_duration",
                format!("must be non-negative, got {}", self.cross_fade_duration),
            ));
        }
        if self.min_target_duration >= self.max_chunk_duration {
            return Err(ConfigError::invalid(
                "min_target_duration",
                format!(
                    "{} must be below max_chunk_duration {}",
                    self.min_target_duration, self.max_chunk_duration
                ),
            ));
        }
        Ok(())
    }

    /// Crossfade length in samples at the configured rate
    pub fn cross_fade_samples(&self) -> usize {
        (self.cross_fade_duration * self.sample_rate as f64).round() as usize
    }

    /// Whether a reference sample leaves room for target audio in one chunk
    ///
    /// A reference at least as long as `max_chunk_duration` cannot fit
    /// alongside any target text in the model's window.
    pub fn check_reference_duration(&self, reference_secs: f64) -> Result<(), ConfigError> {
        if reference_secs >= self.max_chunk_duration {
            return Err(ConfigError::invalid(
                "reference_audio",
                format!(
                    "reference lasts {:.2}s, which is not below max_chunk_duration {:.2}s",
                    reference_secs, self.max_chunk_duration
                ),
            ));
        }
        Ok(())
    }

    /// Serialize to a JSON object
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Build from a (possibly partial) JSON object, filling defaults
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Speed must lie in `MIN_SPEED..=MAX_SPEED`
pub fn validate_speed(speed: f64) -> Result<(), ConfigError> {
    if !(synthesis::MIN_SPEED..=synthesis::MAX_SPEED).contains(&speed) {
        return Err(ConfigError::invalid(
            "speed",
            format!(
                "must be between {} and {}, got {}",
                synthesis::MIN_SPEED,
                synthesis::MAX_SPEED,
                speed
            ),
        ));
    }
    Ok(())
}
