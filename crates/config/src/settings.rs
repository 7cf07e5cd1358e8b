//! Top-level settings
//!
//! Layered: code defaults, then `config/default.*`, then `config/{env}.*`,
//! then `VIETVOICE__...` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{env, model, paths};
use crate::synthesis::SynthesisConfig;
use crate::ConfigError;

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub models: ModelPaths,

    #[serde(default)]
    pub voices: VoiceCatalogConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Where model artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPaths {
    /// Directory holding the onnx sessions and vocabulary
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Explicit vocabulary file; defaults to `<model_dir>/vocab.txt`
    #[serde(default)]
    pub vocab_file: Option<PathBuf>,

    /// Intra-op threads per session (0 lets the runtime decide)
    #[serde(default)]
    pub intra_threads: usize,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(paths::MODEL_DIR)
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            vocab_file: None,
            intra_threads: 0,
        }
    }
}

impl ModelPaths {
    pub fn vocab_path(&self) -> PathBuf {
        self.vocab_file
            .clone()
            .unwrap_or_else(|| self.model_dir.join(model::VOCAB_FILE))
    }

    pub fn preprocess_path(&self) -> PathBuf {
        self.model_dir.join(model::PREPROCESS_MODEL)
    }

    pub fn transformer_path(&self) -> PathBuf {
        self.model_dir.join(model::TRANSFORMER_MODEL)
    }

    pub fn decode_path(&self) -> PathBuf {
        self.model_dir.join(model::DECODE_MODEL)
    }
}

/// Reference sample catalog location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(paths::VOICE_CATALOG)
}

impl Default for VoiceCatalogConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.synthesis.validate()?;
        if self.observability.log_level.trim().is_empty() {
            return Err(ConfigError::invalid("observability.log_level", "must not be empty"));
        }
        Ok(())
    }

    /// Load a single YAML file without layering
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;
        let settings: Settings =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Load settings from `./config` plus environment variables
pub fn load_settings(env_name: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new(paths::CONFIG_DIR), env_name)
}

/// Load settings from a given config directory plus environment variables
pub fn load_settings_from(config_dir: &Path, env_name: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(config_dir.join(paths::CONFIG_DEFAULT)).required(false));

    if let Some(name) = env_name {
        builder = builder.add_source(File::from(config_dir.join(name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(env::PREFIX)
            .separator(env::SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        config_dir = %config_dir.display(),
        env = env_name.unwrap_or("none"),
        "Settings loaded"
    );

    Ok(settings)
}
