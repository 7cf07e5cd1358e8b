//! Reference sample catalog
//!
//! A YAML listing of bundled reference recordings, each tagged with gender,
//! group, area and emotion:
//!
//! ```yaml
//! samples:
//!   - filename: female/southern/story_01.wav
//!     gender: female
//!     group: story
//!     area: southern
//!     emotion: neutral
//!     text: "Ngày xửa ngày xưa, có một cô bé sống cùng bà."
//! ```
//!
//! A `.csv` listing with the columns `filename, gender, group, area,
//! emotion, text` is read as well. Rows with fewer than six fields or an
//! unknown attribute are skipped.

use std::fmt::Display;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use vietvoice_core::{
    Area, Emotion, Gender, Group, InputError, ReferenceVoice, ResourceError, VoiceFilter,
};

use crate::audio::load_wav_mono;

fn case_insensitive<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSample {
    /// Path relative to the catalog directory
    pub filename: String,
    #[serde(deserialize_with = "case_insensitive")]
    pub gender: Gender,
    #[serde(deserialize_with = "case_insensitive")]
    pub group: Group,
    #[serde(deserialize_with = "case_insensitive")]
    pub area: Area,
    #[serde(deserialize_with = "case_insensitive")]
    pub emotion: Emotion,
    /// Transcript of the recording
    pub text: String,
}

impl VoiceSample {
    /// True when every criterion set in `filter` matches
    pub fn matches(&self, filter: &VoiceFilter) -> bool {
        filter.gender.map_or(true, |g| g == self.gender)
            && filter.group.map_or(true, |g| g == self.group)
            && filter.area.map_or(true, |a| a == self.area)
            && filter.emotion.map_or(true, |e| e == self.emotion)
    }
}

fn sample_from_fields(
    filename: &str,
    gender: &str,
    group: &str,
    area: &str,
    emotion: &str,
    text: &str,
) -> Result<VoiceSample, InputError> {
    Ok(VoiceSample {
        filename: filename.to_string(),
        gender: gender.parse()?,
        group: group.parse()?,
        area: area.parse()?,
        emotion: emotion.parse()?,
        text: text.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    samples: Vec<VoiceSample>,
}

/// A resolved reference: audio location plus transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedVoice {
    pub path: PathBuf,
    pub text: String,
}

impl SelectedVoice {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Decode the audio at `sample_rate` and pair it with the transcript
    pub fn load(&self, sample_rate: u32) -> Result<ReferenceVoice, ResourceError> {
        let samples = load_wav_mono(&self.path, sample_rate)?;
        Ok(ReferenceVoice::new(samples, sample_rate, self.text.clone()))
    }
}

/// Bundled reference samples
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    root: PathBuf,
    samples: Vec<VoiceSample>,
}

impl VoiceCatalog {
    /// Load a catalog file; sample paths resolve against its directory
    ///
    /// A missing file yields an empty catalog so explicit references keep
    /// working without bundled samples.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

        if !path.exists() {
            tracing::warn!(path = %path.display(), "Voice catalog not found, starting empty");
            return Ok(Self::empty(root));
        }

        let is_csv = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));
        let catalog = if is_csv {
            let file = std::fs::File::open(path)
                .map_err(|e| ResourceError::Catalog(format!("{}: {}", path.display(), e)))?;
            Self::from_csv_reader(file, root)
        } else {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ResourceError::Catalog(format!("{}: {}", path.display(), e)))?;
            Self::from_yaml_str(&content, root)?
        };

        tracing::info!(
            path = %path.display(),
            samples = catalog.len(),
            "Voice catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_yaml_str(yaml: &str, root: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let file: CatalogFile =
            serde_yaml::from_str(yaml).map_err(|e| ResourceError::Catalog(e.to_string()))?;
        Ok(Self {
            root: root.into(),
            samples: file.samples,
        })
    }

    /// Read a headerless six-column listing, skipping malformed rows
    pub fn from_csv_reader(reader: impl Read, root: impl Into<PathBuf>) -> Self {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut samples = Vec::new();
        for (row, record) in csv.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(row, error = %e, "Skipping unreadable catalog row");
                    continue;
                }
            };
            if record.len() < 6 {
                continue;
            }
            let sample = sample_from_fields(
                &record[0], &record[1], &record[2], &record[3], &record[4], &record[5],
            );
            match sample {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    tracing::debug!(row, error = %e, "Skipping catalog row");
                }
            }
        }

        Self {
            root: root.into(),
            samples,
        }
    }

    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            samples: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn samples(&self) -> &[VoiceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples matching `filter`, in catalog order
    pub fn filter(&self, filter: &VoiceFilter) -> Vec<&VoiceSample> {
        self.samples.iter().filter(|s| s.matches(filter)).collect()
    }

    /// Pick the `iteration`-th match, wrapping past the end
    pub fn select(&self, filter: &VoiceFilter, iteration: usize) -> Result<SelectedVoice, InputError> {
        let matches = self.filter(filter);
        if matches.is_empty() {
            return Err(InputError::NoMatchingVoice(filter.to_string()));
        }
        let sample = matches[iteration % matches.len()];

        tracing::debug!(
            filter = %filter,
            iteration,
            candidates = matches.len(),
            filename = %sample.filename,
            "Reference sample selected"
        );

        Ok(SelectedVoice::new(self.sample_path(sample), sample.text.clone()))
    }

    /// On-disk location, falling back to the bare file name in the root
    pub fn sample_path(&self, sample: &VoiceSample) -> PathBuf {
        let nested = self.root.join(&sample.filename);
        if nested.exists() {
            return nested;
        }
        match Path::new(&sample.filename).file_name() {
            Some(name) => {
                let flat = self.root.join(name);
                if flat.exists() {
                    flat
                } else {
                    nested
                }
            }
            None => nested,
        }
    }
}
