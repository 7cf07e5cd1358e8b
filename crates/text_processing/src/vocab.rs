//! Character vocabulary
//!
//! One entry per line; the zero-based line number is the token index.
//! Characters missing from the vocabulary encode to a fixed index instead of
//! failing.

use std::collections::HashMap;
use std::path::Path;

use vietvoice_config::constants::model::UNKNOWN_TOKEN_ID;
use vietvoice_core::ResourceError;

/// Character to model index map
#[derive(Debug, Clone)]
pub struct Vocabulary {
    map: HashMap<char, i32>,
    entries: usize,
}

impl Vocabulary {
    /// Load a vocabulary listing from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ResourceError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResourceError::Vocabulary(format!("failed to read {}: {}", path.display(), e))
        })?;

        let vocab = Self::from_lines(content.lines())?;
        tracing::info!(
            path = %path.display(),
            entries = vocab.entries,
            mapped = vocab.map.len(),
            "Vocabulary loaded"
        );
        Ok(vocab)
    }

    /// Build from listing lines
    ///
    /// Lines are not trimmed: a line holding a single space maps the space
    /// character. Entries that are not exactly one character keep their
    /// index but are unreachable from per-character lookup. A repeated
    /// character maps to its last line.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, ResourceError> {
        let mut map = HashMap::new();
        let mut entries = 0usize;

        for (index, line) in lines.into_iter().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            entries = index + 1;
            let id = i32::try_from(index)
                .map_err(|_| ResourceError::Vocabulary(format!("index {} overflows", index)))?;

            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    map.insert(c, id);
                }
                (None, _) => {}
                _ => {
                    tracing::debug!(line = index, entry = line, "Skipping multi-character entry");
                }
            }
        }

        if map.is_empty() {
            return Err(ResourceError::Vocabulary(
                "no single-character entries".to_string(),
            ));
        }

        Ok(Self { map, entries })
    }

    /// Index for one character
    pub fn index_of(&self, c: char) -> i32 {
        self.map.get(&c).copied().unwrap_or(UNKNOWN_TOKEN_ID)
    }

    /// Encode text character by character
    pub fn encode(&self, text: &str) -> Vec<i32> {
        text.chars().map(|c| self.index_of(c)).collect()
    }

    pub fn contains(&self, c: char) -> bool {
        self.map.contains_key(&c)
    }

    /// Number of lines in the listing
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}
