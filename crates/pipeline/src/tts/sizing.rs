//! Chunk sizing from the reference voice's speaking rate
//!
//! The character budget per chunk follows the reference speaker's
//! articulation rate so every chunk's synthesized audio stays inside the
//! model's stable window, whatever the speaker's pace.

use vietvoice_config::constants::chunking::MIN_CHARS_PER_CHUNK;
use vietvoice_config::SynthesisConfig;
use vietvoice_text_processing::{weighted_length, ChunkerConfig, SentenceChunker};

/// Per-request chunk budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBudget {
    /// Reference transcript bytes per second of reference audio
    pub chars_per_second: f64,
    /// Character budget per chunk
    pub max_chars: usize,
}

impl ChunkBudget {
    /// Spoken duration estimate at the reference rate
    ///
    /// Infinite when the rate is unknown, so nothing looks undersized.
    pub fn estimated_secs(&self, text: &str) -> f64 {
        if self.chars_per_second > 0.0 {
            text.len() as f64 / self.chars_per_second
        } else {
            f64::INFINITY
        }
    }
}

/// Derives chunk budgets and enforces the minimum chunk duration
#[derive(Debug, Clone)]
pub struct ChunkSizingPolicy {
    max_chunk_duration: f64,
    min_target_duration: f64,
    min_chars: usize,
}

impl ChunkSizingPolicy {
    pub fn new(max_chunk_duration: f64, min_target_duration: f64) -> Self {
        Self {
            max_chunk_duration,
            min_target_duration,
            min_chars: MIN_CHARS_PER_CHUNK,
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.max_chunk_duration, config.min_target_duration)
    }

    /// Budget from the reference transcript and its audio duration
    pub fn budget(&self, reference_text: &str, reference_secs: f64) -> ChunkBudget {
        let bytes = reference_text.len();
        if bytes == 0 || !(reference_secs.is_finite() && reference_secs > 0.0) {
            tracing::warn!(
                reference_bytes = bytes,
                reference_secs,
                min_chars = self.min_chars,
                "Reference speaking rate unknown, using minimum chunk budget"
            );
            return ChunkBudget {
                chars_per_second: 0.0,
                max_chars: self.min_chars,
            };
        }

        let chars_per_second = bytes as f64 / reference_secs;
        let raw = (chars_per_second * self.max_chunk_duration).floor();
        let max_chars = if raw.is_finite() && raw > 0.0 {
            (raw as usize).max(self.min_chars)
        } else {
            self.min_chars
        };

        ChunkBudget {
            chars_per_second,
            max_chars,
        }
    }

    /// Chunk cleaned text and merge chunks that would be too short to speak
    pub fn plan(&self, cleaned_text: &str, budget: &ChunkBudget) -> Vec<String> {
        let chunker = SentenceChunker::new(ChunkerConfig::with_max_chars(budget.max_chars));
        let chunks = chunker.chunk(cleaned_text);
        self.merge_undersized(chunks, budget)
    }

    /// Merge chunks estimated below the minimum duration
    ///
    /// A short chunk joins the following chunk, or the preceding one when it
    /// is last, only if the result fits the budget. Otherwise it is kept.
    pub fn merge_undersized(&self, mut chunks: Vec<String>, budget: &ChunkBudget) -> Vec<String> {
        let fits = |a: &str, b: &str| a.chars().count() + 1 + b.chars().count() <= budget.max_chars;

        let mut i = 0;
        while i < chunks.len() && chunks.len() > 1 {
            if budget.estimated_secs(&chunks[i]) >= self.min_target_duration {
                i += 1;
                continue;
            }

            let last = i + 1 == chunks.len();
            if !last && fits(&chunks[i], &chunks[i + 1]) {
                let next = chunks.remove(i + 1);
                chunks[i].push(' ');
                chunks[i].push_str(&next);
            } else if last && i > 0 && fits(&chunks[i - 1], &chunks[i]) {
                let short = chunks.remove(i);
                chunks[i - 1].push(' ');
                chunks[i - 1].push_str(&short);
                i -= 1;
            } else {
                tracing::debug!(
                    chunk = i,
                    estimated_secs = budget.estimated_secs(&chunks[i]),
                    "Short chunk kept, no merge fits the budget"
                );
                i += 1;
            }
        }
        chunks
    }
}

/// Frame counts handed to the model for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEstimate {
    pub ref_frames: usize,
    pub max_frames: usize,
}

/// Estimate total frames for reference plus target text
///
/// Target frames scale with the weighted length ratio of target to
/// reference text, divided by the speed multiplier. The generated part is
/// capped at `u32::MAX` frames and the sum saturates.
pub fn estimate_frames(
    reference_samples: usize,
    hop_length: usize,
    reference_text: &str,
    chunk_text: &str,
    speed: f64,
) -> FrameEstimate {
    let ref_frames = reference_samples / hop_length.max(1) + 1;
    let ref_len = weighted_length(reference_text).max(1) as f64;
    let target_len = weighted_length(chunk_text) as f64;

    let generated = (ref_frames as f64 / ref_len * target_len / speed).floor();
    let generated = if generated.is_finite() && generated > 0.0 {
        generated.min(u32::MAX as f64) as usize
    } else {
        0
    };

    FrameEstimate {
        ref_frames,
        max_frames: ref_frames.saturating_add(generated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_tracks_speaking_rate() {
        let policy = ChunkSizingPolicy::new(15.0, 1.0);
        // 100 bytes over 5 seconds: 20 bytes/s
        let budget = policy.budget(&"a".repeat(100), 5.0);
        assert!((budget.chars_per_second - 20.0).abs() < 1e-9);
        assert_eq!(budget.max_chars, 300);

        let slow = policy.budget(&"a".repeat(50), 5.0);
        assert_eq!(slow.max_chars, 150);
    }

    #[test]
    fn test_budget_counts_bytes() {
        let policy = ChunkSizingPolicy::new(10.0, 1.0);
        // 'đ' is two bytes
        let budget = policy.budget("đđđđđ", 1.0);
        assert_eq!(budget.max_chars, 100);
    }

    #[test]
    fn test_budget_floor() {
        let policy = ChunkSizingPolicy::new(15.0, 1.0);
        assert_eq!(policy.budget("a", 60.0).max_chars, MIN_CHARS_PER_CHUNK);
        assert_eq!(policy.budget("", 3.0).max_chars, MIN_CHARS_PER_CHUNK);
        assert_eq!(policy.budget("hello", 0.0).max_chars, MIN_CHARS_PER_CHUNK);
        assert_eq!(policy.budget("hello", f64::NAN).max_chars, MIN_CHARS_PER_CHUNK);
    }

    #[test]
    fn test_undersized_merges_forward() {
        let policy = ChunkSizingPolicy::new(15.0, 1.0);
        let budget = ChunkBudget {
            chars_per_second: 10.0,
            max_chars: 40,
        };
        let merged = policy.merge_undersized(
            vec!["Ừ.".to_string(), "Chúng ta đi thôi nào.".to_string()],
            &budget,
        );
        assert_eq!(merged, vec!["Ừ. Chúng ta đi thôi nào."]);
    }

    #[test]
    fn test_undersized_last_merges_backward() {
        let policy = ChunkSizingPolicy::new(15.0, 1.0);
        let budget = ChunkBudget {
            chars_per_second: 10.0,
            max_chars: 40,
        };
        let merged = policy.merge_undersized(
            vec!["Hôm nay trời đẹp quá.".to_string(), "Vâng.".to_string()],
            &budget,
        );
        assert_eq!(merged, vec!["Hôm nay trời đẹp quá. Vâng."]);
    }

    #[test]
    fn test_undersized_kept_when_nothing_fits() {
        let policy = ChunkSizingPolicy::new(15.0, 1.0);
        let budget = ChunkBudget {
            chars_per_second: 10.0,
            max_chars: 20,
        };
        let chunks = vec!["Ồ.".to_string(), "Một câu khá là dài đó.".to_string()];
        assert_eq!(policy.merge_undersized(chunks.clone(), &budget), chunks);
    }

    #[test]
    fn test_single_chunk_untouched() {
        let policy = ChunkSizingPolicy::new(15.0, 1.0);
        let budget = ChunkBudget {
            chars_per_second: 10.0,
            max_chars: 40,
        };
        assert_eq!(policy.merge_undersized(vec!["Ồ.".to_string()], &budget), vec!["Ồ."]);
    }

    #[test]
    fn test_plan_respects_budget() {
        let policy = ChunkSizingPolicy::new(3.0, 0.5);
        let budget = policy.budget(&"a".repeat(100), 10.0);
        assert_eq!(budget.max_chars, 30);

        let text = "Một hai ba bốn năm. Sáu bảy tám chín mười. Mười một mười hai mười ba.";
        let chunks = policy.plan(text, &budget);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_estimate_frames() {
        // 24000 samples / 256 hop = 93 + 1
        let est = estimate_frames(24000, 256, "abcd", "abcdefgh", 1.0);
        assert_eq!(est.ref_frames, 94);
        assert_eq!(est.max_frames, 94 + 188);

        let slower = estimate_frames(24000, 256, "abcd", "abcdefgh", 0.5);
        assert_eq!(slower.max_frames, 94 + 376);
    }

    #[test]
    fn test_estimate_frames_tiny_speed_is_bounded() {
        let est = estimate_frames(24000, 256, "abcd", "abcdefgh", 1e-300);
        assert_eq!(est.ref_frames, 94);
        assert_eq!(est.max_frames, 94 + u32::MAX as usize);

        let est = estimate_frames(usize::MAX, 1, "abcd", "abcdefgh", 1.0);
        assert_eq!(est.max_frames, usize::MAX);
    }

    #[test]
    fn test_estimate_frames_weights_punctuation() {
        let plain = estimate_frames(25600, 256, "abcdefghij", "abcd", 1.0);
        let paused = estimate_frames(25600, 256, "abcdefghij", "ab, d", 1.0);
        assert!(paused.max_frames > plain.max_frames);
    }
}
