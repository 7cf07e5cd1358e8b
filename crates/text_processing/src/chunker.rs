//! Boundary-respecting text chunker
//!
//! Splits cleaned text into chunks of at most `max_chars` characters,
//! preferring sentence boundaries, then comma boundaries, then word
//! boundaries. Words are never split; a single word longer than the budget
//! becomes its own oversized chunk.
//!
//! Joining the chunks with single spaces reproduces the input's words in
//! order.

use serde::{Deserialize, Serialize};

use vietvoice_config::constants::chunking::MIN_WORDS_PER_CHUNK;

const SENTENCE_ENDINGS: &[char] = &['.', '!', '?'];

/// Chunker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Soft character budget per chunk
    pub max_chars: usize,
    /// Chunks with fewer words are merged into a neighbour when it fits
    pub min_words: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: 135,
            min_words: MIN_WORDS_PER_CHUNK,
        }
    }
}

impl ChunkerConfig {
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars,
            ..Default::default()
        }
    }
}

/// Sentence-first chunker
#[derive(Debug, Clone, Default)]
pub struct SentenceChunker {
    config: ChunkerConfig,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Length of `words` joined by single spaces
fn joined_len(words: &[&str]) -> usize {
    if words.is_empty() {
        return 0;
    }
    words.iter().map(|w| char_len(w)).sum::<usize>() + words.len() - 1
}

impl SentenceChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into ordered chunks
    ///
    /// The input is expected to be cleaned already; it is not cleaned here.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut fragments = Vec::new();
        for sentence in split_after(&words, SENTENCE_ENDINGS) {
            self.split_sentence(sentence, &mut fragments);
        }

        let chunks = self.pack(fragments);
        self.merge_short(chunks)
    }

    fn split_sentence(&self, sentence: &[&str], out: &mut Vec<String>) {
        let max = self.config.max_chars;
        if joined_len(sentence) <= max {
            out.push(sentence.join(" "));
            return;
        }

        for part in split_after(sentence, &[',']) {
            if joined_len(part) <= max {
                out.push(part.join(" "));
            } else {
                self.pack_words(part, out);
            }
        }
    }

    /// Greedy word packing for parts without usable punctuation
    fn pack_words(&self, words: &[&str], out: &mut Vec<String>) {
        let max = self.config.max_chars;
        let mut current: Vec<&str> = Vec::new();

        for &word in words {
            if !current.is_empty() && joined_len(&current) + 1 + char_len(word) > max {
                out.push(current.join(" "));
                current.clear();
            }
            if current.is_empty() && char_len(word) > max {
                tracing::warn!(
                    word_chars = char_len(word),
                    max_chars = max,
                    "Word exceeds chunk budget, emitting oversized chunk"
                );
            }
            current.push(word);
        }

        if !current.is_empty() {
            out.push(current.join(" "));
        }
    }

    /// Pack fragments in order, never splitting one
    fn pack(&self, fragments: Vec<String>) -> Vec<String> {
        let max = self.config.max_chars;
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for fragment in fragments {
            if current.is_empty() {
                current = fragment;
            } else if char_len(&current) + 1 + char_len(&fragment) <= max {
                current.push(' ');
                current.push_str(&fragment);
            } else {
                chunks.push(std::mem::replace(&mut current, fragment));
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Fold chunks with too few words into a neighbour, next one first
    fn merge_short(&self, mut chunks: Vec<String>) -> Vec<String> {
        let max = self.config.max_chars;
        let fits = |a: &str, b: &str| char_len(a) + 1 + char_len(b) <= max;

        let mut i = 0;
        while i < chunks.len() && chunks.len() > 1 {
            if chunks[i].split_whitespace().count() >= self.config.min_words {
                i += 1;
                continue;
            }

            if i + 1 < chunks.len() && fits(&chunks[i], &chunks[i + 1]) {
                let next = chunks.remove(i + 1);
                chunks[i].push(' ');
                chunks[i].push_str(&next);
            } else if i > 0 && fits(&chunks[i - 1], &chunks[i]) {
                let short = chunks.remove(i);
                chunks[i - 1].push(' ');
                chunks[i - 1].push_str(&short);
                i -= 1;
            } else {
                i += 1;
            }
        }
        chunks
    }
}

/// Split a word list after every word ending in one of `endings`
fn split_after<'a, 'b>(words: &'a [&'b str], endings: &[char]) -> Vec<&'a [&'b str]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, word) in words.iter().enumerate() {
        if word.ends_with(endings) {
            parts.push(&words[start..=i]);
            start = i + 1;
        }
    }
    if start < words.len() {
        parts.push(&words[start..]);
    }
    parts
}

/// Chunk with the default minimum word count
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    SentenceChunker::new(ChunkerConfig::with_max_chars(max_chars)).chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::clean_text;

    fn words_of(chunks: &[String]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| c.split_whitespace().map(str::to_string))
            .collect()
    }

    fn assert_budget(chunks: &[String], max: usize) {
        for chunk in chunks {
            assert!(
                chunk.chars().count() <= max || chunk.split_whitespace().count() == 1,
                "chunk over budget: {chunk:?}"
            );
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("Hello world", 50), vec!["Hello world"]);
    }

    #[test]
    fn test_oversized_word() {
        let word = "a".repeat(35);
        assert_eq!(chunk_text(&word, 20), vec![word]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(chunk_text("", 50).is_empty());
        assert!(chunk_text("   \n\t  ", 50).is_empty());
    }

    #[test]
    fn test_sentence_boundaries() {
        let text = "Hôm nay trời rất đẹp. Chúng tôi đi dạo công viên. Buổi tối về nhà ăn cơm.";
        let chunks = chunk_text(text, 50);
        assert_eq!(
            chunks,
            vec![
                "Hôm nay trời rất đẹp. Chúng tôi đi dạo công viên.",
                "Buổi tối về nhà ăn cơm.",
            ]
        );
    }

    #[test]
    fn test_comma_split_keeps_comma() {
        let text = "first part of the clause, second part of the clause, third part here.";
        let chunks = chunk_text(text, 30);
        assert_eq!(
            chunks,
            vec![
                "first part of the clause,",
                "second part of the clause,",
                "third part here.",
            ]
        );
        assert_budget(&chunks, 30);
    }

    #[test]
    fn test_word_packing_without_punctuation() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = chunk_text(text, 20);
        assert_budget(&chunks, 20);
        assert_eq!(words_of(&chunks).join(" "), text);
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn test_short_chunk_merges_forward() {
        let chunker = SentenceChunker::new(ChunkerConfig {
            max_chars: 40,
            min_words: 4,
        });
        let merged = chunker.merge_short(vec![
            "Hi there.".to_string(),
            "This is the next chunk.".to_string(),
            "And one more sentence to end.".to_string(),
        ]);
        assert_eq!(
            merged,
            vec!["Hi there. This is the next chunk.", "And one more sentence to end."]
        );
    }

    #[test]
    fn test_short_last_chunk_merges_backward() {
        let chunker = SentenceChunker::new(ChunkerConfig {
            max_chars: 40,
            min_words: 4,
        });
        let merged = chunker.merge_short(vec![
            "This is the first chunk.".to_string(),
            "Bye now.".to_string(),
        ]);
        assert_eq!(merged, vec!["This is the first chunk. Bye now."]);
    }

    #[test]
    fn test_short_chunk_kept_when_no_room() {
        let chunker = SentenceChunker::new(ChunkerConfig {
            max_chars: 25,
            min_words: 4,
        });
        let chunks = chunker.chunk("Alpha beta gamma delta. Hi.");
        assert_eq!(chunks, vec!["Alpha beta gamma delta.", "Hi."]);
    }

    #[test]
    fn test_invariants_on_cleaned_text() {
        let raw = "Ngày xửa ngày xưa, có một cô gái tên là Tấm, sống cùng dì ghẻ và em gái Cám.\n\
                   Tấm hiền lành chăm chỉ; Cám thì lười biếng. Một hôm, dì ghẻ sai hai chị em đi bắt tép \
                   ngoài đồng, hứa ai bắt được nhiều sẽ thưởng cho một cái yếm đỏ!\n\
                   Siêuuuuuuuuuuuuuuuuuuuuuuuuuuuuuuuuuudài";
        let cleaned = clean_text(raw);
        for max in [10, 20, 35, 60, 135] {
            let chunks = chunk_text(&cleaned, max);
            assert_budget(&chunks, max);
            assert_eq!(
                words_of(&chunks),
                cleaned.split_whitespace().map(str::to_string).collect::<Vec<_>>(),
                "words lost at max_chars={max}"
            );
            assert!(chunks.iter().all(|c| !c.is_empty()));
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Một hai ba. Bốn năm sáu bảy, tám chín mười. Mười một.";
        assert_eq!(chunk_text(text, 25), chunk_text(text, 25));
    }
}
