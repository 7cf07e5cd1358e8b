//! Text processing for chunked speech synthesis
//!
//! - `normalizer`: restrict raw text to the speakable alphabet
//! - `chunker`: split cleaned text into boundary-respecting chunks
//! - `vocab`: character to model index lookup

pub mod chunker;
pub mod normalizer;
pub mod vocab;

pub use chunker::{chunk_text, ChunkerConfig, SentenceChunker};
pub use normalizer::{clean_text, has_speakable_content, weighted_length};
pub use vocab::Vocabulary;
