//! Document chunking for embedding
//!
//! Splits normalized document text into overlapping passages. Chunks are
//! exact slices of the normalized text, so concatenating them in ordinal
//! order with overlap regions dropped reconstructs it losslessly.

use crate::config::ChunkingConfig;
use crate::error::{AdmitaError, Result};

/// A contiguous passage of a document's normalized text
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Ordinal position within the document
    pub seq: u32,
    /// Byte offset of the chunk start in the normalized text
    pub start: usize,
    /// Byte offset one past the chunk end
    pub end: usize,
    pub text: String,
}

/// Splits documents into overlapping chunks. Pure function of input and
/// configuration; construction fails fast on unusable sizing.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(AdmitaError::Config("chunk_size must be positive".into()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(AdmitaError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        })
    }

    /// Normalize and split a document's text
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let content = normalize_text(text);
        if content.is_empty() {
            return Vec::new();
        }
        if content.len() <= self.chunk_size {
            return vec![Chunk {
                seq: 0,
                start: 0,
                end: content.len(),
                text: content,
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut seq = 0u32;

        while start < content.len() {
            let raw_end = (start + self.chunk_size).min(content.len());
            let end = floor_char_boundary(&content, raw_end);
            let mut chunk_end = end;

            // Prefer a sentence or paragraph break in the last 30%
            if end < content.len() {
                let search_start_raw = start + (self.chunk_size * 70 / 100);
                let search_start = ceil_char_boundary(&content, search_start_raw);

                if search_start < end {
                    let search_region = &content[search_start..end];

                    if let Some(pos) = search_region.rfind("\n\n") {
                        chunk_end = search_start + pos + 2;
                    } else if let Some(pos) = search_region.rfind(". ") {
                        chunk_end = search_start + pos + 2;
                    } else if let Some(pos) = search_region.rfind('\n') {
                        chunk_end = search_start + pos + 1;
                    } else if let Some(pos) = search_region.rfind(' ') {
                        chunk_end = search_start + pos + 1;
                    }
                }
            }

            chunk_end = floor_char_boundary(&content, chunk_end);

            chunks.push(Chunk {
                seq,
                start,
                end: chunk_end,
                text: content[start..chunk_end].to_string(),
            });
            seq += 1;

            if chunk_end >= content.len() {
                break;
            }

            // A break cut plus a large overlap could move the window
            // backwards; forward progress wins over overlap in that case.
            let new_start = ceil_char_boundary(&content, chunk_end.saturating_sub(self.overlap));
            start = if new_start > start { new_start } else { chunk_end };
        }

        chunks
    }
}

/// Collapse whitespace runs and strip control characters.
///
/// Paragraph breaks survive as exactly one blank line so the chunker can
/// still prefer them as split points.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_newlines = 0usize;
    let mut pending_space = false;

    for ch in text.chars() {
        match ch {
            '\n' => pending_newlines += 1,
            c if c.is_whitespace() => pending_space = true,
            c if c.is_control() => {}
            c => {
                if pending_newlines >= 2 {
                    if !out.is_empty() {
                        out.push_str("\n\n");
                    }
                } else if pending_newlines == 1 {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                } else if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_newlines = 0;
                pending_space = false;
                out.push(c);
            }
        }
    }

    out
}

/// Find a valid char boundary at or before the given byte index
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Find a valid char boundary at or after the given byte index
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(&ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
        .unwrap()
    }

    /// Reassemble normalized text from chunks by dropping overlap regions
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0usize;
        for chunk in chunks {
            let skip = covered.saturating_sub(chunk.start);
            out.push_str(&chunk.text[skip..]);
            covered = chunk.end;
        }
        out
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let bad = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(Chunker::new(&bad).is_err());
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunks = chunker(100, 20).chunk("Small content.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Small content.");
        assert_eq!(chunks[0].seq, 0);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "First paragraph about machine learning.\n\nSecond paragraph \
                    about product management. Third sentence here. Fourth one."
            .repeat(10);
        let a = chunker(120, 30).chunk(&text);
        let b = chunker(120, 30).chunk(&text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_three_chunks_for_2500_chars() {
        // No break characters, so every cut is a hard cut
        let text = "a".repeat(2500);
        let chunks = chunker(1000, 200).chunk(&text);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 1000);
        }
        for pair in chunks.windows(2) {
            assert!(pair[0].end.saturating_sub(pair[1].start) <= 200);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_prefers_sentence_breaks() {
        let sentence = "This is a sentence about the curriculum. ";
        let text = sentence.repeat(20);
        let chunks = chunker(100, 20).chunk(&text);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(
                chunk.text.ends_with(". ") || chunk.text.ends_with(' '),
                "chunk should end at a natural break: {:?}",
                chunk.text
            );
        }
    }

    #[test]
    fn test_handles_unicode() {
        let text = "Обучение 世界 программа 🎓 ".repeat(30);
        let chunks = chunker(50, 10).chunk(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
        }
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a   b\t\tc"), "a b c");
        assert_eq!(normalize_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\u{0000}b"), "ab");
        assert_eq!(normalize_text("  leading"), "leading");
    }

    proptest! {
        #[test]
        fn prop_roundtrip_reconstructs_normalized_text(
            text in "[ -~\n]{0,4000}",
            size in 50usize..500,
            overlap in 0usize..49,
        ) {
            let chunks = chunker(size, overlap).chunk(&text);
            let normalized = normalize_text(&text);
            prop_assert_eq!(reconstruct(&chunks), normalized);
        }

        #[test]
        fn prop_chunks_respect_size_bound(text in "[a-z ]{0,3000}") {
            let size = 200;
            let chunks = chunker(size, 40).chunk(&text);
            for chunk in &chunks {
                prop_assert!(chunk.text.len() <= size);
            }
        }
    }
}
