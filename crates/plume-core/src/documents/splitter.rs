//! Recursive character splitter.
//!
//! Text is cut on the coarsest separator that occurs in it (paragraphs, then
//! lines, then words, then single characters). Pieces that are still too long
//! are split again with the finer separators. Short pieces are packed back into
//! chunks of at most `chunk_size` characters, and each new chunk starts with up
//! to `chunk_overlap` characters carried over from the previous one.
//!
//! Lengths are counted in `char`s, not bytes.

use std::collections::VecDeque;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into overlapping chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    /// Creates a splitter. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// Maximum chunk length.
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by neighbouring chunks.
    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into trimmed, non-empty chunks in document order.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (index, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map_or((separators.len(), ""), |(i, sep)| (i, *sep));
        let finer = separators.get(index + 1..).unwrap_or_default();

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                short.push(piece);
                continue;
            }
            if !short.is_empty() {
                chunks.extend(self.merge(&short, separator));
                short.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !short.is_empty() {
            chunks.extend(self.merge(&short, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let piece_len = char_len(piece);
            let joined_len = |total: usize, window: &VecDeque<&str>| {
                total + piece_len + if window.is_empty() { 0 } else { separator_len }
            };

            if joined_len(total, &window) > self.chunk_size && !window.is_empty() {
                push_chunk(&mut chunks, &window, separator);
                while total > self.chunk_overlap
                    || (joined_len(total, &window) > self.chunk_size && total > 0)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { separator_len };
                }
            }

            total += piece_len + if window.is_empty() { 0 } else { separator_len };
            window.push_back(piece);
        }

        push_chunk(&mut chunks, &window, separator);
        chunks
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CHUNK_SIZE, crate::config::DEFAULT_CHUNK_OVERLAP)
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
