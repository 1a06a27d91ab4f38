//! Recursive, token-measured text splitting with overlap.
//!
//! Text is cut on the coarsest separator it contains (paragraphs, then
//! lines, then words, then characters). Pieces are greedily merged back into
//! chunks of at most `chunk_size` tokens, and each new chunk starts with up
//! to `chunk_overlap` tokens carried over from the end of the previous one.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::tokens::TokenCounter;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Upper bound per chunk, in tokens.
    pub chunk_size: usize,
    /// Tokens repeated between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

pub struct TextSplitter<'a, T: ?Sized> {
    config: SplitterConfig,
    counter: &'a T,
}

impl<'a, T: TokenCounter + ?Sized> TextSplitter<'a, T> {
    pub fn new(config: SplitterConfig, counter: &'a T) -> Self {
        Self { config, counter }
    }

    fn len(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Split `text` into chunks. Text that already fits comes back as a
    /// single chunk equal to the trimmed input; blank text yields nothing.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if self.len(text) <= self.config.chunk_size {
            return vec![text.to_string()];
        }
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or_default();

        let pieces: Vec<&str> = if separator.is_empty() {
            text.split_inclusive(|_: char| true).collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if self.len(piece) < self.config.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }

        chunks
    }

    /// Greedily pack `pieces` into chunks, keeping an overlapping tail.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let SplitterConfig {
            chunk_size,
            chunk_overlap,
        } = self.config;
        let separator_len = self.len(separator);

        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let piece_len = self.len(piece);
            let joint = |window: &VecDeque<&str>| {
                if window.is_empty() {
                    0
                } else {
                    separator_len
                }
            };

            if total + piece_len + joint(&window) > chunk_size && !window.is_empty() {
                if total > chunk_size {
                    log::warn!(
                        "created a chunk of {} tokens, longer than the limit of {}",
                        total,
                        chunk_size
                    );
                }
                chunks.extend(join(&window, separator));

                // Drop from the front until what is left fits as overlap and
                // leaves room for the next piece.
                while !window.is_empty()
                    && (total > chunk_overlap
                        || total + piece_len + joint(&window) > chunk_size)
                {
                    let dropped = window.pop_front().map(|p| self.len(p)).unwrap_or(0);
                    let dropped_joint = if window.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(dropped + dropped_joint);
                }
            }

            window.push_back(piece);
            total += piece_len + if window.len() > 1 { separator_len } else { 0 };
        }

        chunks.extend(join(&window, separator));
        chunks
    }
}

fn join(window: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
