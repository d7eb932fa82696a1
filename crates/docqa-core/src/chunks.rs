//! Splits extracted text into overlapping chunks for embedding and retrieval.
//!
//! A window of `chunk_size` characters slides over the text. Each chunk ends just
//! after the last separator in its window when there is one, otherwise at a hard cut.
//! The next chunk starts `overlap` characters before the previous one ended.
//! All sizes and offsets count `char`s, not bytes.

use serde::Serialize;

use crate::config::ChunkingConfig;

/// Default maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default characters shared by adjacent chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_SEPARATOR: &str = "\n";

/// A chunk of the processed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    /// Index of this chunk within the processed text (0, 1, 2, …).
    pub index: usize,
    /// Character offset of the first char.
    pub start: usize,
    /// Character offset one past the last char.
    pub end: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
    separator: String,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl TextSplitter {
    /// An empty `separator` disables boundary preference; every cut is hard.
    pub fn new(
        chunk_size: usize,
        overlap: usize,
        separator: impl Into<String>,
    ) -> Result<Self, ChunkError> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ChunkError::InvalidConfig {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
            separator: separator.into(),
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ChunkError> {
        Self::new(config.chunk_size, config.chunk_overlap, config.separator.clone())
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily yields chunks of `text` in order.
    pub fn chunks<'a>(&'a self, text: &'a str) -> Chunks<'a> {
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bounds.push(text.len());
        Chunks {
            text,
            bounds,
            splitter: self,
            next_start: Some(0),
            index: 0,
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<Chunk> {
        self.chunks(text).collect()
    }
}

/// Iterator over the chunks of one text. Not restartable.
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every char, followed by `text.len()`.
    bounds: Vec<usize>,
    splitter: &'a TextSplitter,
    next_start: Option<usize>,
    index: usize,
}

impl Chunks<'_> {
    fn char_count(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Char offset just past the last separator in `[start + overlap, window_end)`.
    /// Starting the search at `start + overlap` keeps every chunk longer than the overlap.
    fn separator_end(&self, start: usize, window_end: usize) -> Option<usize> {
        let sep = self.splitter.separator.as_str();
        if sep.is_empty() {
            return None;
        }
        let from = self.bounds[start + self.splitter.overlap];
        let to = self.bounds[window_end];
        let pos = self.text[from..to].rfind(sep)?;
        let end_byte = from + pos + sep.len();
        self.bounds.binary_search(&end_byte).ok()
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start?;
        let total = self.char_count();
        if start >= total {
            self.next_start = None;
            return None;
        }

        let window_end = (start + self.splitter.chunk_size).min(total);
        let end = if window_end == total {
            total
        } else {
            self.separator_end(start, window_end).unwrap_or(window_end)
        };
        self.next_start = (end < total).then(|| end - self.splitter.overlap);

        let chunk = Chunk {
            text: self.text[self.bounds[start]..self.bounds[end]].to_string(),
            index: self.index,
            start,
            end,
        };
        self.index += 1;
        Some(chunk)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("invalid chunking config: overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidConfig { chunk_size: usize, overlap: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Text with no separator where every 4-char window is distinct.
    fn unique_text(n: usize) -> String {
        (0..)
            .flat_map(|i: u32| format!("{i:04x}").chars().collect::<Vec<_>>())
            .take(n)
            .collect()
    }

    fn tail(s: &str, n: usize) -> String {
        let count = s.chars().count();
        s.chars().skip(count - n).collect()
    }

    fn head(s: &str, n: usize) -> String {
        s.chars().take(n).collect()
    }

    #[test]
    fn short_text_is_one_chunk() {
        let splitter = TextSplitter::default();
        let c = splitter.split_text("One paragraph.\nTwo lines.");
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].text, "One paragraph.\nTwo lines.");
        assert_eq!((c[0].start, c[0].end), (0, 25));
    }

    #[test]
    fn text_of_exactly_chunk_size_is_one_chunk() {
        let text = unique_text(1000);
        let c = TextSplitter::default().split_text(&text);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].text, text);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(TextSplitter::default().split_text("").is_empty());
    }

    #[test]
    fn hard_cuts_without_separator() {
        let text = unique_text(2500);
        let c = TextSplitter::default().split_text(&text);
        let lens: Vec<usize> = c.iter().map(Chunk::len).collect();
        assert_eq!(lens, vec![1000, 1000, 900]);
        for pair in c.windows(2) {
            assert_eq!(tail(&pair[0].text, 200), head(&pair[1].text, 200));
        }
        assert_eq!(c.last().unwrap().end, 2500);
    }

    #[test]
    fn prefers_separator_near_boundary() {
        // 150-char lines: the last newline inside the first window ends at char 900.
        let line = format!("{}\n", "x".repeat(149));
        let text = line.repeat(20);
        let c = TextSplitter::default().split_text(&text);
        assert_eq!(c[0].len(), 900);
        assert!(c[0].text.ends_with('\n'));
        assert_eq!(c[1].start, 700);
        for pair in c.windows(2) {
            assert_eq!(pair[0].end - pair[1].start, 200);
            assert_eq!(tail(&pair[0].text, 200), head(&pair[1].text, 200));
        }
        assert_eq!(c.last().unwrap().end, text.chars().count());
    }

    #[test]
    fn separator_inside_overlap_is_ignored() {
        // The only newline sits in the first 200 chars, so the cut stays hard.
        let text = format!("{}\n{}", "a".repeat(100), "b".repeat(1400));
        let c = TextSplitter::default().split_text(&text);
        assert_eq!(c[0].len(), 1000);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text = "é".repeat(1500);
        let c = TextSplitter::default().split_text(&text);
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].text.chars().count(), 1000);
        assert_eq!(c[1].text.chars().count(), 700);
    }

    #[test]
    fn indices_are_sequential() {
        let c = TextSplitter::new(10, 2, "").unwrap().split_text(&unique_text(50));
        assert!(c.iter().enumerate().all(|(i, ch)| ch.index == i));
        assert!(c.iter().all(|ch| ch.len() <= 10));
    }

    #[test]
    fn chunks_iterator_is_lazy() {
        let text = unique_text(10_000);
        let splitter = TextSplitter::default();
        let first_two: Vec<Chunk> = splitter.chunks(&text).take(2).collect();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[1].start, 800);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(100, 100, "\n").is_err());
        assert!(TextSplitter::new(0, 0, "\n").is_err());
        assert!(TextSplitter::new(100, 99, "\n").is_ok());
    }

    #[test]
    fn from_config_keeps_sizes() {
        let config = ChunkingConfig {
            chunk_size: 500,
            chunk_overlap: 50,
            separator: "\n\n".into(),
        };
        let splitter = TextSplitter::from_config(&config).unwrap();
        assert_eq!(splitter.chunk_size(), 500);
        assert_eq!(splitter.overlap(), 50);
    }
}
