use crate::document::{Chunk, SourceDocument};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SplitterError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { overlap: usize, chunk_size: usize },
}

/// Window geometry, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    chunk_size: usize,
    overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

impl ChunkerConfig {
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero or `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, SplitterError> {
        if chunk_size == 0 {
            return Err(SplitterError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(SplitterError::OverlapTooLarge {
                overlap,
                chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Splits documents into overlapping fixed-size character windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Chunk one document, numbering chunks from `first_id`.
    ///
    /// Window `i` starts at `i * (chunk_size - overlap)`. Splitting stops after the
    /// first window that reaches the end of the text, so the last window may be short.
    #[must_use]
    pub fn split(&self, document: &SourceDocument, first_id: u64) -> Vec<Chunk> {
        windows(&document.raw_text, self.config)
            .into_iter()
            .zip(first_id..)
            .map(|((start_offset, text), id)| Chunk {
                id,
                source_path: document.path.clone(),
                text,
                start_offset,
            })
            .collect()
    }

    /// Chunk a whole corpus; ids run `0..n` in document order.
    #[must_use]
    pub fn split_all(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            let next_id = chunks.len() as u64;
            let produced = self.split(doc, next_id);
            tracing::debug!(path = %doc.path, chunks = produced.len(), "split document");
            chunks.extend(produced);
        }
        chunks
    }
}

/// `(char offset, window text)` pairs. Offsets are mapped to byte indices through
/// `char_indices` so multi-byte text is never cut inside a code point.
fn windows(text: &str, config: ChunkerConfig) -> Vec<(usize, String)> {
    let mut bounds: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    let len = bounds.len();
    if len == 0 {
        return Vec::new();
    }
    bounds.push(text.len());

    let mut out = Vec::with_capacity(len.div_ceil(config.step()));
    let mut start = 0;
    loop {
        let end = (start + config.chunk_size).min(len);
        out.push((start, text[bounds[start]..bounds[end]].to_owned()));
        if end == len {
            break;
        }
        start += config.step();
    }
    out
}
