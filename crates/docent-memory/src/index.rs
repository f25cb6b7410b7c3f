use std::fmt;

use docent_llm::{EmbedFn, LlmError};

use crate::document::Chunk;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding function returned an empty vector")]
    ZeroDimension,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    pub chunk_id: u64,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    vector: EmbeddingVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Top-ranked chunks for one query, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    #[must_use]
    pub fn new(hits: Vec<ScoredChunk>) -> Self {
        Self { hits }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.hits.iter()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|h| h.chunk.text.as_str())
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ScoredChunk> {
        self.hits
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Outcome of [`EmbeddingIndex::build`]. An empty corpus is a normal state, not an error.
#[derive(Debug)]
pub enum IndexBuild {
    Ready(EmbeddingIndex),
    EmptyCorpus,
}

impl IndexBuild {
    #[must_use]
    pub fn into_index(self) -> Option<EmbeddingIndex> {
        match self {
            Self::Ready(index) => Some(index),
            Self::EmptyCorpus => None,
        }
    }
}

/// In-memory chunk store searched by cosine similarity. Read-only once built.
pub struct EmbeddingIndex {
    entries: Vec<IndexedChunk>,
    dimension: usize,
    embed_fn: EmbedFn,
}

impl fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("len", &self.entries.len())
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl EmbeddingIndex {
    /// Embed every chunk once, in order. `embed_fn` is kept to embed queries later.
    ///
    /// # Errors
    ///
    /// Returns an error if any embedding call fails, returns an empty vector, or
    /// disagrees in dimension with the first one.
    pub async fn build(chunks: Vec<Chunk>, embed_fn: EmbedFn) -> Result<IndexBuild, IndexError> {
        if chunks.is_empty() {
            tracing::warn!("no chunks to index, continuing without document context");
            return Ok(IndexBuild::EmptyCorpus);
        }

        let mut entries = Vec::with_capacity(chunks.len());
        let mut dimension = 0;
        for chunk in chunks {
            let values = embed_fn(&chunk.text).await?;
            if values.is_empty() {
                return Err(IndexError::ZeroDimension);
            }
            if dimension == 0 {
                dimension = values.len();
            } else if values.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: values.len(),
                });
            }
            entries.push(IndexedChunk {
                vector: EmbeddingVector {
                    chunk_id: chunk.id,
                    values,
                },
                chunk,
            });
        }

        tracing::info!(chunks = entries.len(), dimension, "embedding index built");
        Ok(IndexBuild::Ready(Self {
            entries,
            dimension,
            embed_fn,
        }))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn get(&self, chunk_id: u64) -> Option<&Chunk> {
        self.entries
            .iter()
            .find(|e| e.vector.chunk_id == chunk_id)
            .map(|e| &e.chunk)
    }

    /// Embed `query` and return the `k` most similar chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query fails or yields the wrong dimension.
    pub async fn search(&self, query: &str, k: usize) -> Result<RetrievalResult, IndexError> {
        if k == 0 {
            return Ok(RetrievalResult::empty());
        }
        let vector = (self.embed_fn)(query).await?;
        self.search_vector(&vector, k)
    }

    /// Rank by cosine similarity against an already embedded query. Ties keep
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` does not match the index dimension.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<RetrievalResult, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let score = cosine_similarity(query, &e.vector.values);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(RetrievalResult::new(
            scored
                .into_iter()
                .map(|(i, score)| ScoredChunk {
                    chunk: self.entries[i].chunk.clone(),
                    score,
                })
                .collect(),
        ))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
