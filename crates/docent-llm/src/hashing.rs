//! Deterministic offline embedder based on signed feature hashing of word tokens.
//!
//! Texts sharing vocabulary land close together under cosine similarity, which is
//! enough to rank chunks without any model download or network access.

use std::sync::Arc;

use crate::provider::{EmbedFn, EmbedFuture};

pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl HashEmbedder {
    /// A zero dimension is bumped to 1.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `text` into an L2-normalised vector. Text without word tokens maps to the
    /// zero vector.
    #[must_use]
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[..8]);
            let h = u64::from_le_bytes(word);

            #[expect(clippy::cast_possible_truncation)]
            let slot = (h % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    #[must_use]
    pub fn embed_fn(&self) -> EmbedFn {
        let embedder = *self;
        Arc::new(move |text: &str| -> EmbedFuture {
            let vector = embedder.embed_sync(text);
            Box::pin(async move { Ok(vector) })
        })
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '_' && c != '+' && c != '#')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
