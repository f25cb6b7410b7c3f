use crate::index::{EmbeddingIndex, IndexError, RetrievalResult};

pub const DEFAULT_TOP_K: usize = 3;

/// Pure transform applied to the question before it is embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryRewrite {
    #[default]
    None,
    Prefix(String),
}

impl QueryRewrite {
    #[must_use]
    pub fn apply(&self, query: &str) -> String {
        match self {
            Self::None => query.to_owned(),
            Self::Prefix(prefix) => format!("{prefix}{query}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Retriever {
    top_k: usize,
    rewrite: QueryRewrite,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl Retriever {
    #[must_use]
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            rewrite: QueryRewrite::None,
        }
    }

    #[must_use]
    pub fn with_rewrite(mut self, rewrite: QueryRewrite) -> Self {
        self.rewrite = rewrite;
        self
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// # Errors
    ///
    /// Returns an error if the query cannot be embedded.
    pub async fn retrieve(
        &self,
        index: Option<&EmbeddingIndex>,
        query: &str,
    ) -> Result<RetrievalResult, IndexError> {
        self.retrieve_k(index, query, self.top_k).await
    }

    /// Like [`Self::retrieve`] with an explicit `k`. A missing index yields an empty
    /// result.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be embedded.
    pub async fn retrieve_k(
        &self,
        index: Option<&EmbeddingIndex>,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult, IndexError> {
        let Some(index) = index else {
            tracing::debug!("no index loaded, skipping retrieval");
            return Ok(RetrievalResult::empty());
        };
        let query = self.rewrite.apply(query);
        let result = index.search(&query, k).await?;
        tracing::debug!(k, hits = result.len(), "retrieved chunks");
        Ok(result)
    }
}
