use std::sync::Arc;

use tokio::sync::watch;

use crate::index::EmbeddingIndex;

/// One published corpus: the index and the number of documents it was built from.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    pub index: Option<Arc<EmbeddingIndex>>,
    pub documents: usize,
}

/// Shared slot holding the current [`IndexSnapshot`].
///
/// Readers clone the inner `Arc` and keep using it for the whole request; a rebuilt
/// corpus is swapped in whole with [`IndexHandle::publish`], so the index and its
/// document count always change together. Nothing mutates a published index.
#[derive(Clone, Debug)]
pub struct IndexHandle {
    tx: Arc<watch::Sender<Arc<IndexSnapshot>>>,
}

impl Default for IndexHandle {
    fn default() -> Self {
        Self::new(None, 0)
    }
}

impl IndexHandle {
    #[must_use]
    pub fn new(index: Option<EmbeddingIndex>, documents: usize) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(IndexSnapshot {
            index: index.map(Arc::new),
            documents,
        }));
        Self { tx: Arc::new(tx) }
    }

    /// The current corpus as one consistent value.
    #[must_use]
    pub fn current(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.tx.borrow())
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<EmbeddingIndex>> {
        self.tx.borrow().index.clone()
    }

    /// Replace the current corpus, returning the previous one.
    pub fn publish(&self, index: Option<EmbeddingIndex>, documents: usize) -> Arc<IndexSnapshot> {
        let chunks = index.as_ref().map_or(0, EmbeddingIndex::len);
        let previous = self.tx.send_replace(Arc::new(IndexSnapshot {
            index: index.map(Arc::new),
            documents,
        }));
        tracing::info!(chunks, documents, "published index snapshot");
        previous
    }

    /// Documents behind the current snapshot.
    #[must_use]
    pub fn documents(&self) -> usize {
        self.tx.borrow().documents
    }

    /// Number of chunks in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.borrow().index.as_ref().map_or(0, |i| i.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
