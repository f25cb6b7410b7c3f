use std::fmt;

use crate::any::AnyProvider;
#[cfg(feature = "candle")]
use crate::candle_embed::EmbedModel;
use crate::hashing::HashEmbedder;
use crate::provider::{EmbedFn, LlmProvider, embed_fn};

/// Embedding backend chosen at startup. The same backend must serve index build and
/// query time, so callers obtain a single [`EmbedFn`] and keep it with the index.
#[derive(Clone)]
pub enum AnyEmbedder {
    Hash(HashEmbedder),
    Provider(AnyProvider),
    #[cfg(feature = "candle")]
    Bert(EmbedModel),
}

impl AnyEmbedder {
    #[must_use]
    pub fn embed_fn(&self) -> EmbedFn {
        match self {
            Self::Hash(h) => h.embed_fn(),
            Self::Provider(p) => embed_fn(p),
            #[cfg(feature = "candle")]
            Self::Bert(m) => m.embed_fn(),
        }
    }
}

impl fmt::Debug for AnyEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(h) => write!(f, "hash(dim={})", h.dimension()),
            Self::Provider(p) => write!(f, "provider({})", p.name()),
            #[cfg(feature = "candle")]
            Self::Bert(_) => f.write_str("bert"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_variant_embeds_locally() {
        let e = AnyEmbedder::Hash(HashEmbedder::new(8));
        let v = (e.embed_fn())("docs").await.unwrap();
        assert_eq!(v.len(), 8);
        assert_eq!(format!("{e:?}"), "hash(dim=8)");
    }
}
