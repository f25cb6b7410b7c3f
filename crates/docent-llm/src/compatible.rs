use std::fmt;

use crate::error::LlmError;
use crate::openai::OpenAiProvider;
use crate::provider::{LlmProvider, Message};

/// An OpenAI-compatible endpoint reported under its own name (`groq`, `openrouter`, ...).
#[derive(Clone)]
pub struct CompatibleProvider {
    inner: OpenAiProvider,
    provider_name: String,
}

impl CompatibleProvider {
    #[must_use]
    pub fn new(provider_name: String, inner: OpenAiProvider) -> Self {
        Self {
            inner,
            provider_name,
        }
    }
}

impl fmt::Debug for CompatibleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompatibleProvider")
            .field("provider_name", &self.provider_name)
            .field("inner", &self.inner)
            .finish()
    }
}

impl LlmProvider for CompatibleProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.inner.chat(messages).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.inner.embed(text).await
    }

    fn supports_embeddings(&self) -> bool {
        self.inner.supports_embeddings()
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider(embedding_model: Option<String>) -> CompatibleProvider {
        let inner = OpenAiProvider::new(
            "key".into(),
            "https://api.groq.com/openai/v1".into(),
            "llama-3.1-8b-instant".into(),
            embedding_model,
        )
        .unwrap();
        CompatibleProvider::new("groq".into(), inner)
    }

    #[test]
    fn name_returns_custom_provider_name() {
        assert_eq!(test_provider(None).name(), "groq");
    }

    #[test]
    fn supports_embeddings_delegates() {
        assert!(!test_provider(None).supports_embeddings());
        assert!(test_provider(Some("embed".into())).supports_embeddings());
    }

    #[test]
    fn debug_contains_name_and_hides_key() {
        let debug = format!("{:?}", test_provider(None));
        assert!(debug.contains("groq"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn chat_unreachable_errors() {
        let inner =
            OpenAiProvider::new("k".into(), "http://127.0.0.1:1".into(), "m".into(), None)
                .unwrap();
        let p = CompatibleProvider::new("local".into(), inner);
        assert!(p.chat(&[Message::user("hello")]).await.is_err());
    }
}
