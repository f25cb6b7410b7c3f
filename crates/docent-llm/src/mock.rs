//! Test-only mock provider that records every outbound call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
    chat_calls: Arc<AtomicUsize>,
    embed_calls: Arc<AtomicUsize>,
    pub default_response: String,
    pub embedding: Option<Vec<f32>>,
    pub fail_chat: bool,
    /// Milliseconds to sleep before answering `chat`.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            seen: Arc::new(Mutex::new(Vec::new())),
            chat_calls: Arc::new(AtomicUsize::new(0)),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            default_response: "mock response".into(),
            embedding: None,
            fail_chat: false,
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Number of `chat` invocations across all clones.
    #[must_use]
    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Messages passed to each `chat` call, in call order.
    #[must_use]
    pub fn seen_messages(&self) -> Vec<Vec<Message>> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.embedding
            .clone()
            .ok_or_else(|| LlmError::EmbedUnsupported {
                provider: "mock".into(),
            })
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_responses_then_default() {
        let p = MockProvider::with_responses(vec!["first".into()]);
        assert_eq!(p.chat(&[]).await.unwrap(), "first");
        assert_eq!(p.chat(&[]).await.unwrap(), "mock response");
        assert_eq!(p.chat_calls(), 2);
    }

    #[tokio::test]
    async fn clones_share_counters() {
        let p = MockProvider::default();
        let clone = p.clone();
        clone.chat(&[Message::user("x")]).await.unwrap();
        assert_eq!(p.chat_calls(), 1);
        assert_eq!(p.seen_messages()[0][0].content, "x");
    }

    #[tokio::test]
    async fn failing_counts_the_call() {
        let p = MockProvider::failing();
        assert!(p.chat(&[]).await.is_err());
        assert_eq!(p.chat_calls(), 1);
    }
}
