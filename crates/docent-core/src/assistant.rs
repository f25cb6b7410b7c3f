use std::fmt;

use docent_llm::{EmbedFn, LlmProvider, Message};
use docent_memory::{IndexHandle, Retriever};

use crate::bootstrap::{self, Corpus};
use crate::composer::{AnswerComposer, GenerationFailure, build_context};
use crate::config::{Config, default_refusal};
use crate::scope::{AllowAll, ScopeFilter};

/// Outcome of one question. Every variant renders to a user-facing string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    /// Rejected by the scope filter; carries the refusal text.
    OutOfDomain(String),
    /// No document context was available.
    NoDocuments(String),
    Failed(GenerationFailure),
}

impl Reply {
    #[must_use]
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answer(text) | Self::OutOfDomain(text) | Self::NoDocuments(text) => {
                f.write_str(text)
            }
            Self::Failed(failure) => write!(f, "Error: {failure}"),
        }
    }
}

/// One question and everything produced while answering it.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub retrieved_context: String,
    pub reply: Reply,
}

/// Request pipeline: scope filter, then retrieval, then composition.
pub struct Assistant<P> {
    scope: Box<dyn ScopeFilter>,
    refusal: String,
    retriever: Retriever,
    composer: AnswerComposer<P>,
    index: IndexHandle,
    embed_fn: EmbedFn,
}

impl<P: LlmProvider> Assistant<P> {
    /// Starts with no index, [`AllowAll`] scope and the default retriever.
    #[must_use]
    pub fn new(composer: AnswerComposer<P>, embed_fn: EmbedFn) -> Self {
        Self {
            scope: Box::new(AllowAll),
            refusal: default_refusal(),
            retriever: Retriever::default(),
            composer,
            index: IndexHandle::default(),
            embed_fn,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Box<dyn ScopeFilter>, refusal: impl Into<String>) -> Self {
        self.scope = scope;
        self.refusal = refusal.into();
        self
    }

    #[must_use]
    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = retriever;
        self
    }

    /// Swap in a freshly built corpus. In-flight requests keep their old snapshot.
    pub fn publish(&self, corpus: Corpus) {
        self.index.publish(corpus.index, corpus.documents);
    }

    #[must_use]
    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    #[must_use]
    pub fn documents_loaded(&self) -> usize {
        self.index.documents()
    }

    #[must_use]
    pub fn composer(&self) -> &AnswerComposer<P> {
        &self.composer
    }

    /// Answer `question`. Never fails: every problem becomes a [`Reply`] variant.
    pub async fn ask(&self, question: &str) -> ChatTurn {
        self.ask_with_history(question, &[]).await
    }

    /// Answer `question` as the next turn of a client-held conversation. Only the
    /// question itself is scope-checked and used for retrieval.
    pub async fn ask_with_history(&self, question: &str, history: &[Message]) -> ChatTurn {
        if !self.scope.is_in_scope(question) {
            tracing::debug!("question rejected by scope filter");
            return ChatTurn {
                question: question.to_owned(),
                retrieved_context: String::new(),
                reply: Reply::OutOfDomain(self.refusal.clone()),
            };
        }

        let snapshot = self.index.snapshot();
        let retrieval = match self.retriever.retrieve(snapshot.as_deref(), question).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("retrieval failed: {e}");
                return ChatTurn {
                    question: question.to_owned(),
                    retrieved_context: String::new(),
                    reply: Reply::Failed(GenerationFailure::new(format!(
                        "could not search documents: {e}"
                    ))),
                };
            }
        };

        let retrieved_context = build_context(&retrieval);
        let reply = match self
            .composer
            .compose_with_history(question, history, &retrieval)
            .await
        {
            Ok(text) if retrieval.is_empty() => Reply::NoDocuments(text),
            Ok(text) => Reply::Answer(text),
            Err(failure) => Reply::Failed(failure),
        };
        tracing::debug!(
            hits = retrieval.len(),
            answered = reply.is_answer(),
            "question handled"
        );

        ChatTurn {
            question: question.to_owned(),
            retrieved_context,
            reply,
        }
    }

    /// Rebuild Loader → Chunker → Index from `config` and publish the result.
    /// Returns the number of indexed chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning or embedding fails; the current index stays live.
    pub async fn reindex(&self, config: &Config) -> anyhow::Result<usize> {
        let corpus = bootstrap::build_corpus(config, self.embed_fn.clone()).await?;
        let chunks = corpus.index.as_ref().map_or(0, |i| i.len());
        self.publish(corpus);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docent_llm::hashing::HashEmbedder;
    use docent_llm::mock::MockProvider;
    use docent_llm::provider::EmbedFuture;
    use docent_llm::LlmError;
    use docent_memory::{Chunk, EmbeddingIndex};

    use super::*;
    use crate::composer::NO_DOCUMENTS_REPLY;
    use crate::scope::KeywordScope;

    async fn corpus(texts: &[&str], embed: EmbedFn) -> Corpus {
        let chunks = texts
            .iter()
            .zip(0u64..)
            .map(|(t, id)| Chunk {
                id,
                source_path: "sql.txt".into(),
                text: (*t).into(),
                start_offset: 0,
            })
            .collect();
        Corpus {
            index: EmbeddingIndex::build(chunks, embed).await.unwrap().into_index(),
            documents: 1,
            notice: None,
        }
    }

    fn assistant(provider: &MockProvider) -> Assistant<MockProvider> {
        Assistant::new(
            AnswerComposer::new(provider.clone()),
            HashEmbedder::default().embed_fn(),
        )
    }

    #[test]
    fn reply_rendering() {
        assert_eq!(Reply::Answer("hi".into()).to_string(), "hi");
        assert_eq!(
            Reply::Failed(GenerationFailure::new("boom")).to_string(),
            "Error: boom"
        );
    }

    #[tokio::test]
    async fn no_index_degrades_to_fixed_message() {
        let provider = MockProvider::default();
        let turn = assistant(&provider).ask("what is a join?").await;

        assert_eq!(turn.reply, Reply::NoDocuments(NO_DOCUMENTS_REPLY.into()));
        assert!(turn.retrieved_context.is_empty());
        assert_eq!(provider.chat_calls(), 0);
    }

    #[tokio::test]
    async fn out_of_domain_never_reaches_provider() {
        let provider = MockProvider::default();
        let a = assistant(&provider).with_scope(Box::new(KeywordScope::new(["sql"])), "SQL only.");
        a.publish(corpus(&["SELECT picks columns"], HashEmbedder::default().embed_fn()).await);

        let turn = a.ask("best pizza in town").await;
        assert_eq!(turn.reply, Reply::OutOfDomain("SQL only.".into()));
        assert_eq!(provider.chat_calls(), 0);
    }

    #[tokio::test]
    async fn answers_from_retrieved_context() {
        let provider = MockProvider::with_responses(vec!["Use SELECT.".into()]);
        let a = assistant(&provider).with_retriever(Retriever::new(1));
        a.publish(
            corpus(
                &["SELECT picks columns", "bake the dough at high heat"],
                HashEmbedder::default().embed_fn(),
            )
            .await,
        );

        let turn = a.ask("how does select pick columns").await;
        assert_eq!(turn.reply, Reply::Answer("Use SELECT.".into()));
        assert_eq!(turn.retrieved_context, "SELECT picks columns");
        assert_eq!(a.documents_loaded(), 1);
        assert_eq!(provider.chat_calls(), 1);
    }

    #[tokio::test]
    async fn history_is_forwarded_to_generation() {
        let provider = MockProvider::with_responses(vec!["Yes, ON sets the key.".into()]);
        let a = assistant(&provider);
        a.publish(corpus(&["JOIN ... ON sets the key"], HashEmbedder::default().embed_fn()).await);

        let history = [
            Message::user("what is a join?"),
            Message {
                role: docent_llm::Role::Assistant,
                content: "It combines rows.".into(),
            },
        ];
        let turn = a.ask_with_history("does ON set the key?", &history).await;
        assert!(turn.reply.is_answer());

        let seen = provider.seen_messages();
        assert_eq!(seen[0].len(), 4);
        assert_eq!(seen[0][2].content, "It combines rows.");
    }

    #[tokio::test]
    async fn documents_loaded_follows_publish() {
        let a = assistant(&MockProvider::default());
        let mut c = corpus(&["one", "two"], HashEmbedder::default().embed_fn()).await;
        c.documents = 2;
        a.publish(c);

        let current = a.index().current();
        assert_eq!(current.documents, 2);
        assert_eq!(current.index.as_ref().unwrap().len(), 2);
        assert_eq!(a.documents_loaded(), 2);
    }

    #[tokio::test]
    async fn provider_failure_becomes_failed_reply() {
        let provider = MockProvider::failing();
        let a = assistant(&provider);
        a.publish(corpus(&["ctx"], HashEmbedder::default().embed_fn()).await);

        let turn = a.ask("ctx?").await;
        assert!(matches!(turn.reply, Reply::Failed(_)));
        assert!(turn.reply.to_string().starts_with("Error: "));
    }

    #[tokio::test]
    async fn query_embedding_failure_becomes_failed_reply() {
        let hasher = HashEmbedder::new(4);
        let embed: EmbedFn = Arc::new(move |text: &str| -> EmbedFuture {
            let result = if text == "doc" {
                Ok(hasher.embed_sync(text))
            } else {
                Err(LlmError::Other("embedding service down".into()))
            };
            Box::pin(async move { result })
        });
        let provider = MockProvider::default();
        let a = assistant(&provider);
        a.publish(corpus(&["doc"], embed).await);

        let turn = a.ask("question").await;
        match turn.reply {
            Reply::Failed(f) => assert!(f.message.contains("embedding service down")),
            other => panic!("unexpected reply: {other:?}"),
        }
        assert_eq!(provider.chat_calls(), 0);
    }
}
