use std::future::Future;
use std::pin::Pin;

use docent_core::Assistant;
use docent_llm::{LlmProvider, Message};

pub type ReplyFuture<'a> = Pin<Box<dyn Future<Output = String> + Send + 'a>>;

/// What the HTTP layer needs from the request pipeline.
pub trait ChatBackend: Send + Sync {
    /// Produce the reply to `message`, following the client-held `history`. Must not fail.
    fn reply_with_history<'a>(&'a self, message: &'a str, history: &'a [Message])
    -> ReplyFuture<'a>;

    /// Single-turn reply.
    fn reply<'a>(&'a self, message: &'a str) -> ReplyFuture<'a> {
        self.reply_with_history(message, &[])
    }

    fn documents_loaded(&self) -> usize;
}

impl<P: LlmProvider + 'static> ChatBackend for Assistant<P> {
    fn reply_with_history<'a>(
        &'a self,
        message: &'a str,
        history: &'a [Message],
    ) -> ReplyFuture<'a> {
        Box::pin(async move {
            self.ask_with_history(message, history)
                .await
                .reply
                .to_string()
        })
    }

    fn documents_loaded(&self) -> usize {
        Assistant::documents_loaded(self)
    }
}
