//! Chat-completion and embedding clients.

pub mod any;
#[cfg(feature = "candle")]
pub mod candle_embed;
pub mod compatible;
pub mod embedder;
pub mod error;
pub mod hashing;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;
pub(crate) mod retry;

pub use error::LlmError;
pub use provider::{EmbedFn, LlmProvider, Message, Role};
