//! HTTP surface: `POST /chat`, `POST /ask`, `GET /health` and a minimal browser chat page.

mod backend;
mod error;
mod handlers;
mod router;
mod server;

pub use backend::{ChatBackend, ReplyFuture};
pub use error::GatewayError;
pub use server::GatewayServer;
