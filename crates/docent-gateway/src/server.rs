use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::backend::ChatBackend;
use crate::error::GatewayError;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    pub started_at: Instant,
}

pub struct GatewayServer {
    addr: SocketAddr,
    rate_limit: u32,
    max_body_size: usize,
    cors_origins: Vec<String>,
    backend: Arc<dyn ChatBackend>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        backend: Arc<dyn ChatBackend>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0 without authentication");
        }

        Self {
            addr,
            rate_limit: 60,
            max_body_size: 65_536,
            cors_origins: Vec::new(),
            backend,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_rate_limit(mut self, limit: u32) -> Self {
        self.rate_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Browser origins allowed to call the API from another host. Empty disables CORS.
    #[must_use]
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until the shutdown channel flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState {
            backend: self.backend,
            started_at: Instant::now(),
        };

        let router = build_router(
            state,
            self.rate_limit,
            self.max_body_size,
            &self.cors_origins,
        );

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on http://{}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            tracing::info!("gateway shutting down");
        })
        .await
        .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use docent_llm::Message;

    use super::*;
    use crate::backend::ReplyFuture;

    struct Silent;

    impl ChatBackend for Silent {
        fn reply_with_history<'a>(
            &'a self,
            _message: &'a str,
            _history: &'a [Message],
        ) -> ReplyFuture<'a> {
            Box::pin(async { String::new() })
        }

        fn documents_loaded(&self) -> usize {
            0
        }
    }

    #[test]
    fn server_builder_chain() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 5002, Arc::new(Silent), srx)
            .with_rate_limit(30)
            .with_max_body_size(512)
            .with_cors_origins(vec!["http://localhost:5173".into()]);

        assert_eq!(server.rate_limit, 30);
        assert_eq!(server.max_body_size, 512);
        assert_eq!(server.cors_origins, ["http://localhost:5173"]);
        assert_eq!(server.addr().port(), 5002);
    }

    #[test]
    fn server_invalid_bind_fallback() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, Arc::new(Silent), srx);
        assert_eq!(server.addr(), SocketAddr::from(([127, 0, 0, 1], 9999)));
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let (stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 0, Arc::new(Silent), srx);
        let handle = tokio::spawn(server.serve());
        stx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
