//! Web server for Serene.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::ServerConfig;
use crate::{Result, SereneError};

use super::handlers::AppState;
use super::router::create_router;

/// HTTP + WebSocket server.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Server configuration.
    server_config: ServerConfig,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, app_state: Arc<AppState>) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                SereneError::Config(format!(
                    "invalid server address {}:{}: {}",
                    config.host, config.port, e
                ))
            })?;

        Ok(Self {
            addr,
            app_state,
            server_config: config.clone(),
        })
    }

    /// Get the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.app_state), &self.server_config)
            .layer(CompressionLayer::new())
    }

    /// Run the web server until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{Assistant, GeminiClient};
    use crate::chat::ChatHub;
    use crate::config::{AssistantConfig, StressConfig};
    use crate::db::Database;
    use crate::stress::StressDetector;

    fn create_test_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Use random port
            cors_origins: vec![],
            static_path: String::new(),
        }
    }

    async fn create_test_state() -> Arc<AppState> {
        let db = Database::open_in_memory().await.unwrap();
        let hub = Arc::new(ChatHub::new(db.pool().clone()));
        let generator = GeminiClient::new(AssistantConfig::default(), None).unwrap();
        Arc::new(AppState::new(
            hub,
            StressDetector::new(StressConfig::default()),
            Assistant::new(Arc::new(generator)),
        ))
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let server = WebServer::new(&create_test_config(), create_test_state().await).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_addr() {
        let mut config = create_test_config();
        config.host = "not an address".to_string();
        let result = WebServer::new(&config, create_test_state().await);
        assert!(matches!(result, Err(SereneError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let server = WebServer::new(&create_test_config(), create_test_state().await).unwrap();
        let addr = server.run_with_addr().await.unwrap();
        assert_ne!(addr.port(), 0);

        let body = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }
}
