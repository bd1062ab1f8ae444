//! Optional HTTP listener serving the landing page.

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use log::{error, info};
use std::net::SocketAddr;
use std::thread;

use crate::error::ServerError;
use crate::params::ServerConfig;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Router with a single `/` route; anything else is 404
pub fn build_router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Landing page server on its own thread
pub struct StaticServer {
    config: ServerConfig,
}

impl StaticServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn address(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ServerError::Address(format!("{}: {}", self.config.url(), e)))
    }

    /// Serve until the process exits
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.address()?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ServerError::Bind)?;

        info!("⚡ Lightning VJ server running at {}", self.config.url());

        axum::serve(listener, build_router().into_make_service())
            .await
            .map_err(ServerError::Serve)
    }

    /// Run on a background thread with its own current-thread runtime
    ///
    /// Failures are logged; the visualizer keeps running without the page.
    pub fn spawn(self) -> Option<thread::JoinHandle<()>> {
        let spawned = thread::Builder::new()
            .name("page-server".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!("Failed to start server runtime: {}", e);
                        return;
                    }
                };

                if let Err(e) = runtime.block_on(self.run()) {
                    error!("Page server stopped: {}", e);
                }
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Failed to spawn server thread: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address() {
        let server = StaticServer::new(ServerConfig::default());
        assert_eq!(server.address().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_bad_host_rejected() {
        let server = StaticServer::new(ServerConfig {
            host: "not a host".to_string(),
            port: 3000,
        });
        assert!(matches!(server.address(), Err(ServerError::Address(_))));
    }

    #[test]
    fn test_page_has_title() {
        assert!(INDEX_HTML.contains("<title>⚡ Lightning VJ</title>"));
    }
}
