//! Static page listener configuration.

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (localhost only by default)
    pub host: String,

    /// Listen port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
