//! Error types for audio capture, rendering and the page listener.

use thiserror::Error;

/// Audio acquisition and analysis errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// No default input device (missing or access denied)
    #[error("No audio input device available")]
    NoInputDevice,

    /// Device refused to report a usable input configuration
    #[error("Failed to query input config: {0}")]
    InputConfig(String),

    /// Input stream uses a sample format we cannot downmix
    #[error("Unsupported input sample format: {0}")]
    UnsupportedFormat(String),

    /// Stream creation failed
    #[error("Failed to build input stream: {0}")]
    BuildStream(String),

    /// Stream refused to start
    #[error("Failed to start input stream: {0}")]
    PlayStream(String),

    /// Analyser configuration rejected
    #[error("Invalid analyzer config: {0}")]
    InvalidConfig(String),
}

/// Renderer setup errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    Surface(String),

    #[error("Failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    Device(String),
}

/// Static page listener errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
