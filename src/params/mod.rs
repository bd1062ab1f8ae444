//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers live here with:
//! - Units (world units, milliseconds, Hz, radians)
//! - Documented ranges and meanings
//! - The formula each one feeds into

mod audio;
mod camera;
mod lightning;
mod render;
mod scene;
mod server;

// Re-export all types
pub use audio::AnalyzerConfig;
pub use camera::OrbitCameraParams;
pub use lightning::LightningParams;
pub use render::RenderConfig;
pub use scene::{GlowParams, SpectrumRingParams};
pub use server::ServerConfig;
