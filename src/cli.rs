//! Command-line argument parsing.

use clap::Parser;
use log::warn;

use crate::params::{AnalyzerConfig, RenderConfig, ServerConfig};
use crate::scene::SceneConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Lightning VJ")]
#[command(about = "Microphone-driven spectrum ring with bass-triggered lightning", long_about = None)]
pub struct Args {
    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,

    /// Also serve the landing page over HTTP
    #[arg(long)]
    pub serve: bool,

    /// Listen address for --serve
    #[arg(long, value_name = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Listen port for --serve
    #[arg(long, value_name = "PORT", default_value = "3000")]
    pub port: u16,

    /// Fixed lightning seed (reproducible bolt shapes)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Spectrum sampling rate (snapshots per second)
    #[arg(long, value_name = "HZ", default_value = "60")]
    pub refresh_hz: f32,
}

impl Args {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            ..Default::default()
        }
    }

    /// Analyzer config; an unusable refresh rate falls back to the default
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let config = AnalyzerConfig {
            refresh_hz: self.refresh_hz,
            ..Default::default()
        };
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Ignoring --refresh-hz {}: {}", self.refresh_hz, e);
                AnalyzerConfig::default()
            }
        }
    }

    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            seed: self.seed,
            ..Default::default()
        }
    }

    /// Server config when --serve is given
    pub fn server_config(&self) -> Option<ServerConfig> {
        self.serve.then(|| ServerConfig {
            host: self.host.clone(),
            port: self.port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["lightning-vj"]);
        let render = args.render_config();
        assert_eq!((render.window_width, render.window_height), (1280, 720));
        assert!(args.server_config().is_none());
        assert_eq!(args.scene_config().seed, None);
        assert_eq!(args.analyzer_config().refresh_hz, 60.0);
    }

    #[test]
    fn test_serve_flags() {
        let args = Args::parse_from(["lightning-vj", "--serve", "--port", "8080"]);
        let server = args.server_config().unwrap();
        assert_eq!(server.url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_bad_refresh_rate_falls_back() {
        let args = Args::parse_from(["lightning-vj", "--refresh-hz", "0"]);
        assert_eq!(args.analyzer_config().refresh_hz, 60.0);
    }

    #[test]
    fn test_tiny_refresh_rate_falls_back() {
        let args = Args::parse_from(["lightning-vj", "--refresh-hz", "1e-20"]);
        let config = args.analyzer_config();
        assert_eq!(config.refresh_hz, 60.0);
        assert!(config.tick_interval().as_millis() <= 17);
    }

    #[test]
    fn test_seed_passed_through() {
        let args = Args::parse_from(["lightning-vj", "--seed", "7"]);
        assert_eq!(args.scene_config().seed, Some(7));
    }
}
