//! Lightning VJ library - microphone-driven spectrum ring with bass-triggered lightning

pub mod audio;
pub mod camera;
pub mod cli;
pub mod error;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod server;
