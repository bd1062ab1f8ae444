//! Lightning VJ - a ring of spectrum bars that throws lightning on the bass
//!
//! Listens to the default microphone, lights 32 bars by frequency, and
//! strikes bolts through the middle whenever the low end kicks.

use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use lightning_vj::audio::{AudioAnalyzer, CpalBackend, FrameReader};
use lightning_vj::cli::Args;
use lightning_vj::params::{AnalyzerConfig, RenderConfig};
use lightning_vj::rendering::RenderSystem;
use lightning_vj::scene::{ReactiveScene, SceneConfig};
use lightning_vj::server::StaticServer;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Audio and scene
    analyzer: Option<AudioAnalyzer>,
    frames: Option<FrameReader>,
    scene: ReactiveScene,

    // Configuration
    render_config: RenderConfig,
    analyzer_config: AnalyzerConfig,
    scene_config: SceneConfig,

    // Pointer orbit
    dragging: bool,
    last_cursor: Option<(f64, f64)>,

    /// Set when window or GPU setup failed
    startup_error: Option<anyhow::Error>,
}

impl App {
    fn new(args: &Args) -> Self {
        let scene_config = args.scene_config();
        Self {
            window: None,
            render_system: None,
            analyzer: None,
            frames: None,
            scene: ReactiveScene::new(scene_config.clone()),
            render_config: args.render_config(),
            analyzer_config: args.analyzer_config(),
            scene_config,
            dragging: false,
            last_cursor: None,
            startup_error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("⚡ Lightning VJ")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let size = window.inner_size();
        self.render_config.window_width = size.width.max(1);
        self.render_config.window_height = size.height.max(1);

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.render_config.clone(),
            self.scene_config.ring.bar_count,
            self.scene_config.lightning.segments,
        ))?;

        // A denied microphone leaves the analyzer idle and the scene silent
        let mut analyzer = AudioAnalyzer::new(self.analyzer_config.clone());
        analyzer.start(&CpalBackend);
        self.frames = Some(analyzer.reader());

        info!("Lightning VJ is running, press ESC to quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.analyzer = Some(analyzer);
        Ok(())
    }

    /// Scene first, then audio, then the GPU
    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        self.scene.teardown();
        if let Some(mut analyzer) = self.analyzer.take() {
            analyzer.stop();
        }
        self.frames = None;
        self.render_system = None;
        self.window = None;
        event_loop.exit();
    }

    /// Advance the scene from the latest audio frame and draw it
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(frames) = &self.frames else {
            return;
        };
        let frame = frames.latest();
        self.scene.update(&frame, Instant::now());

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };
        render_system.prepare(&self.scene);

        match render_system.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, exiting");
                self.teardown(event_loop);
            }
            Err(e) => error!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.init(event_loop) {
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.teardown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.teardown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((x, y)) = self.last_cursor {
                    if self.dragging {
                        self.scene
                            .camera_mut()
                            .drag((position.x - x) as f32, (position.y - y) as f32);
                    }
                }
                self.last_cursor = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, lines) => {
                    self.scene.camera_mut().scroll_lines(lines)
                }
                MouseScrollDelta::PixelDelta(pixels) => {
                    self.scene.camera_mut().scroll_pixels(pixels.y as f32)
                }
            },
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("⚡ Lightning VJ - initializing");

    // Detached: the listener lives as long as the process
    let _server = args
        .server_config()
        .and_then(|config| StaticServer::new(config).spawn());

    let mut app = App::new(&args);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
