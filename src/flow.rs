//! The winit host.
//!
//! [`run`] owns everything outside the render engine: logging, the timer
//! calibration, the atlas and its font, the window and the keyboard. The engine only
//! ever sees decoded bytes and a ready [`Context`].

use std::sync::Arc;

use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::{APP_NAME, EngineConfig, LoadLevel, WINDOW_POSITION, WINDOW_SIZE},
    context::Context,
    error::HostError,
    render::Renderer,
    resources::{default_atlas, load_atlas, paint_glyph_strips},
    timer::Timer,
};

pub struct App {
    config: EngineConfig,
    atlas: Vec<u8>,
    timer: Option<Timer>,
    renderer: Option<Renderer<Context>>,
    load: LoadLevel,
    depth_test: bool,
    error: Option<HostError>,
    // Outlives the context, which holds a handle to it.
    async_runtime: Runtime,
}

impl App {
    fn new(config: EngineConfig, atlas: Vec<u8>, timer: Timer, async_runtime: Runtime) -> Self {
        Self {
            load: config.initial_load,
            depth_test: config.initial_depth_test,
            config,
            atlas,
            timer: Some(timer),
            renderer: None,
            error: None,
            async_runtime,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Renderer<Context>, HostError> {
        let (x, y) = WINDOW_POSITION;
        let (width, height) = WINDOW_SIZE;
        let window_attributes = Window::default_attributes()
            .with_title(APP_NAME)
            .with_position(PhysicalPosition::new(x, y))
            .with_inner_size(PhysicalSize::new(width, height));
        let window = event_loop
            .create_window(window_attributes)
            .map_err(|e| HostError::Window(e.into()))?;
        let ctx = Context::new(Arc::new(window), self.async_runtime.handle().clone(), self.config.vsync)
            .map_err(HostError::Window)?;

        let timer = self.timer.take().ok_or(HostError::Timer)?;
        let mut renderer = Renderer::new(ctx, timer);
        if let Err(err) = renderer.init(&self.config.pixel_format, &self.atlas) {
            if let Some(log) = err.diagnostics() {
                log::error!("Driver diagnostics:\n{log}");
            }
            return Err(HostError::Init(err));
        }
        // The texture holds its own copy now.
        self.atlas = Vec::new();
        Ok(renderer)
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match code {
            KeyCode::ArrowUp | KeyCode::ArrowDown => {
                let next = if code == KeyCode::ArrowUp {
                    self.load.next()
                } else {
                    self.load.prev()
                };
                if let Some(load) = next {
                    log::info!("Load set to {} instances", load.instances());
                    self.load = load;
                    renderer.reset_statistics();
                }
            }
            KeyCode::ArrowLeft | KeyCode::ArrowRight => {
                self.depth_test = code == KeyCode::ArrowRight;
                log::info!("Depth test {}", if self.depth_test { "on" } else { "off" });
                renderer.reset_statistics();
            }
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() || self.error.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(renderer) => {
                renderer.gpu().window().request_redraw();
                self.renderer = Some(renderer);
            }
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.handle_key(code, event_loop),
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.draw(self.load, self.depth_test);
                    renderer.gpu().window().request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Runs the stress test until the window is closed.
///
/// Each failure kind maps to its own process exit code, see
/// [`HostError::exit_code`].
pub fn run(config: EngineConfig) -> Result<(), HostError> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    log::warn!(
        "{APP_NAME} keeps the graphics card under full load. Watch its temperature and close the window if it runs hot."
    );

    let timer = Timer::new().filter(|timer| timer.status()).ok_or(HostError::Timer)?;

    let async_runtime = Runtime::new().map_err(|e| HostError::Runtime(e.into()))?;
    let mut atlas = match &config.atlas_path {
        Some(path) => async_runtime
            .block_on(load_atlas(path))
            .map_err(HostError::Texture)?,
        None => {
            log::info!("{} not set, using the built-in atlas", EngineConfig::ATLAS_ENV);
            default_atlas()
        }
    };
    paint_glyph_strips(&mut atlas).map_err(HostError::Texture)?;

    let event_loop = EventLoop::new().map_err(|e| HostError::EventLoop(e.into()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, atlas, timer, async_runtime);
    event_loop.run_app(&mut app).map_err(|e| HostError::Run(e.into()))?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
