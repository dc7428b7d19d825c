//! Window that shows the mandala.
//!
//! ```ignore
//! use mandala::prelude::*;
//!
//! Viewer::new()
//!     .with_config(MandalaConfig::load("mandala.toml")?)
//!     .with_textures(TexturePool::load_numbered("creations", 24, "png")?)
//!     .run()?;
//! ```
//!
//! Controls: drag with the left mouse button to orbit, scroll to zoom,
//! space to pause, escape to quit.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::camera::OrbitCamera;
use crate::clock::SystemClock;
use crate::config::MandalaConfig;
use crate::engine::Engine;
use crate::error::{MandalaError, RenderError};
use crate::gpu::PlaneRenderer;
use crate::textures::TexturePool;

/// Builder and entry point for the windowed mandala.
pub struct Viewer {
    config: MandalaConfig,
    textures: Option<TexturePool>,
    title: String,
}

impl Viewer {
    /// A viewer with the default configuration and no textures yet.
    pub fn new() -> Self {
        Self {
            config: MandalaConfig::default(),
            textures: None,
            title: "Mandala".to_string(),
        }
    }

    /// Use the given configuration.
    pub fn with_config(mut self, config: MandalaConfig) -> Self {
        self.config = config;
        self
    }

    /// Images for the planes to cycle through.
    pub fn with_textures(mut self, pool: TexturePool) -> Self {
        self.textures = Some(pool);
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Open the window and run until it is closed.
    ///
    /// Configuration problems surface before the window opens; a missing
    /// texture pool is reported as [`MandalaError::MissingCollaborator`].
    pub fn run(self) -> Result<(), MandalaError> {
        self.config.spawn.validate()?;
        let textures = self
            .textures
            .ok_or(MandalaError::MissingCollaborator("texture pool"))?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.config, textures, self.title);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    config: MandalaConfig,
    title: String,
    textures: Option<TexturePool>,
    window: Option<Arc<Window>>,
    engine: Option<Engine<SystemClock, PlaneRenderer>>,
    camera: OrbitCamera,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// First fatal error, returned from [`Viewer::run`].
    error: Option<MandalaError>,
}

impl App {
    fn new(config: MandalaConfig, textures: TexturePool, title: String) -> Self {
        let camera = OrbitCamera::new(&config.render);
        Self {
            config,
            title,
            textures: Some(textures),
            window: None,
            engine: None,
            camera,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), MandalaError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.camera.set_aspect(size.width, size.height);

        let renderer = pollster::block_on(PlaneRenderer::new(window.clone(), &self.config.render))?;
        let textures = self
            .textures
            .take()
            .ok_or(MandalaError::MissingCollaborator("texture pool"))?;

        let engine = Engine::builder()
            .with_mandala_config(&self.config)
            .with_textures(textures)
            .with_clock(SystemClock::new())
            .with_surface(renderer)
            .build()?;

        self.engine = Some(engine);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: MandalaError) {
        log::error!("{error}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(engine) = &mut self.engine {
                    engine.surface_mut().resize(physical_size);
                }
                self.camera.set_aspect(physical_size.width, physical_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key {
                    Key::Named(NamedKey::Space) => {
                        if let Some(engine) = &mut self.engine {
                            engine.clock_mut().toggle_pause();
                            log::info!("Paused: {}", engine.clock().is_paused());
                        }
                    }
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    _ => {}
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;
                        self.camera.drag(dx as f32, dy as f32);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => {
                self.camera.update();
                let result = match &mut self.engine {
                    Some(engine) => engine.frame(&self.camera).map(|_| ()),
                    None => Ok(()),
                };
                match result {
                    Ok(()) => {}
                    Err(e @ RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        self.fail(event_loop, e.into());
                        return;
                    }
                    Err(e) => log::warn!("Render error: {e}"),
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
