//! Frame driver tying the clock, the lifecycle manager and a render surface
//! together.
//!
//! One call to [`Engine::frame`] reads the clock once, runs the lifecycle
//! update, releases the GPU resources of retired planes and presents the
//! resulting snapshot. The engine owns no window and no GPU state, so the
//! whole loop runs headless against a [`RecordingSurface`](crate::surface::RecordingSurface).
//!
//! # Example
//!
//! ```ignore
//! let mut engine = Engine::builder()
//!     .with_config(SpawnConfig::default())
//!     .with_textures(TexturePool::procedural(8))
//!     .with_clock(ManualClock::fixed_rate(1.0 / 60.0, 600))
//!     .with_surface(RecordingSurface::new())
//!     .build()?;
//!
//! let camera = OrbitCamera::default();
//! for _ in 0..600 {
//!     engine.frame(&camera)?;
//! }
//! ```

use crate::camera::OrbitCamera;
use crate::clock::FrameClock;
use crate::config::{MandalaConfig, RenderConfig, SpawnConfig};
use crate::error::{MandalaError, RenderError};
use crate::lifecycle::{FrameReport, LifecycleManager};
use crate::surface::{FrameSnapshot, RenderSurface};
use crate::textures::{TextureCycler, TexturePool};

/// Runs the mandala one frame at a time.
pub struct Engine<C = Box<dyn FrameClock>, S = Box<dyn RenderSurface>> {
    clock: C,
    surface: S,
    lifecycle: LifecycleManager,
    render: RenderConfig,
    frames: u64,
}

impl Engine {
    /// Start building an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }
}

impl<C: FrameClock, S: RenderSurface> Engine<C, S> {
    /// Advance to the clock's current time and draw.
    pub fn frame(&mut self, camera: &OrbitCamera) -> Result<FrameReport, RenderError> {
        let now = self.clock.elapsed();
        self.step(now, camera)
    }

    /// Advance to `now` and draw, bypassing the clock.
    ///
    /// Frames whose tick does not advance time still present, so the camera
    /// keeps moving while the flower is paused.
    pub fn step(&mut self, now: f32, camera: &OrbitCamera) -> Result<FrameReport, RenderError> {
        let report = self.lifecycle.update(now);
        if !report.retired.is_empty() {
            self.surface.release(&report.retired);
        }

        let snapshot = FrameSnapshot::capture(now, self.lifecycle.live(), &self.render);
        self.surface.present(&snapshot, camera)?;
        self.frames += 1;
        Ok(report)
    }

    /// The lifecycle manager.
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Rendering parameters.
    pub fn render_config(&self) -> &RenderConfig {
        &self.render
    }

    /// Frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// The frame clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The frame clock, e.g. to pause a [`SystemClock`](crate::clock::SystemClock).
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// The surface frames are presented to.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The surface, mutably. The viewer resizes its renderer through this.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Tear the engine down, returning the surface.
    pub fn into_surface(self) -> S {
        self.surface
    }
}

/// Assembles an [`Engine`].
///
/// Clock, textures and surface are required; `build` reports whichever is
/// missing as [`MandalaError::MissingCollaborator`].
pub struct EngineBuilder<C = Box<dyn FrameClock>, S = Box<dyn RenderSurface>> {
    spawn: SpawnConfig,
    render: RenderConfig,
    textures: Option<TexturePool>,
    clock: Option<C>,
    surface: Option<S>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            spawn: SpawnConfig::default(),
            render: RenderConfig::default(),
            textures: None,
            clock: None,
            surface: None,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, S> EngineBuilder<C, S> {
    /// Set spawn and animation parameters.
    pub fn with_config(mut self, spawn: SpawnConfig) -> Self {
        self.spawn = spawn;
        self
    }

    /// Set rendering parameters.
    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Take spawn and render parameters from a loaded config file.
    pub fn with_mandala_config(mut self, config: &MandalaConfig) -> Self {
        self.spawn = config.spawn.clone();
        self.render = config.render.clone();
        self
    }

    /// Set the images planes cycle through.
    pub fn with_textures(mut self, pool: TexturePool) -> Self {
        self.textures = Some(pool);
        self
    }

    /// Set the frame clock.
    pub fn with_clock<C2: FrameClock>(self, clock: C2) -> EngineBuilder<C2, S> {
        EngineBuilder {
            spawn: self.spawn,
            render: self.render,
            textures: self.textures,
            clock: Some(clock),
            surface: self.surface,
        }
    }

    /// Set the render surface.
    pub fn with_surface<S2: RenderSurface>(self, surface: S2) -> EngineBuilder<C, S2> {
        EngineBuilder {
            spawn: self.spawn,
            render: self.render,
            textures: self.textures,
            clock: self.clock,
            surface: Some(surface),
        }
    }
}

impl<C: FrameClock, S: RenderSurface> EngineBuilder<C, S> {
    /// Validate the configuration and build the engine.
    pub fn build(self) -> Result<Engine<C, S>, MandalaError> {
        let clock = self.clock.ok_or(MandalaError::MissingCollaborator("frame clock"))?;
        let textures = self.textures.ok_or(MandalaError::MissingCollaborator("texture pool"))?;
        let surface = self.surface.ok_or(MandalaError::MissingCollaborator("render surface"))?;

        let cycler = TextureCycler::new(textures)?;
        let lifecycle = LifecycleManager::new(self.spawn, cycler)?;
        log::info!(
            "Engine ready: {} textures, {} branches every {:.2}s",
            lifecycle.cycler().pool().len(),
            lifecycle.config().branches,
            lifecycle.config().spawn_interval
        );

        Ok(Engine {
            clock,
            surface,
            lifecycle,
            render: self.render,
            frames: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::surface::RecordingSurface;

    fn engine(ticks: Vec<f32>) -> Engine<ManualClock, RecordingSurface> {
        Engine::builder()
            .with_textures(TexturePool::procedural(4))
            .with_clock(ManualClock::new(ticks))
            .with_surface(RecordingSurface::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_frame_presents_snapshot() {
        let mut engine = engine(vec![0.0, 0.5, 0.9]);
        let camera = OrbitCamera::default();
        for _ in 0..3 {
            engine.frame(&camera).unwrap();
        }
        assert_eq!(engine.frame_count(), 3);
        let frames = &engine.surface().frames;
        assert_eq!(frames.len(), 3);
        assert!(frames[0].snapshot.is_empty());
        assert_eq!(frames[2].snapshot.len(), 5);
        assert_eq!(frames[2].snapshot.now, 0.9);
    }

    #[test]
    fn test_stalled_frame_still_presents() {
        let mut engine = engine(vec![0.0, 0.9]);
        let camera = OrbitCamera::default();
        engine.frame(&camera).unwrap();
        engine.frame(&camera).unwrap();
        // Clock exhausted, repeats 0.9
        let report = engine.frame(&camera).unwrap();
        assert!(!report.advanced);
        assert_eq!(engine.surface().frames.len(), 3);
        assert_eq!(engine.surface().frames[2].snapshot.len(), 5);
    }

    #[test]
    fn test_paused_clock_holds_state() {
        let mut clock = SystemClock::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        clock.pause();

        let mut engine = Engine::builder()
            .with_config(SpawnConfig::new().with_initial_burst(true))
            .with_textures(TexturePool::procedural(2))
            .with_clock(clock)
            .with_surface(RecordingSurface::new())
            .build()
            .unwrap();
        let camera = OrbitCamera::default();

        assert!(engine.frame(&camera).unwrap().advanced);
        let radii: Vec<f32> = engine.lifecycle().live().iter().map(|p| p.radius()).collect();
        assert_eq!(radii.len(), 5);

        for _ in 0..3 {
            let report = engine.frame(&camera).unwrap();
            assert!(!report.advanced);
            assert_eq!(report.spawned, 0);
            assert!(report.retired.is_empty());
        }
        let held: Vec<f32> = engine.lifecycle().live().iter().map(|p| p.radius()).collect();
        assert_eq!(held, radii);
        assert_eq!(engine.lifecycle().total_spawned(), 5);
        // Paused frames are still drawn
        assert_eq!(engine.surface().frames.len(), 4);
    }

    #[test]
    fn test_render_config_reaches_surface() {
        let render = RenderConfig {
            plane_height: -2.0,
            plane_size: 6.0,
            ..RenderConfig::default()
        };
        let mut engine = Engine::builder()
            .with_render_config(render)
            .with_textures(TexturePool::procedural(3))
            .with_clock(ManualClock::new([0.0, 0.9]))
            .with_surface(RecordingSurface::new())
            .build()
            .unwrap();
        assert_eq!(engine.render_config().plane_height, -2.0);

        let camera = OrbitCamera::default();
        engine.frame(&camera).unwrap();
        engine.frame(&camera).unwrap();

        let surface = engine.into_surface();
        let frame = surface.last_frame().unwrap();
        assert_eq!(frame.len(), 5);
        for view in &frame.planes {
            assert_eq!(view.position.y, -2.0);
            assert_eq!(view.uniforms.plane_size, 6.0);
        }
    }

    #[test]
    fn test_missing_collaborators() {
        let err = Engine::builder()
            .with_clock(ManualClock::default())
            .with_surface(RecordingSurface::new())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, MandalaError::MissingCollaborator("texture pool")));

        let err = Engine::builder()
            .with_textures(TexturePool::procedural(1))
            .with_surface(RecordingSurface::new())
            .with_clock(ManualClock::default())
            .with_config(SpawnConfig::new().with_spawn_interval(0.0))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, MandalaError::InvalidConfig(_)));
    }

    #[test]
    fn test_boxed_collaborators() {
        let boxed: EngineBuilder = Engine::builder().with_textures(TexturePool::procedural(2));
        let err = boxed.build().err().unwrap();
        assert!(matches!(err, MandalaError::MissingCollaborator("frame clock")));

        let mut engine = Engine::builder()
            .with_textures(TexturePool::procedural(2))
            .with_clock(Box::new(ManualClock::new([0.0])) as Box<dyn FrameClock>)
            .with_surface(Box::new(RecordingSurface::new()) as Box<dyn RenderSurface>)
            .build()
            .unwrap();
        assert!(engine.frame(&OrbitCamera::default()).is_ok());
    }
}
