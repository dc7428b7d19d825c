//! # Mandala
//!
//! An animated flower of images: textured, semi-transparent planes spawn in
//! radial bursts, drift out from the centre, fade in, then shrink and
//! collapse back inward until they are removed.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mandala::prelude::*;
//!
//! fn main() -> Result<(), MandalaError> {
//!     Viewer::new()
//!         .with_config(MandalaConfig::default())
//!         .with_textures(TexturePool::load_numbered("creations", 24, "png")?)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Lifecycle
//!
//! [`LifecycleManager`] is the heart of the crate. Every frame it:
//!
//! 1. fires a burst of `branches` planes at evenly spaced angles if more than
//!    `spawn_interval` seconds passed since the previous burst,
//! 2. recomputes every plane's age, opacity and scale and steps its radius,
//! 3. removes planes whose radius fell to the removal threshold.
//!
//! All tunables live in [`SpawnConfig`]; the radius curve is described there.
//!
//! ### Textures
//!
//! A [`TexturePool`] holds the decoded images. A [`TextureCycler`] hands them
//! out round-robin, one per new plane, wrapping at the end of the pool.
//!
//! ### Headless driving
//!
//! [`Engine`] runs frames against any [`FrameClock`] and [`RenderSurface`].
//! Tests and benchmarks pair a [`ManualClock`] with a [`RecordingSurface`]:
//!
//! ```ignore
//! let mut engine = Engine::builder()
//!     .with_textures(TexturePool::procedural(8))
//!     .with_clock(ManualClock::new([0.0, 0.5, 0.9]))
//!     .with_surface(RecordingSurface::new())
//!     .build()?;
//!
//! let camera = OrbitCamera::default();
//! for _ in 0..3 {
//!     engine.frame(&camera)?;
//! }
//! assert_eq!(engine.lifecycle().len(), 5);
//! ```
//!
//! ## Configuration
//!
//! The `mandala` binary reads a TOML file (first argument, or `mandala.toml`
//! in the working directory). See [`MandalaConfig`].
//!
//! ## Logging
//!
//! The crate logs through the `log` facade. The binary installs `env_logger`
//! at `info`; set `RUST_LOG=mandala=debug` to see every burst and retirement.

pub mod camera;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod lifecycle;
pub mod plane;
pub mod surface;
pub mod textures;
mod viewer;

pub use bytemuck;
pub use camera::OrbitCamera;
pub use clock::{FrameClock, ManualClock, SystemClock};
pub use config::{MandalaConfig, RenderConfig, SpawnConfig, TextureSourceConfig};
pub use engine::{Engine, EngineBuilder};
pub use error::{ConfigError, GpuError, MandalaError, RenderError, TextureError};
pub use glam::{Mat4, Vec3};
pub use gpu::PlaneRenderer;
pub use lifecycle::{FrameReport, LifecycleManager};
pub use plane::{Plane, PlaneFactory, PlaneUniforms, RetiredPlane};
pub use surface::{FrameSnapshot, PlaneView, RecordingSurface, RenderSurface};
pub use textures::{TextureCycler, TextureHandle, TextureId, TextureImage, TexturePool};
pub use viewer::Viewer;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use mandala::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::OrbitCamera;
    pub use crate::clock::{FrameClock, ManualClock, SystemClock};
    pub use crate::config::{MandalaConfig, RenderConfig, SpawnConfig, TextureSourceConfig};
    pub use crate::engine::Engine;
    pub use crate::error::MandalaError;
    pub use crate::lifecycle::LifecycleManager;
    pub use crate::surface::{RecordingSurface, RenderSurface};
    pub use crate::textures::{TextureCycler, TexturePool};
    pub use crate::viewer::Viewer;
    pub use crate::Vec3;
}
