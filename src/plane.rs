//! The animated plane and the parameters it hands to the shader.
//!
//! A [`Plane`] is the unit of both simulation and rendering. The lifecycle
//! manager mutates its `age`, `radius`, `scale` and `opacity` every frame;
//! everything else is fixed at creation by [`PlaneFactory::create`].
//!
//! # Shader contract
//!
//! The GPU side never sees a `Plane`, only its [`PlaneUniforms`]:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `radius` | distance from the centre along `start_angle` |
//! | `time` | plane age in seconds |
//! | `start_angle` | spawn angle (radians) |
//! | `scale` | quad scale multiplier |
//! | `opacity` | alpha multiplier |
//! | `plane_height` | height of the flower |
//! | `plane_size` | unscaled quad edge length |
//! | `alpha_cutoff` | texels below this alpha are discarded |

use crate::config::{RenderConfig, SpawnConfig};
use crate::error::MandalaError;
use crate::textures::{TextureHandle, TextureId};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One textured, semi-transparent plane of the flower.
#[derive(Debug, Clone)]
pub struct Plane {
    angle: f32,
    creation_time: f32,
    texture: TextureHandle,
    render_priority: i32,
    pub(crate) age: f32,
    pub(crate) radius: f32,
    pub(crate) scale: f32,
    pub(crate) opacity: f32,
}

impl Plane {
    /// Spawn angle in radians.
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Seconds since creation as of the last update.
    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Current radius.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Current scale multiplier.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Current opacity.
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Timestamp the age is measured from.
    #[inline]
    pub fn creation_time(&self) -> f32 {
        self.creation_time
    }

    /// Texture drawn on this plane.
    #[inline]
    pub fn texture(&self) -> &TextureHandle {
        &self.texture
    }

    /// Draw-order key; lower values draw first.
    #[inline]
    pub fn render_priority(&self) -> i32 {
        self.render_priority
    }

    /// World-space centre of the plane.
    pub fn position(&self, plane_height: f32) -> Vec3 {
        let (sin, cos) = self.angle.sin_cos();
        Vec3::new(self.radius * cos, plane_height, self.radius * sin)
    }

    /// Parameters the plane shader reads for this plane.
    pub fn uniforms(&self, render: &RenderConfig) -> PlaneUniforms {
        PlaneUniforms {
            radius: self.radius,
            time: self.age,
            start_angle: self.angle,
            scale: self.scale,
            opacity: self.opacity,
            plane_height: render.plane_height,
            plane_size: render.plane_size,
            alpha_cutoff: render.alpha_cutoff,
        }
    }
}

/// Per-plane uniform block. Layout must match `Plane` in `plane.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PlaneUniforms {
    pub radius: f32,
    pub time: f32,
    pub start_angle: f32,
    pub scale: f32,
    pub opacity: f32,
    pub plane_height: f32,
    pub plane_size: f32,
    pub alpha_cutoff: f32,
}

/// Builds planes with their animation seeded from a [`SpawnConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneFactory;

impl PlaneFactory {
    /// Create a plane at rest: age 0, starting radius, base scale and opacity.
    ///
    /// Fails with [`MandalaError::InvalidConfig`] if `start_radius` is not
    /// positive, since scale is derived from `radius / start_radius`.
    pub fn create(
        angle: f32,
        texture: TextureHandle,
        priority: i32,
        creation_time: f32,
        config: &SpawnConfig,
    ) -> Result<Plane, MandalaError> {
        if config.start_radius.is_nan() || config.start_radius <= 0.0 {
            return Err(MandalaError::InvalidConfig(format!(
                "start_radius must be positive, got {}",
                config.start_radius
            )));
        }
        Ok(Self::spawn(angle, texture, priority, creation_time, config))
    }

    /// Create a plane from a config that already passed
    /// [`SpawnConfig::validate`].
    pub(crate) fn spawn(
        angle: f32,
        texture: TextureHandle,
        priority: i32,
        creation_time: f32,
        config: &SpawnConfig,
    ) -> Plane {
        Plane {
            angle,
            creation_time,
            texture,
            render_priority: priority,
            age: 0.0,
            radius: config.start_radius,
            scale: config.base_scale,
            opacity: config.base_opacity,
        }
    }
}

/// What the renderer needs to know about a plane that was just removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetiredPlane {
    /// Priority of the removed plane; unique, so it keys GPU resources.
    pub render_priority: i32,
    /// Texture the plane was drawn with.
    pub texture: TextureId,
    /// Age at removal.
    pub age: f32,
    /// Radius at removal (at or below the removal threshold).
    pub radius: f32,
}

impl From<&Plane> for RetiredPlane {
    fn from(plane: &Plane) -> Self {
        Self {
            render_priority: plane.render_priority,
            texture: plane.texture.id(),
            age: plane.age,
            radius: plane.radius,
        }
    }
}
