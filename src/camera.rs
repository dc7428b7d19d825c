//! Orbit camera with damping.
//!
//! The camera circles a target point. Drag input is not applied at once:
//! it accumulates as pending rotation that is eased in over the following
//! frames, so the view keeps gliding briefly after the mouse stops.

use crate::config::RenderConfig;
use glam::{Mat4, Vec3};

const MIN_PITCH: f32 = -1.5;
const MAX_PITCH: f32 = 1.5;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 200.0;
/// Radians of rotation per pixel of drag.
const ROTATE_SPEED: f32 = 0.005;

/// Orbit camera for viewing the flower.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport width / height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of pending motion applied (and removed) per update.
    /// `1.0` and `0.0` both apply motion immediately.
    pub damping: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

impl OrbitCamera {
    /// Camera high above the flower looking down at it.
    pub fn new(render: &RenderConfig) -> Self {
        Self {
            yaw: 0.0,
            pitch: MAX_PITCH,
            distance: render.camera_distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            target: Vec3::ZERO,
            fov_y: render.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: render.near,
            far: render.far,
            damping: render.damping.clamp(0.0, 1.0),
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Perspective projection for the current aspect ratio.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio after a resize. Zero-sized viewports are ignored.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Queue a rotation from a mouse drag of (`dx`, `dy`) pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.pending_yaw -= dx * ROTATE_SPEED;
        self.pending_pitch += dy * ROTATE_SPEED;
    }

    /// Queue a zoom; positive `amount` moves closer.
    pub fn zoom(&mut self, amount: f32) {
        self.pending_zoom -= amount;
    }

    /// Ease pending motion into the camera. Call once per frame.
    ///
    /// Each call applies `damping` of what is pending and keeps the rest, so
    /// the total applied converges on exactly the input.
    pub fn update(&mut self) {
        let f = if self.damping > 0.0 { self.damping } else { 1.0 };

        self.yaw += self.pending_yaw * f;
        self.pitch = (self.pitch + self.pending_pitch * f).clamp(MIN_PITCH, MAX_PITCH);
        self.distance = (self.distance + self.pending_zoom * f).clamp(MIN_DISTANCE, MAX_DISTANCE);

        let keep = 1.0 - f;
        self.pending_yaw *= keep;
        self.pending_pitch *= keep;
        self.pending_zoom *= keep;
    }

    /// Whether any queued motion is still being applied.
    pub fn is_moving(&self) -> bool {
        const EPS: f32 = 1e-5;
        self.pending_yaw.abs() > EPS || self.pending_pitch.abs() > EPS || self.pending_zoom.abs() > EPS
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_above_target() {
        let cam = OrbitCamera::default();
        let pos = cam.position();
        assert!(pos.y > 19.0);
        assert!((pos.length() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_damped_drag_converges() {
        let mut cam = OrbitCamera::default();
        cam.pitch = 0.0;
        cam.drag(-100.0, 0.0);
        cam.update();
        // Only part of the motion is applied on the first frame
        assert!(cam.yaw > 0.0 && cam.yaw < 0.5);
        for _ in 0..500 {
            cam.update();
        }
        assert!((cam.yaw - 0.5).abs() < 1e-3);
        assert!(!cam.is_moving());
    }

    #[test]
    fn test_no_damping_applies_immediately() {
        let mut cam = OrbitCamera::default();
        cam.damping = 1.0;
        cam.zoom(5.0);
        cam.update();
        assert!((cam.distance - 15.0).abs() < 1e-5);
        assert!(!cam.is_moving());
    }

    #[test]
    fn test_pitch_and_distance_clamped() {
        let mut cam = OrbitCamera::default();
        cam.damping = 1.0;
        cam.drag(0.0, 10_000.0);
        cam.zoom(1_000.0);
        cam.update();
        assert_eq!(cam.pitch, MAX_PITCH);
        assert_eq!(cam.distance, MIN_DISTANCE);
    }

    #[test]
    fn test_set_aspect_ignores_zero() {
        let mut cam = OrbitCamera::default();
        cam.set_aspect(800, 400);
        assert_eq!(cam.aspect, 2.0);
        cam.set_aspect(0, 400);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn test_target_projects_to_centre() {
        let mut cam = OrbitCamera::default();
        cam.pitch = 0.4;
        let clip = cam.view_proj() * cam.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }
}
