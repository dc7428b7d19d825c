//! The seam between simulation and drawing.
//!
//! After each simulation step the engine captures a [`FrameSnapshot`] (an
//! immutable view of every live plane) and hands it to a [`RenderSurface`].
//! Surfaces never see the lifecycle manager, and the lifecycle manager never
//! sees a surface.

use crate::camera::OrbitCamera;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::plane::{Plane, PlaneUniforms, RetiredPlane};
use crate::textures::TextureHandle;
use glam::{Mat4, Vec3};

/// Everything needed to draw one plane.
#[derive(Debug, Clone)]
pub struct PlaneView {
    pub render_priority: i32,
    pub texture: TextureHandle,
    pub position: Vec3,
    pub scale: f32,
    pub opacity: f32,
    pub uniforms: PlaneUniforms,
}

/// The visible planes of one frame, in creation order.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    /// Clock time of the frame.
    pub now: f32,
    /// Planes in creation order (strictly decreasing priority).
    pub planes: Vec<PlaneView>,
}

impl FrameSnapshot {
    /// Capture the live set.
    pub fn capture(now: f32, planes: &[Plane], render: &RenderConfig) -> Self {
        let planes = planes
            .iter()
            .map(|p| PlaneView {
                render_priority: p.render_priority(),
                texture: p.texture().clone(),
                position: p.position(render.plane_height),
                scale: p.scale(),
                opacity: p.opacity(),
                uniforms: p.uniforms(render),
            })
            .collect();
        Self { now, planes }
    }

    /// Planes in draw order: ascending render priority, newest first.
    pub fn draw_order(&self) -> impl Iterator<Item = &PlaneView> {
        self.planes.iter().rev()
    }

    /// Number of planes in the frame.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Whether the frame has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}

/// Something that can draw the plane field.
pub trait RenderSurface {
    /// Free per-plane resources of planes removed this frame.
    ///
    /// Called before [`present`](Self::present) in the frame the planes were
    /// retired, exactly once per plane.
    fn release(&mut self, retired: &[RetiredPlane]);

    /// Draw one frame.
    fn present(&mut self, frame: &FrameSnapshot, camera: &OrbitCamera) -> Result<(), RenderError>;
}

impl<S: RenderSurface + ?Sized> RenderSurface for Box<S> {
    fn release(&mut self, retired: &[RetiredPlane]) {
        (**self).release(retired)
    }

    fn present(&mut self, frame: &FrameSnapshot, camera: &OrbitCamera) -> Result<(), RenderError> {
        (**self).present(frame, camera)
    }
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    fn release(&mut self, retired: &[RetiredPlane]) {
        (**self).release(retired)
    }

    fn present(&mut self, frame: &FrameSnapshot, camera: &OrbitCamera) -> Result<(), RenderError> {
        (**self).present(frame, camera)
    }
}

/// A frame as seen by [`RecordingSurface`].
#[derive(Debug, Clone)]
pub struct RecordedFrame {
    pub snapshot: FrameSnapshot,
    pub view_proj: Mat4,
}

/// Headless surface that keeps every frame and release it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Presented frames, oldest first.
    pub frames: Vec<RecordedFrame>,
    /// Priorities released, in release order.
    pub released: Vec<i32>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.frames.last().map(|f| &f.snapshot)
    }
}

impl RenderSurface for RecordingSurface {
    fn release(&mut self, retired: &[RetiredPlane]) {
        self.released.extend(retired.iter().map(|r| r.render_priority));
    }

    fn present(&mut self, frame: &FrameSnapshot, camera: &OrbitCamera) -> Result<(), RenderError> {
        self.frames.push(RecordedFrame {
            snapshot: frame.clone(),
            view_proj: camera.view_proj(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpawnConfig;
    use crate::plane::PlaneFactory;
    use crate::textures::{TextureCycler, TexturePool};

    fn planes(n: i32) -> Vec<Plane> {
        let cfg = SpawnConfig::default();
        let mut cycler = TextureCycler::new(TexturePool::procedural(2)).unwrap();
        (0..n)
            .map(|i| PlaneFactory::create(cfg.arm_angle(i as u32), cycler.next(), -i, 0.0, &cfg).unwrap())
            .collect()
    }

    #[test]
    fn test_capture_keeps_creation_order() {
        let snap = FrameSnapshot::capture(1.0, &planes(3), &RenderConfig::default());
        let priorities: Vec<i32> = snap.planes.iter().map(|p| p.render_priority).collect();
        assert_eq!(priorities, vec![0, -1, -2]);
        assert_eq!(snap.planes[0].position.y, -5.0);
    }

    #[test]
    fn test_draw_order_ascending_priority() {
        let snap = FrameSnapshot::capture(1.0, &planes(4), &RenderConfig::default());
        let order: Vec<i32> = snap.draw_order().map(|p| p.render_priority).collect();
        assert_eq!(order, vec![-3, -2, -1, 0]);
    }

    #[test]
    fn test_recording_surface() {
        let mut surface = RecordingSurface::new();
        let snap = FrameSnapshot::capture(0.5, &planes(2), &RenderConfig::default());
        surface.present(&snap, &OrbitCamera::default()).unwrap();
        let retired: Vec<RetiredPlane> = planes(2).iter().map(RetiredPlane::from).collect();
        surface.release(&retired);

        assert_eq!(surface.frames.len(), 1);
        assert_eq!(surface.last_frame().unwrap().len(), 2);
        assert_eq!(surface.released, vec![0, -1]);
    }

    #[test]
    fn test_boxed_surface_forwards() {
        let mut inner = RecordingSurface::new();
        {
            let mut boxed: Box<dyn RenderSurface + '_> = Box::new(&mut inner);
            boxed.present(&FrameSnapshot::default(), &OrbitCamera::default()).unwrap();
        }
        assert_eq!(inner.frames.len(), 1);
    }
}
