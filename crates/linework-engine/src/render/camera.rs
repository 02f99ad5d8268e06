use glam::{Mat4, Vec2};

use super::DirtyFlags;

/// Lower zoom bound enforced by input handling.
pub const MIN_ZOOM: f32 = 1.0;

/// Upper zoom bound enforced by input handling.
pub const MAX_ZOOM: f32 = 1000.0;

/// 2D orthographic camera.
///
/// `zoom` is the half-extent of the visible square in world units, so larger
/// values show more of the document. `pan` is added to every world position
/// before projection.
///
/// The camera is the only owner of zoom/pan; callers read the current values
/// back from it rather than keeping their own copies.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    zoom: f32,
    pan: Vec2,
    view_proj: Mat4,
}

impl Camera {
    pub fn new(zoom: f32, pan: Vec2) -> Self {
        Self {
            zoom,
            pan,
            view_proj: view_projection(zoom, pan),
        }
    }

    /// Recomputes the transform and marks the camera dirty.
    ///
    /// `zoom` is expected to be clamped to [`MIN_ZOOM`, `MAX_ZOOM`] by the caller.
    pub fn update(&mut self, zoom: f32, pan: Vec2, dirty: &mut DirtyFlags) {
        debug_assert!(zoom.is_finite() && pan.is_finite());
        self.zoom = zoom;
        self.pan = pan;
        self.view_proj = view_projection(zoom, pan);
        dirty.camera = true;
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[inline]
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Combined view-projection matrix, pushed once per draw.
    #[inline]
    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    /// Converts a framebuffer-pixel delta into a world-space delta.
    ///
    /// Screen +Y points down while world +Y points up.
    pub fn pixels_to_world(&self, delta: Vec2, framebuffer: Vec2) -> Vec2 {
        if framebuffer.x <= 0.0 || framebuffer.y <= 0.0 {
            return Vec2::ZERO;
        }
        let per_pixel = Vec2::splat(2.0 * self.zoom) / framebuffer;
        Vec2::new(delta.x * per_pixel.x, -delta.y * per_pixel.y)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(MIN_ZOOM, Vec2::ZERO)
    }
}

/// Orthographic `[-zoom, zoom]²` projection composed with a translation by `pan`.
pub fn view_projection(zoom: f32, pan: Vec2) -> Mat4 {
    let proj = Mat4::orthographic_rh(-zoom, zoom, -zoom, zoom, -1.0, 1.0);
    let view = Mat4::from_translation(pan.extend(0.0));
    proj * view
}
