use glam::Vec2;

use linework_engine::render::{Camera, DirtyFlags, MAX_ZOOM, MIN_ZOOM};

/// Zoom factor applied per wheel notch.
pub const ZOOM_STEP: f32 = 1.1;

/// Keyboard pan speed in visible half-extents per second.
pub const KEY_PAN_SPEED: f32 = 1.0;

/// Navigation input gathered for one frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct NavInput {
    /// Wheel notches, positive = zoom in.
    pub wheel_lines: f32,
    /// Pointer motion in physical pixels while the pan button is held.
    pub drag: Vec2,
    /// Held arrow keys as a direction; +X right, +Y up.
    pub arrows: Vec2,
    pub reset: bool,
    /// Frame delta in seconds.
    pub dt: f32,
}

/// Turns wheel/drag/keyboard input into camera updates.
///
/// Reads the current zoom and pan back from the camera every time, so the
/// camera stays the only place they are stored.
#[derive(Debug, Clone)]
pub struct CameraController {
    home_zoom: f32,
    home_pan: Vec2,
}

impl CameraController {
    pub fn new(home_zoom: f32, home_pan: Vec2) -> Self {
        Self {
            home_zoom: home_zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            home_pan,
        }
    }

    /// Camera looking at the home view.
    pub fn home_camera(&self) -> Camera {
        Camera::new(self.home_zoom, self.home_pan)
    }

    /// Applies `input`; returns `true` if the camera changed.
    pub fn apply(
        &self,
        camera: &mut Camera,
        dirty: &mut DirtyFlags,
        input: &NavInput,
        framebuffer: Vec2,
    ) -> bool {
        if input.reset {
            camera.update(self.home_zoom, self.home_pan, dirty);
            return true;
        }

        let mut zoom = camera.zoom();
        let mut pan = camera.pan();

        if input.wheel_lines != 0.0 {
            zoom = (zoom / ZOOM_STEP.powf(input.wheel_lines)).clamp(MIN_ZOOM, MAX_ZOOM);
        }

        // Content follows the pointer.
        if input.drag != Vec2::ZERO {
            pan += camera.pixels_to_world(input.drag, framebuffer);
        }

        // Arrows move the view, so content moves the other way.
        if input.arrows != Vec2::ZERO {
            pan -= input.arrows.normalize_or_zero() * (KEY_PAN_SPEED * zoom * input.dt);
        }

        if zoom == camera.zoom() && pan == camera.pan() {
            return false;
        }
        camera.update(zoom, pan, dirty);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FB: Vec2 = Vec2::new(800.0, 600.0);

    fn setup() -> (CameraController, Camera, DirtyFlags) {
        let ctl = CameraController::new(100.0, Vec2::new(-50.0, -50.0));
        let camera = ctl.home_camera();
        (ctl, camera, DirtyFlags::default())
    }

    #[test]
    fn wheel_zooms_multiplicatively() {
        let (ctl, mut camera, mut dirty) = setup();
        let input = NavInput { wheel_lines: 1.0, ..NavInput::default() };

        assert!(ctl.apply(&mut camera, &mut dirty, &input, FB));
        assert!((camera.zoom() - 100.0 / ZOOM_STEP).abs() < 1e-3);
        assert!(dirty.camera);
        assert!(!dirty.scene);
    }

    #[test]
    fn zoom_is_clamped() {
        let (ctl, mut camera, mut dirty) = setup();

        let zoom_in = NavInput { wheel_lines: 500.0, ..NavInput::default() };
        ctl.apply(&mut camera, &mut dirty, &zoom_in, FB);
        assert_eq!(camera.zoom(), MIN_ZOOM);

        let zoom_out = NavInput { wheel_lines: -500.0, ..NavInput::default() };
        ctl.apply(&mut camera, &mut dirty, &zoom_out, FB);
        assert_eq!(camera.zoom(), MAX_ZOOM);
    }

    #[test]
    fn clamped_zoom_is_not_a_change() {
        let ctl = CameraController::new(MIN_ZOOM, Vec2::ZERO);
        let mut camera = ctl.home_camera();
        let mut dirty = DirtyFlags::default();

        let input = NavInput { wheel_lines: 3.0, ..NavInput::default() };
        assert!(!ctl.apply(&mut camera, &mut dirty, &input, FB));
        assert!(!dirty.camera);
    }

    #[test]
    fn drag_moves_content_with_pointer() {
        let (ctl, mut camera, mut dirty) = setup();
        let before = camera.pan();

        // 80 px right, 60 px down on an 800x600 framebuffer at half-extent 100.
        let input = NavInput { drag: Vec2::new(80.0, 60.0), ..NavInput::default() };
        ctl.apply(&mut camera, &mut dirty, &input, FB);

        let moved = camera.pan() - before;
        assert!((moved.x - 20.0).abs() < 1e-4);
        assert!((moved.y + 20.0).abs() < 1e-4);
    }

    #[test]
    fn arrows_scale_with_dt_and_zoom() {
        let (ctl, mut camera, mut dirty) = setup();
        let before = camera.pan();

        let input = NavInput { arrows: Vec2::X, dt: 0.5, ..NavInput::default() };
        ctl.apply(&mut camera, &mut dirty, &input, FB);

        assert!((camera.pan().x - (before.x - 50.0)).abs() < 1e-4);
        assert_eq!(camera.pan().y, before.y);
    }

    #[test]
    fn reset_restores_home_view() {
        let (ctl, mut camera, mut dirty) = setup();
        camera.update(7.0, Vec2::new(3.0, 3.0), &mut dirty);

        let input = NavInput { reset: true, wheel_lines: 4.0, ..NavInput::default() };
        assert!(ctl.apply(&mut camera, &mut dirty, &input, FB));
        assert_eq!(camera.zoom(), 100.0);
        assert_eq!(camera.pan(), Vec2::new(-50.0, -50.0));
    }

    #[test]
    fn idle_input_leaves_camera_clean() {
        let (ctl, mut camera, mut dirty) = setup();
        assert!(!ctl.apply(&mut camera, &mut dirty, &NavInput::default(), FB));
        assert!(!dirty.any());
    }
}
