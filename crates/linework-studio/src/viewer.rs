use glam::Vec2;

use linework_engine::core::{App, AppControl, FrameCtx};
use linework_engine::document::{Document, LayerId};
use linework_engine::input::{InputFrame, InputState, Key, MouseButton};
use linework_engine::render::{Camera, FrameOutcome, Renderer};

use crate::controls::{CameraController, NavInput};
use crate::toolbar::Toolbar;

/// Interactive document viewer.
pub struct Viewer {
    document: Document,
    camera: Camera,
    controller: CameraController,

    /// Built on the first frame (GPU is up by then) and released on shutdown,
    /// before the renderer goes away.
    toolbar: Option<Toolbar>,

    dragging: bool,
}

impl Viewer {
    pub fn new(document: Document, controller: CameraController) -> Self {
        Self {
            document,
            camera: controller.home_camera(),
            controller,
            toolbar: None,
            dragging: false,
        }
    }

    fn toggle_layer(&mut self, layer: LayerId, renderer: &mut Renderer<'_>) {
        if let Some(visible) = self.document.toggle_layer(layer) {
            let name = self.document.layer(layer).map_or("?", |l| l.name());
            log::info!("layer '{name}' {}", if visible { "shown" } else { "hidden" });
            renderer.mark_scene_dirty();
        }
    }
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> anyhow::Result<AppControl> {
        if ctx.input_frame.key_pressed(Key::Escape) {
            return Ok(AppControl::Exit);
        }

        let mut toolbar = self.toolbar.take().unwrap_or_default();
        let pointer = ctx.input.pointer_pos;

        // Clicks on the strip toggle layers; clicks elsewhere start a pan.
        if ctx.input_frame.button_pressed(MouseButton::Left) {
            if let Some(p) = pointer {
                if let Some(layer) = toolbar.hit(p) {
                    self.toggle_layer(layer, ctx.renderer);
                } else if !toolbar.contains(p) {
                    self.dragging = true;
                }
            }
        }
        if !ctx.input.button_down(MouseButton::Left) {
            self.dragging = false;
        }

        for layer in digit_layers(ctx.input_frame, &self.document) {
            self.toggle_layer(layer, ctx.renderer);
        }

        let nav = nav_input(ctx.input, ctx.input_frame, self.dragging, ctx.time.dt);
        let framebuffer = ctx.framebuffer_size();
        if self
            .controller
            .apply(&mut self.camera, ctx.renderer.dirty_mut(), &nav, framebuffer)
        {
            ctx.runtime
                .set_title(format!("linework | zoom {:.1}", self.camera.zoom()));
        }

        let scale = ctx.window.scale_factor() as f32;
        toolbar.rebuild(&self.document, ctx.renderer.viewport(), scale, pointer);

        let outcome = ctx
            .renderer
            .render_frame(&self.document, &self.camera, Some(toolbar.overlay_mut()));
        self.toolbar = Some(toolbar);

        match outcome? {
            FrameOutcome::Presented | FrameOutcome::Suspended => {}
            other => log::debug!("frame: {other:?}"),
        }

        Ok(AppControl::Continue)
    }

    fn on_shutdown(&mut self) {
        self.toolbar = None;
    }
}

/// Layers toggled by digit keys this frame: `1` is the first layer, `0` the tenth.
fn digit_layers(frame: &InputFrame, document: &Document) -> Vec<LayerId> {
    let mut digits: Vec<u8> = frame.keys_pressed.iter().filter_map(|k| k.digit()).collect();
    digits.sort_unstable();

    digits
        .into_iter()
        .filter_map(|d| {
            let index = if d == 0 { 9 } else { usize::from(d) - 1 };
            document.layer_ids().nth(index)
        })
        .collect()
}

fn nav_input(input: &InputState, frame: &InputFrame, dragging: bool, dt: f32) -> NavInput {
    let axis = |neg: Key, pos: Key| -> f32 {
        (input.key_down(pos) as i32 - input.key_down(neg) as i32) as f32
    };

    NavInput {
        wheel_lines: frame.wheel_lines,
        drag: if dragging { frame.pointer_delta } else { Vec2::ZERO },
        arrows: Vec2::new(
            axis(Key::ArrowLeft, Key::ArrowRight),
            axis(Key::ArrowDown, Key::ArrowUp),
        ),
        reset: frame.key_pressed(Key::Home),
        dt,
    }
}

#[cfg(test)]
mod tests {
    use linework_engine::input::{InputEvent, KeyState, Modifiers};

    use super::*;

    fn press(state: &mut InputState, frame: &mut InputFrame, key: Key) {
        state.apply_event(
            frame,
            InputEvent::Key { key, state: KeyState::Pressed, modifiers: Modifiers::default(), repeat: false },
        );
    }

    #[test]
    fn digits_select_layers_by_position() {
        let mut doc = Document::new();
        doc.add_layer("Construction");
        let ids: Vec<LayerId> = doc.layer_ids().collect();

        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        press(&mut state, &mut frame, Key::Digit2);
        press(&mut state, &mut frame, Key::Digit1);
        press(&mut state, &mut frame, Key::Digit5);

        assert_eq!(digit_layers(&frame, &doc), vec![ids[0], ids[1]]);
    }

    #[test]
    fn arrows_and_home_map_to_nav_input() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        press(&mut state, &mut frame, Key::ArrowRight);
        press(&mut state, &mut frame, Key::ArrowDown);
        press(&mut state, &mut frame, Key::Home);

        let nav = nav_input(&state, &frame, false, 0.016);
        assert_eq!(nav.arrows, Vec2::new(1.0, -1.0));
        assert!(nav.reset);
        assert_eq!(nav.dt, 0.016);
    }

    #[test]
    fn drag_only_counts_while_dragging() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 0.0, y: 0.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 5.0, y: 3.0 });

        assert_eq!(nav_input(&state, &frame, false, 0.0).drag, Vec2::ZERO);
        assert_eq!(nav_input(&state, &frame, true, 0.0).drag, Vec2::new(5.0, 3.0));
    }
}
