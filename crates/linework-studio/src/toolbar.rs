use glam::Vec2;

use linework_engine::document::{Document, LayerId};
use linework_engine::render::{Overlay, QuadOverlay, ScreenRect};

// Logical pixels; multiplied by the window scale factor.
const BAR_HEIGHT: f32 = 32.0;
const PADDING: f32 = 4.0;
const BUTTON_WIDTH: f32 = 96.0;
const BUTTON_GAP: f32 = 6.0;
const INDICATOR_HEIGHT: f32 = 4.0;

const BAR_COLOR: [f32; 4] = [0.16, 0.16, 0.18, 0.95];
const BUTTON_COLOR: [f32; 4] = [0.26, 0.26, 0.30, 1.0];
const BUTTON_HOVER_COLOR: [f32; 4] = [0.34, 0.34, 0.40, 1.0];
const VISIBLE_COLOR: [f32; 4] = [0.30, 0.80, 0.40, 1.0];
const HIDDEN_COLOR: [f32; 4] = [0.55, 0.22, 0.22, 1.0];

#[derive(Debug, Copy, Clone, PartialEq)]
struct Button {
    rect: ScreenRect,
    layer: LayerId,
}

/// Header strip with one visibility toggle per layer.
///
/// Layout and hit-testing are in physical pixels so they line up with
/// pointer positions from the input layer.
#[derive(Default)]
pub struct Toolbar {
    bar: ScreenRect,
    buttons: Vec<Button>,
    overlay: QuadOverlay,
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes layout for the current document and viewport and refills the overlay.
    pub fn rebuild(&mut self, document: &Document, viewport: Vec2, scale: f32, pointer: Option<Vec2>) {
        let (bar, rects) = layout(viewport.x, scale, document.layers().len());
        self.bar = bar;
        self.buttons = rects
            .into_iter()
            .zip(document.layer_ids())
            .map(|(rect, layer)| Button { rect, layer })
            .collect();

        self.overlay.clear();
        self.overlay.push(bar, BAR_COLOR);

        for button in &self.buttons {
            let hovered = pointer.is_some_and(|p| button.rect.contains(p));
            let visible = document.layer(button.layer).is_some_and(|l| l.is_visible());

            self.overlay.push(button.rect, if hovered { BUTTON_HOVER_COLOR } else { BUTTON_COLOR });

            let r = button.rect;
            let h = INDICATOR_HEIGHT * scale;
            let indicator = ScreenRect::new(r.origin.x, r.origin.y + r.size.y - h, r.size.x, h);
            self.overlay.push(indicator, if visible { VISIBLE_COLOR } else { HIDDEN_COLOR });
        }
    }

    /// Layer whose button is under `p`.
    pub fn hit(&self, p: Vec2) -> Option<LayerId> {
        self.buttons.iter().find(|b| b.rect.contains(p)).map(|b| b.layer)
    }

    /// True if `p` is anywhere on the strip.
    pub fn contains(&self, p: Vec2) -> bool {
        self.bar.contains(p)
    }

    pub fn overlay_mut(&mut self) -> &mut (dyn Overlay + 'static) {
        &mut self.overlay
    }
}

/// Bar rect plus one button rect per layer, left to right.
fn layout(viewport_width: f32, scale: f32, layers: usize) -> (ScreenRect, Vec<ScreenRect>) {
    let bar = ScreenRect::new(0.0, 0.0, viewport_width, BAR_HEIGHT * scale);

    let pad = PADDING * scale;
    let w = BUTTON_WIDTH * scale;
    let gap = BUTTON_GAP * scale;
    let h = bar.size.y - 2.0 * pad;

    let buttons = (0..layers)
        .map(|i| ScreenRect::new(pad + i as f32 * (w + gap), pad, w, h))
        .collect();

    (bar, buttons)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        let mut doc = Document::new();
        doc.add_layer("Construction");
        doc
    }

    #[test]
    fn layout_places_buttons_left_to_right() {
        let (bar, buttons) = layout(800.0, 1.0, 3);
        assert_eq!(bar, ScreenRect::new(0.0, 0.0, 800.0, 32.0));
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0], ScreenRect::new(4.0, 4.0, 96.0, 24.0));
        assert_eq!(buttons[1].origin.x, 4.0 + 96.0 + 6.0);
    }

    #[test]
    fn layout_scales_with_dpi() {
        let (bar, buttons) = layout(1600.0, 2.0, 1);
        assert_eq!(bar.size.y, 64.0);
        assert_eq!(buttons[0], ScreenRect::new(8.0, 8.0, 192.0, 48.0));
    }

    #[test]
    fn hit_maps_buttons_to_layers() {
        let doc = document();
        let mut toolbar = Toolbar::new();
        toolbar.rebuild(&doc, Vec2::new(800.0, 600.0), 1.0, None);

        let ids: Vec<LayerId> = doc.layer_ids().collect();
        assert_eq!(toolbar.hit(Vec2::new(10.0, 10.0)), Some(ids[0]));
        assert_eq!(toolbar.hit(Vec2::new(110.0, 10.0)), Some(ids[1]));
        assert_eq!(toolbar.hit(Vec2::new(500.0, 10.0)), None);
        assert!(toolbar.contains(Vec2::new(500.0, 10.0)));
        assert!(!toolbar.contains(Vec2::new(500.0, 100.0)));
    }

    #[test]
    fn rebuild_emits_bar_plus_two_rects_per_layer() {
        let doc = document();
        let mut toolbar = Toolbar::new();
        toolbar.rebuild(&doc, Vec2::new(800.0, 600.0), 1.0, Some(Vec2::new(10.0, 10.0)));
        assert_eq!(toolbar.overlay.len(), 1 + 2 * 2);

        // Rebuilding replaces rather than appends.
        toolbar.rebuild(&doc, Vec2::new(800.0, 600.0), 1.0, None);
        assert_eq!(toolbar.overlay.len(), 5);
    }
}
