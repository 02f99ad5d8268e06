use glam::Vec2;

use linework_engine::document::{Circle, Document, LineSegment};

/// Initial half-extent: the demo drawing plus a margin.
pub const HOME_ZOOM: f32 = 80.0;

/// Initial pan: centers the 100x100 drawing.
pub const HOME_PAN: Vec2 = Vec2::new(-50.0, -50.0);

/// Sample drawing: a diagonal and an inscribed circle on "Default", a frame
/// and center marks on "Construction".
pub fn demo_document() -> Document {
    let mut doc = Document::new();
    let base = doc.layer_ids().next();
    let construction = doc.add_layer("Construction");

    if let Some(base) = base {
        doc.add_entity(base, LineSegment::new(Vec2::ZERO, Vec2::new(100.0, 100.0)));
        doc.add_entity(base, Circle::new(Vec2::new(50.0, 50.0), 25.0));
    }

    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(100.0, 0.0),
        Vec2::new(100.0, 100.0),
        Vec2::new(0.0, 100.0),
    ];
    for (i, &a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % corners.len()];
        doc.add_entity(construction, LineSegment::new(a, b));
    }
    doc.add_entity(construction, LineSegment::new(Vec2::new(40.0, 50.0), Vec2::new(60.0, 50.0)));
    doc.add_entity(construction, LineSegment::new(Vec2::new(50.0, 40.0), Vec2::new(50.0, 60.0)));
    doc.add_entity(construction, Circle::new(Vec2::new(50.0, 50.0), 50.0));

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use linework_engine::render::{Tessellator, CIRCLE_SEGMENTS};

    #[test]
    fn default_layer_alone_yields_130_vertices() {
        let mut doc = demo_document();
        let construction = doc.layer_ids().nth(1).expect("construction layer");
        doc.set_layer_visible(construction, false);

        let mut tess = Tessellator::new();
        assert_eq!(tess.tessellate(&doc).len(), 130);
    }

    #[test]
    fn both_layers_visible() {
        let doc = demo_document();
        let mut tess = Tessellator::new();
        let expected = 2 * (1 + 6) + 2 * CIRCLE_SEGMENTS * 2;
        assert_eq!(tess.tessellate(&doc).len(), expected);
    }
}
