use std::f32::consts::TAU;

use crate::document::{Circle, Document, Entity, LineSegment};

use super::Vertex;

/// Number of straight segments approximating one circle.
pub const CIRCLE_SEGMENTS: usize = 64;

/// Provenance tag for raw line segments.
pub const LINE_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Provenance tag for tessellated circle arcs.
pub const ARC_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

/// Converts visible document geometry into a line-list vertex stream.
///
/// Every call recomputes from scratch; the output buffer is reused across
/// calls to avoid reallocating once warmed.
#[derive(Debug, Default)]
pub struct Tessellator {
    vertices: Vec<Vertex>,
}

impl Tessellator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the vertex stream from every visible layer of `document`.
    pub fn tessellate(&mut self, document: &Document) -> &[Vertex] {
        self.vertices.clear();

        for entity in document.visible_entities() {
            match entity {
                Entity::Line(line) => push_line(&mut self.vertices, line),
                Entity::Circle(circle) => push_circle(&mut self.vertices, circle),
            }
        }

        &self.vertices
    }

    /// Output of the most recent [`tessellate`](Self::tessellate) call.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

fn push_line(out: &mut Vec<Vertex>, line: &LineSegment) {
    out.push(Vertex::new(line.start.to_array(), LINE_COLOR));
    out.push(Vertex::new(line.end.to_array(), LINE_COLOR));
}

fn push_circle(out: &mut Vec<Vertex>, circle: &Circle) {
    out.reserve(CIRCLE_SEGMENTS * 2);
    for i in 0..CIRCLE_SEGMENTS {
        let a0 = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
        let a1 = TAU * (i + 1) as f32 / CIRCLE_SEGMENTS as f32;
        out.push(Vertex::new(arc_point(circle, a0), ARC_COLOR));
        out.push(Vertex::new(arc_point(circle, a1), ARC_COLOR));
    }
}

#[inline]
fn arc_point(circle: &Circle, angle: f32) -> [f32; 2] {
    let (sin, cos) = angle.sin_cos();
    [
        circle.center.x + cos * circle.radius,
        circle.center.y + sin * circle.radius,
    ]
}
