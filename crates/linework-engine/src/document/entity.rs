use glam::Vec2;

/// Straight segment between two world-space points.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
}

impl LineSegment {
    #[inline]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }
}

/// Circle given by center and radius in world units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    #[inline]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Closed set of drawable shapes.
///
/// Extending the document:
/// - add the shape payload in this file
/// - add a variant here
/// - add the matching arm in `render::tessellate`
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Entity {
    Line(LineSegment),
    Circle(Circle),
}

impl From<LineSegment> for Entity {
    #[inline]
    fn from(line: LineSegment) -> Self {
        Entity::Line(line)
    }
}

impl From<Circle> for Entity {
    #[inline]
    fn from(circle: Circle) -> Self {
        Entity::Circle(circle)
    }
}
