//! Debug drawing primitives and sinks
//!
//! Debug drawing lets the physics world describe its internal state as
//! simple lines, points, spheres and boxes. The world never renders; it
//! submits [`DebugShape`]s to a [`DebugRenderer`] owned by the caller.

use crate::foundation::math::{Quat, Vec3, Vec4};

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Line segment from start to end
    Line {
        /// Segment start
        start: Vec3,
        /// Segment end
        end: Vec3,
        /// RGBA color
        color: Vec4,
    },

    /// Sphere at center with radius
    Sphere {
        /// Sphere center
        center: Vec3,
        /// Sphere radius
        radius: f32,
        /// RGBA color
        color: Vec4,
        /// Outline only
        wireframe: bool,
    },

    /// Box (AABB or OBB) at center with half-extents
    Box {
        /// Box center
        center: Vec3,
        /// Half size on each local axis
        extents: Vec3,
        /// Orientation (identity for AABBs)
        rotation: Quat,
        /// RGBA color
        color: Vec4,
        /// Outline only
        wireframe: bool,
    },

    /// Point at position
    Point {
        /// Point position
        position: Vec3,
        /// RGBA color
        color: Vec4,
        /// Size in world units
        size: f32,
    },
}

impl DebugShape {
    /// Color of the primitive
    pub fn color(&self) -> Vec4 {
        match self {
            DebugShape::Line { color, .. }
            | DebugShape::Sphere { color, .. }
            | DebugShape::Box { color, .. }
            | DebugShape::Point { color, .. } => *color,
        }
    }

    /// Short name of the primitive kind
    pub fn kind(&self) -> &'static str {
        match self {
            DebugShape::Line { .. } => "line",
            DebugShape::Sphere { .. } => "sphere",
            DebugShape::Box { .. } => "box",
            DebugShape::Point { .. } => "point",
        }
    }
}

/// Rendering collaborator receiving debug primitives
pub trait DebugRenderer {
    /// Accept one primitive for this frame
    fn submit(&mut self, shape: DebugShape);

    /// Draw a line segment
    fn draw_line(&mut self, start: Vec3, end: Vec3, color: Vec4) {
        self.submit(DebugShape::Line { start, end, color });
    }

    /// Draw a wireframe sphere
    fn draw_sphere(&mut self, center: Vec3, radius: f32, color: Vec4) {
        self.submit(DebugShape::Sphere {
            center,
            radius,
            color,
            wireframe: true,
        });
    }

    /// Draw a wireframe box
    fn draw_box(&mut self, center: Vec3, extents: Vec3, rotation: Quat, color: Vec4) {
        self.submit(DebugShape::Box {
            center,
            extents,
            rotation,
            color,
            wireframe: true,
        });
    }

    /// Draw a point
    fn draw_point(&mut self, position: Vec3, color: Vec4, size: f32) {
        self.submit(DebugShape::Point { position, color, size });
    }
}

/// Collecting renderer: keeps every submitted primitive in order
#[derive(Debug, Default, Clone)]
pub struct DebugDrawList {
    shapes: Vec<DebugShape>,
}

impl DebugDrawList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// All primitives in submission order
    pub fn shapes(&self) -> &[DebugShape] {
        &self.shapes
    }

    /// Number of primitives of one kind (see [`DebugShape::kind`])
    pub fn count(&self, kind: &str) -> usize {
        self.shapes.iter().filter(|s| s.kind() == kind).count()
    }

    /// Get the number of collected primitives
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True when nothing was submitted
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Forget everything (call once per frame)
    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl DebugRenderer for DebugDrawList {
    fn submit(&mut self, shape: DebugShape) {
        self.shapes.push(shape);
    }
}
