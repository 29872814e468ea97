use std::fmt;

use egui::Pos2;
use serde::{Deserialize, Serialize};

// ── Data Model ──────────────────────────────────────────────────────────────

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Square,
    Circle,
    Triangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Rectangle,
        ShapeKind::Square,
        ShapeKind::Circle,
        ShapeKind::Triangle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Square => "Square",
            ShapeKind::Circle => "Circle",
            ShapeKind::Triangle => "Triangle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One hotspot. Coordinates are in image space, so a shape stays attached to
/// the same pixels whatever the canvas size.
///
/// `index` is the shape's 1-based position in the list it was last committed
/// or saved with. It is renumbered whenever the list changes and is not an
/// identity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub index: usize,
}

impl Shape {
    pub fn from_gesture(kind: ShapeKind, start: Pos2, end: Pos2, index: usize) -> Self {
        Self {
            kind,
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            index,
        }
    }

    pub fn start(&self) -> Pos2 {
        Pos2::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> Pos2 {
        Pos2::new(self.end_x, self.end_y)
    }
}

/// Rewrite every index to the shape's 1-based position.
pub fn renumber(shapes: &mut [Shape]) {
    for (i, shape) in shapes.iter_mut().enumerate() {
        shape.index = i + 1;
    }
}
