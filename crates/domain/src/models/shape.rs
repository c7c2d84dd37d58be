//! Drawable map shapes and the edit events they report.

use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;

/// Handle to an overlay owned by a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShapeId(pub u64);

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shape-{}", self.0)
    }
}

/// Overlay styling and editability options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub stroke_color: String,
    pub stroke_weight: u8,
    pub fill_color: String,
    pub fill_opacity: f32,
    pub editable: bool,
    pub draggable: bool,
}

impl ShapeStyle {
    pub fn editable() -> Self {
        Self {
            editable: true,
            draggable: true,
            ..Self::read_only()
        }
    }

    pub fn read_only() -> Self {
        Self {
            stroke_color: "#4A90E2".to_string(),
            stroke_weight: 2,
            fill_color: "#4A90E2".to_string(),
            fill_opacity: 0.2,
            editable: false,
            draggable: false,
        }
    }
}

/// The ephemeral visual form of a geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DrawnShape {
    Circle {
        center: Coordinate,
        radius: f64,
        editable: bool,
    },
    Polygon {
        vertices: Vec<Coordinate>,
        editable: bool,
    },
}

impl DrawnShape {
    pub fn is_editable(&self) -> bool {
        match self {
            DrawnShape::Circle { editable, .. } | DrawnShape::Polygon { editable, .. } => *editable,
        }
    }
}

/// A point in map-container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Edit notifications reported by a map surface for an overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeEvent {
    /// A circle was dragged to a new center.
    CenterChanged { shape: ShapeId, center: Coordinate },
    /// A circle's edge handle was dragged.
    RadiusChanged { shape: ShapeId, radius: f64 },
    /// A polygon vertex was inserted, moved or removed.
    PathChanged { shape: ShapeId },
    /// The free-hand drawing tool finished a new polygon overlay.
    PolygonCompleted {
        shape: ShapeId,
        vertices: Vec<Coordinate>,
    },
}

impl ShapeEvent {
    pub fn shape(&self) -> ShapeId {
        match self {
            ShapeEvent::CenterChanged { shape, .. }
            | ShapeEvent::RadiusChanged { shape, .. }
            | ShapeEvent::PathChanged { shape }
            | ShapeEvent::PolygonCompleted { shape, .. } => *shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_editability() {
        assert!(ShapeStyle::editable().editable);
        assert!(ShapeStyle::editable().draggable);
        assert!(!ShapeStyle::read_only().editable);
        assert!(!ShapeStyle::read_only().draggable);
    }

    #[test]
    fn test_shape_id_display() {
        assert_eq!(ShapeId(7).to_string(), "shape-7");
    }

    #[test]
    fn test_event_shape_accessor() {
        let event = ShapeEvent::RadiusChanged {
            shape: ShapeId(3),
            radius: 10.0,
        };
        assert_eq!(event.shape(), ShapeId(3));
    }
}
