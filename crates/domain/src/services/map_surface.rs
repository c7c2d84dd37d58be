//! Map surface contract used by the shape synchronizer.
//!
//! A surface draws circle and polygon overlays, reports edits on them as
//! [`ShapeEvent`]s and frames its viewport.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::models::{Bounds, Coordinate, DrawnShape, ScreenPoint, ShapeEvent, ShapeId, ShapeStyle};

/// Rendering surface able to draw editable shapes.
pub trait MapSurface {
    /// Draw a circle overlay and return its handle.
    fn draw_circle(&mut self, center: Coordinate, radius: f64, style: &ShapeStyle) -> ShapeId;

    /// Draw a polygon overlay from an open ring and return its handle.
    fn draw_polygon(&mut self, vertices: &[Coordinate], style: &ShapeStyle) -> ShapeId;

    /// Destroy an overlay together with its listeners.
    fn remove_shape(&mut self, shape: ShapeId);

    /// Subscribe to center/radius/path-change events of an overlay.
    fn attach_edit_listeners(&mut self, shape: ShapeId);

    /// Current vertex list of a polygon overlay.
    fn polygon_path(&self, shape: ShapeId) -> Vec<Coordinate>;

    fn fit_bounds(&mut self, bounds: Bounds);

    fn set_view(&mut self, center: Coordinate, zoom: u8);

    /// Toggle the free-hand polygon drawing tool.
    fn set_drawing_mode(&mut self, enabled: bool);

    /// Translate a click in container pixels to a geographic point.
    fn screen_to_geographic(&self, point: ScreenPoint) -> Option<Coordinate>;
}

/// Where the viewport was last framed.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewport {
    Centered { center: Coordinate, zoom: u8 },
    Fitted(Bounds),
}

#[derive(Debug, Default)]
struct SurfaceRecord {
    next_id: u64,
    shapes: BTreeMap<ShapeId, DrawnShape>,
    listeners: HashMap<ShapeId, usize>,
    drawn_total: usize,
    viewport: Option<Viewport>,
    drawing_mode: bool,
}

/// In-memory map surface for development and testing.
///
/// Clones share the same record, so a test can keep a handle while the
/// synchronizer owns another one.
#[derive(Debug, Clone)]
pub struct RecordingMapSurface {
    record: Rc<RefCell<SurfaceRecord>>,
    /// Geographic point shown at pixel (0, 0).
    origin: Coordinate,
    /// Degrees per pixel on both axes.
    scale: f64,
}

impl Default for RecordingMapSurface {
    fn default() -> Self {
        Self::new(Coordinate::default(), 0.0001)
    }
}

impl RecordingMapSurface {
    pub fn new(origin: Coordinate, scale: f64) -> Self {
        Self {
            record: Rc::new(RefCell::new(SurfaceRecord::default())),
            origin,
            scale,
        }
    }

    fn insert(&mut self, shape: DrawnShape) -> ShapeId {
        let mut record = self.record.borrow_mut();
        record.next_id += 1;
        record.drawn_total += 1;
        let id = ShapeId(record.next_id);
        record.shapes.insert(id, shape);
        id
    }

    /// Overlays currently alive on the surface.
    pub fn live_shapes(&self) -> Vec<(ShapeId, DrawnShape)> {
        self.record
            .borrow()
            .shapes
            .iter()
            .map(|(id, shape)| (*id, shape.clone()))
            .collect()
    }

    pub fn shape_count(&self) -> usize {
        self.record.borrow().shapes.len()
    }

    pub fn shape(&self, id: ShapeId) -> Option<DrawnShape> {
        self.record.borrow().shapes.get(&id).cloned()
    }

    /// Number of overlays ever drawn, removed or not.
    pub fn drawn_total(&self) -> usize {
        self.record.borrow().drawn_total
    }

    /// Number of times listeners were attached to `id`.
    pub fn listener_count(&self, id: ShapeId) -> usize {
        self.record.borrow().listeners.get(&id).copied().unwrap_or(0)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.record.borrow().viewport.clone()
    }

    pub fn drawing_mode(&self) -> bool {
        self.record.borrow().drawing_mode
    }

    /// Simulates dragging a circle and returns the event the surface reports.
    pub fn drag_center(&self, id: ShapeId, to: Coordinate) -> ShapeEvent {
        if let Some(DrawnShape::Circle { center, .. }) = self.record.borrow_mut().shapes.get_mut(&id) {
            *center = to;
        }
        ShapeEvent::CenterChanged {
            shape: id,
            center: to,
        }
    }

    /// Simulates dragging a circle's edge handle.
    pub fn drag_radius(&self, id: ShapeId, to: f64) -> ShapeEvent {
        if let Some(DrawnShape::Circle { radius, .. }) = self.record.borrow_mut().shapes.get_mut(&id) {
            *radius = to;
        }
        ShapeEvent::RadiusChanged {
            shape: id,
            radius: to,
        }
    }

    /// Simulates vertex edits that leave the polygon with `path`.
    pub fn edit_path(&self, id: ShapeId, path: Vec<Coordinate>) -> ShapeEvent {
        if let Some(DrawnShape::Polygon { vertices, .. }) = self.record.borrow_mut().shapes.get_mut(&id) {
            *vertices = path;
        }
        ShapeEvent::PathChanged { shape: id }
    }

    /// Simulates the drawing tool completing a polygon overlay.
    pub fn finish_drawing(&mut self, vertices: Vec<Coordinate>) -> ShapeEvent {
        let id = self.insert(DrawnShape::Polygon {
            vertices: vertices.clone(),
            editable: true,
        });
        ShapeEvent::PolygonCompleted {
            shape: id,
            vertices,
        }
    }
}

impl MapSurface for RecordingMapSurface {
    fn draw_circle(&mut self, center: Coordinate, radius: f64, style: &ShapeStyle) -> ShapeId {
        let id = self.insert(DrawnShape::Circle {
            center,
            radius,
            editable: style.editable,
        });
        tracing::trace!(shape = %id, radius, "Drew circle");
        id
    }

    fn draw_polygon(&mut self, vertices: &[Coordinate], style: &ShapeStyle) -> ShapeId {
        let id = self.insert(DrawnShape::Polygon {
            vertices: vertices.to_vec(),
            editable: style.editable,
        });
        tracing::trace!(shape = %id, vertices = vertices.len(), "Drew polygon");
        id
    }

    fn remove_shape(&mut self, shape: ShapeId) {
        let mut record = self.record.borrow_mut();
        record.shapes.remove(&shape);
        record.listeners.remove(&shape);
    }

    fn attach_edit_listeners(&mut self, shape: ShapeId) {
        *self.record.borrow_mut().listeners.entry(shape).or_insert(0) += 1;
    }

    fn polygon_path(&self, shape: ShapeId) -> Vec<Coordinate> {
        match self.record.borrow().shapes.get(&shape) {
            Some(DrawnShape::Polygon { vertices, .. }) => vertices.clone(),
            _ => Vec::new(),
        }
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.record.borrow_mut().viewport = Some(Viewport::Fitted(bounds));
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.record.borrow_mut().viewport = Some(Viewport::Centered { center, zoom });
    }

    fn set_drawing_mode(&mut self, enabled: bool) {
        self.record.borrow_mut().drawing_mode = enabled;
    }

    fn screen_to_geographic(&self, point: ScreenPoint) -> Option<Coordinate> {
        let coordinate = Coordinate::new(
            self.origin.latitude - point.y * self.scale,
            self.origin.longitude + point.x * self.scale,
        );
        let in_range = (-90.0..=90.0).contains(&coordinate.latitude)
            && (-180.0..=180.0).contains(&coordinate.longitude);
        in_range.then_some(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_record() {
        let mut surface = RecordingMapSurface::default();
        let observer = surface.clone();
        let id = surface.draw_circle(Coordinate::new(1.0, 1.0), 10.0, &ShapeStyle::editable());
        assert_eq!(observer.shape_count(), 1);

        surface.remove_shape(id);
        assert_eq!(observer.shape_count(), 0);
        assert_eq!(observer.drawn_total(), 1);
    }

    #[test]
    fn test_remove_drops_listeners() {
        let mut surface = RecordingMapSurface::default();
        let id = surface.draw_polygon(&[Coordinate::default(); 3], &ShapeStyle::editable());
        surface.attach_edit_listeners(id);
        assert_eq!(surface.listener_count(id), 1);
        surface.remove_shape(id);
        assert_eq!(surface.listener_count(id), 0);
    }

    #[test]
    fn test_screen_projection() {
        let surface = RecordingMapSurface::new(Coordinate::new(10.0, 20.0), 0.5);
        assert_eq!(
            surface.screen_to_geographic(ScreenPoint { x: 2.0, y: 4.0 }),
            Some(Coordinate::new(8.0, 21.0))
        );
        assert_eq!(
            surface.screen_to_geographic(ScreenPoint { x: 0.0, y: -400.0 }),
            None
        );
    }

    #[test]
    fn test_simulated_edits_update_shapes() {
        let mut surface = RecordingMapSurface::default();
        let id = surface.draw_circle(Coordinate::new(1.0, 1.0), 10.0, &ShapeStyle::editable());
        surface.drag_radius(id, 25.0);
        assert!(matches!(
            surface.shape(id),
            Some(DrawnShape::Circle { radius, .. }) if radius == 25.0
        ));
    }
}
