//! Keeps the one drawn shape of an editing session in step with the
//! geofence geometry.
//!
//! Model to view goes through [`ShapeSynchronizer::set_geometry`]; view to
//! model only ever goes out as a [`GeometryPatch`]. At most one shape is
//! alive at a time and the previous one is always removed before a new one
//! is drawn. Dropping the synchronizer removes its shape.

use tracing::debug;

use crate::models::{
    bounding_box_center, Bounds, Coordinate, GeofenceGeometry, GeofenceType, GeometryPatch,
    ScreenPoint, ShapeEvent, ShapeId, ShapeStyle,
};
use crate::services::map_surface::MapSurface;

/// Radius used for a new circle when none was set before.
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// Zoom level used to frame circles.
pub const DEFAULT_ZOOM: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Editable,
    /// Shapes are drawn without handles or listeners and every input is ignored.
    ReadOnly,
}

/// Synchronizer state. The two drawing states are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    /// No shape drawn.
    Idle,
    DrawingRadius {
        shape: ShapeId,
        center: Coordinate,
        radius: f64,
    },
    /// `shape` is `None` while the polygon is still awaiting vertices.
    DrawingPolygon {
        shape: Option<ShapeId>,
        vertices: Vec<Coordinate>,
        freehand: bool,
    },
}

impl SyncState {
    pub fn shape(&self) -> Option<ShapeId> {
        match self {
            SyncState::Idle => None,
            SyncState::DrawingRadius { shape, .. } => Some(*shape),
            SyncState::DrawingPolygon { shape, .. } => *shape,
        }
    }

    pub fn kind(&self) -> Option<GeofenceType> {
        match self {
            SyncState::Idle => None,
            SyncState::DrawingRadius { .. } => Some(GeofenceType::Radius),
            SyncState::DrawingPolygon { .. } => Some(GeofenceType::Polygon),
        }
    }

    fn is_freehand(&self) -> bool {
        matches!(self, SyncState::DrawingPolygon { freehand: true, .. })
    }
}

/// Owns the drawn shape of one editing session.
pub struct ShapeSynchronizer<S: MapSurface> {
    surface: S,
    mode: EditMode,
    state: SyncState,
    /// Selected geofence type; decides what a click on an empty map does.
    kind: GeofenceType,
    last_radius: f64,
    last_center: Option<Coordinate>,
}

impl<S: MapSurface> ShapeSynchronizer<S> {
    pub fn new(surface: S) -> Self {
        Self::with_mode(surface, EditMode::Editable)
    }

    /// Synchronizer for preview and detail views.
    pub fn read_only(surface: S) -> Self {
        Self::with_mode(surface, EditMode::ReadOnly)
    }

    fn with_mode(surface: S, mode: EditMode) -> Self {
        Self {
            surface,
            mode,
            state: SyncState::Idle,
            kind: GeofenceType::Radius,
            last_radius: DEFAULT_RADIUS_METERS,
            last_center: None,
        }
    }

    /// Overrides the radius given to circles created without a prior one.
    pub fn with_default_radius(mut self, radius: f64) -> Self {
        self.set_default_radius(radius);
        self
    }

    pub fn set_default_radius(&mut self, radius: f64) {
        self.last_radius = radius;
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.mode == EditMode::ReadOnly
    }

    pub fn kind(&self) -> GeofenceType {
        self.kind
    }

    pub fn active_shape(&self) -> Option<ShapeId> {
        self.state.shape()
    }

    pub fn last_radius(&self) -> f64 {
        self.last_radius
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn style(&self) -> ShapeStyle {
        match self.mode {
            EditMode::Editable => ShapeStyle::editable(),
            EditMode::ReadOnly => ShapeStyle::read_only(),
        }
    }

    /// Authoritative model to view write.
    ///
    /// Removes the current shape, draws one matching `geometry` and frames
    /// the viewport on it.
    pub fn set_geometry(&mut self, geometry: &GeofenceGeometry) {
        self.dispose();
        self.kind = geometry.kind();
        self.state = self.draw(geometry);
        self.frame(geometry);
        debug!(
            shape = ?self.state.shape(),
            kind = geometry.kind().as_str(),
            "Synchronized shape with geometry"
        );
    }

    /// View to model. Turns a surface event into a patch.
    ///
    /// Events from shapes that are no longer active are ignored.
    pub fn on_user_edit(&mut self, event: ShapeEvent) -> Option<GeometryPatch> {
        if self.is_read_only() {
            return None;
        }

        if let ShapeEvent::PolygonCompleted { shape, vertices } = event {
            return self.complete_polygon(shape, vertices);
        }

        if self.state.shape() != Some(event.shape()) {
            debug!(shape = %event.shape(), "Ignoring edit from inactive shape");
            return None;
        }

        match (&mut self.state, event) {
            (
                SyncState::DrawingRadius { center, radius, .. },
                ShapeEvent::CenterChanged {
                    center: new_center, ..
                },
            ) => {
                *center = new_center;
                self.last_center = Some(new_center);
                Some(GeometryPatch::Radius {
                    center: new_center,
                    radius: *radius,
                })
            }
            (
                SyncState::DrawingRadius { center, radius, .. },
                ShapeEvent::RadiusChanged {
                    radius: new_radius, ..
                },
            ) => {
                *radius = new_radius;
                self.last_radius = new_radius;
                Some(GeometryPatch::Radius {
                    center: *center,
                    radius: new_radius,
                })
            }
            (
                SyncState::DrawingPolygon {
                    shape: Some(id),
                    vertices,
                    ..
                },
                ShapeEvent::PathChanged { .. },
            ) => {
                let path = self.surface.polygon_path(*id);
                *vertices = path.clone();
                self.last_center = bounding_box_center(&path).or(self.last_center);
                Some(GeometryPatch::polygon(path))
            }
            _ => None,
        }
    }

    /// Relocates a circle to `point`, or places one when a radius geofence
    /// has no shape yet. Polygon geofences ignore map clicks.
    pub fn on_map_click(&mut self, point: Coordinate) -> Option<GeometryPatch> {
        if self.is_read_only() {
            return None;
        }

        let radius = match self.state {
            SyncState::DrawingRadius { radius, .. } => radius,
            SyncState::Idle if self.kind == GeofenceType::Radius => self.last_radius,
            _ => return None,
        };

        let geometry = GeofenceGeometry::radius(point, radius);
        self.dispose();
        self.state = self.draw(&geometry);
        Some(geometry.into())
    }

    /// Same as [`Self::on_map_click`] for a click in container pixels.
    pub fn on_screen_click(&mut self, point: ScreenPoint) -> Option<GeometryPatch> {
        let coordinate = self.surface.screen_to_geographic(point)?;
        self.on_map_click(coordinate)
    }

    /// Enables free-hand polygon drawing.
    ///
    /// A circle is removed first; an existing polygon stays until the new
    /// one is completed.
    pub fn start_drawing(&mut self) {
        if self.is_read_only() {
            return;
        }

        self.kind = GeofenceType::Polygon;
        match &mut self.state {
            SyncState::DrawingPolygon { freehand, .. } => *freehand = true,
            _ => {
                self.dispose();
                self.state = SyncState::DrawingPolygon {
                    shape: None,
                    vertices: Vec::new(),
                    freehand: true,
                };
            }
        }
        self.surface.set_drawing_mode(true);
    }

    pub fn stop_drawing(&mut self) {
        if let SyncState::DrawingPolygon { freehand, .. } = &mut self.state {
            if *freehand {
                *freehand = false;
                self.surface.set_drawing_mode(false);
            }
        }
    }

    /// Switches the geofence type while editing.
    ///
    /// Switching to radius redraws a circle at the last known center with
    /// the last radius. Switching to polygon leaves an empty polygon
    /// awaiting vertices. Returns `None` when the type is unchanged.
    pub fn set_type(&mut self, kind: GeofenceType) -> Option<GeometryPatch> {
        if self.is_read_only() {
            return None;
        }

        self.kind = kind;
        if self.state.kind() == Some(kind) {
            return None;
        }

        let center = self.current_center();
        self.dispose();

        match (kind, center) {
            (GeofenceType::Radius, Some(center)) => {
                let geometry = GeofenceGeometry::radius(center, self.last_radius);
                self.state = self.draw(&geometry);
                self.frame(&geometry);
                Some(geometry.into())
            }
            (GeofenceType::Radius, None) => Some(GeometryPatch::Cleared),
            (GeofenceType::Polygon, _) => {
                self.state = SyncState::DrawingPolygon {
                    shape: None,
                    vertices: Vec::new(),
                    freehand: false,
                };
                Some(GeometryPatch::Cleared)
            }
        }
    }

    /// Removes the shape and returns to [`SyncState::Idle`].
    pub fn clear(&mut self) -> GeometryPatch {
        self.dispose();
        GeometryPatch::Cleared
    }

    fn complete_polygon(&mut self, shape: ShapeId, vertices: Vec<Coordinate>) -> Option<GeometryPatch> {
        if !self.state.is_freehand() {
            debug!(shape = %shape, "Discarding polygon drawn outside drawing mode");
            self.surface.remove_shape(shape);
            return None;
        }

        self.dispose();
        self.surface.attach_edit_listeners(shape);
        self.last_center = bounding_box_center(&vertices).or(self.last_center);
        self.state = SyncState::DrawingPolygon {
            shape: Some(shape),
            vertices: vertices.clone(),
            freehand: false,
        };
        debug!(shape = %shape, vertices = vertices.len(), "Polygon drawing completed");
        Some(GeometryPatch::polygon(vertices))
    }

    fn current_center(&self) -> Option<Coordinate> {
        match &self.state {
            SyncState::DrawingRadius { center, .. } => Some(*center),
            SyncState::DrawingPolygon { vertices, .. } => {
                bounding_box_center(vertices).or(self.last_center)
            }
            SyncState::Idle => self.last_center,
        }
    }

    fn draw(&mut self, geometry: &GeofenceGeometry) -> SyncState {
        let style = self.style();
        let (shape, state) = match geometry {
            GeofenceGeometry::Radius { center, radius } => {
                let shape = self.surface.draw_circle(*center, *radius, &style);
                self.last_center = Some(*center);
                self.last_radius = *radius;
                (
                    shape,
                    SyncState::DrawingRadius {
                        shape,
                        center: *center,
                        radius: *radius,
                    },
                )
            }
            GeofenceGeometry::Polygon { center, polygon } => {
                let shape = self.surface.draw_polygon(polygon, &style);
                self.last_center = Some(*center);
                (
                    shape,
                    SyncState::DrawingPolygon {
                        shape: Some(shape),
                        vertices: polygon.clone(),
                        freehand: false,
                    },
                )
            }
        };

        if style.editable {
            self.surface.attach_edit_listeners(shape);
        }
        state
    }

    fn frame(&mut self, geometry: &GeofenceGeometry) {
        match geometry {
            GeofenceGeometry::Polygon { polygon, center } => match Bounds::from_vertices(polygon) {
                Some(bounds) => self.surface.fit_bounds(bounds),
                None => self.surface.set_view(*center, DEFAULT_ZOOM),
            },
            GeofenceGeometry::Radius { center, .. } => self.surface.set_view(*center, DEFAULT_ZOOM),
        }
    }

    fn dispose(&mut self) {
        let state = std::mem::replace(&mut self.state, SyncState::Idle);
        if state.is_freehand() {
            self.surface.set_drawing_mode(false);
        }
        if let Some(shape) = state.shape() {
            self.surface.remove_shape(shape);
        }
    }
}

impl<S: MapSurface> Drop for ShapeSynchronizer<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
