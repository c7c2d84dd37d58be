//! One open geofence editor: form, drawn shape and place search.
//!
//! Closing the session (through a [`SessionCloser`] or by dropping it)
//! cancels pending searches, makes late store responses a no-op and
//! removes the drawn shape from the map.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{
    Coordinate, Geofence, GeofenceType, GeometryPatch, PlaceSearchResult, ScreenPoint, ShapeEvent,
};
use crate::services::form::{FormError, GeofenceForm};
use crate::services::geojson::from_search_result;
use crate::services::map_surface::MapSurface;
use crate::services::place_search::{DebouncedSearch, PlaceSearch, SearchOutcome};
use crate::services::shape_sync::{ShapeSynchronizer, SyncState};
use crate::services::store::{GeofenceStore, StoreError};

/// Cloneable handle that closes an editing session from elsewhere.
///
/// The shape is removed by the session itself, on its next call or when
/// it is dropped; every editing call on a closed session is a no-op.
#[derive(Debug, Clone)]
pub struct SessionCloser(CancellationToken);

impl SessionCloser {
    pub fn close(&self) {
        self.0.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Result of an async operation that may finish after the session closed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome<T> {
    Applied(T),
    /// The session closed first; nothing was applied.
    Discarded,
}

impl<T> SessionOutcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            SessionOutcome::Applied(value) => Some(value),
            SessionOutcome::Discarded => None,
        }
    }
}

pub struct EditingSession<M: MapSurface> {
    form: GeofenceForm,
    shapes: ShapeSynchronizer<M>,
    search: DebouncedSearch,
    store: Arc<dyn GeofenceStore>,
    token: CancellationToken,
}

impl<M: MapSurface> EditingSession<M> {
    /// Session for a new geofence under `campus_id`.
    pub fn create(
        campus_id: Uuid,
        surface: M,
        store: Arc<dyn GeofenceStore>,
        places: Arc<dyn PlaceSearch>,
        debounce: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        Self {
            form: GeofenceForm::new(campus_id),
            shapes: ShapeSynchronizer::new(surface),
            search: DebouncedSearch::with_parent(places, debounce, token.clone()),
            store,
            token,
        }
    }

    /// Session editing an existing geofence; its shape is drawn right away.
    pub fn edit(
        geofence: &Geofence,
        surface: M,
        store: Arc<dyn GeofenceStore>,
        places: Arc<dyn PlaceSearch>,
        debounce: Duration,
    ) -> Self {
        let mut session = Self::create(geofence.campus_id, surface, store, places, debounce);
        session.form = GeofenceForm::edit(geofence);
        session.shapes.set_geometry(&geofence.geometry);
        session
    }

    /// Radius given to circles placed before any radius was chosen.
    pub fn with_default_radius(mut self, radius: f64) -> Self {
        self.shapes.set_default_radius(radius);
        self
    }

    pub fn closer(&self) -> SessionCloser {
        SessionCloser(self.token.clone())
    }

    /// Closes the session and removes its shape right away.
    pub fn close(&mut self) {
        self.token.cancel();
        self.shapes.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn form(&self) -> &GeofenceForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut GeofenceForm {
        &mut self.form
    }

    pub fn shapes(&self) -> &ShapeSynchronizer<M> {
        &self.shapes
    }

    /// True once closed. Disposes a shape still left by a remote close.
    fn closed(&mut self) -> bool {
        if !self.token.is_cancelled() {
            return false;
        }
        if self.shapes.state() != &SyncState::Idle {
            tracing::debug!("Removing shape of closed session");
            self.shapes.clear();
        }
        true
    }

    fn apply(&mut self, patch: Option<GeometryPatch>) -> Option<GeometryPatch> {
        let patch = patch?;
        self.form.apply_patch(patch.clone());
        Some(patch)
    }

    /// Forwards a surface edit event and applies the resulting patch.
    pub fn on_user_edit(&mut self, event: ShapeEvent) -> Option<GeometryPatch> {
        if self.closed() {
            return None;
        }
        let patch = self.shapes.on_user_edit(event);
        self.apply(patch)
    }

    pub fn on_map_click(&mut self, point: Coordinate) -> Option<GeometryPatch> {
        if self.closed() {
            return None;
        }
        let patch = self.shapes.on_map_click(point);
        self.apply(patch)
    }

    pub fn on_screen_click(&mut self, point: ScreenPoint) -> Option<GeometryPatch> {
        if self.closed() {
            return None;
        }
        let patch = self.shapes.on_screen_click(point);
        self.apply(patch)
    }

    pub fn start_drawing(&mut self) {
        if self.closed() {
            return;
        }
        self.form.set_type(GeofenceType::Polygon);
        self.shapes.start_drawing();
    }

    pub fn stop_drawing(&mut self) {
        if self.closed() {
            return;
        }
        self.shapes.stop_drawing();
    }

    pub fn set_type(&mut self, kind: GeofenceType) -> Option<GeometryPatch> {
        if self.closed() {
            return None;
        }
        self.form.set_type(kind);
        let patch = self.shapes.set_type(kind);
        self.apply(patch)
    }

    /// Removes the shape and empties the form's geometry. The form of a
    /// closed session is left as it was.
    pub fn clear(&mut self) -> GeometryPatch {
        if self.closed() {
            return GeometryPatch::Cleared;
        }
        let patch = self.shapes.clear();
        self.form.apply_patch(patch.clone());
        patch
    }

    /// Debounced place search. Results arriving after close are discarded.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let outcome = self.search.search(query).await;
        if self.is_closed() {
            return SearchOutcome::Discarded;
        }
        outcome
    }

    /// Imports a search result as the geofence geometry and redraws it.
    ///
    /// A result without a usable boundary becomes a circle with the
    /// current radius.
    pub fn import_place(&mut self, result: &PlaceSearchResult) -> Option<GeometryPatch> {
        if self.closed() {
            return None;
        }
        let radius = self.form.radius().unwrap_or_else(|| self.shapes.last_radius());
        let patch = from_search_result(result, radius);
        if let Some(geometry) = patch.clone().into_geometry() {
            self.shapes.set_geometry(&geometry);
        }
        self.apply(Some(patch))
    }

    /// Validates and saves the draft.
    ///
    /// Returns [`SessionOutcome::Discarded`] when the session closes before
    /// the store answers; the form is then left as it was.
    pub async fn submit(&mut self) -> Result<SessionOutcome<Geofence>, FormError> {
        if self.closed() {
            return Ok(SessionOutcome::Discarded);
        }

        let request = self.form.validate_for_submit()?;
        let result = tokio::select! {
            _ = self.token.cancelled() => None,
            result = request.send(self.store.as_ref()) => Some(result),
        };

        let Some(result) = result.filter(|_| !self.is_closed()) else {
            tracing::debug!("Discarding submit result for closed session");
            return Ok(SessionOutcome::Discarded);
        };

        match result {
            Ok(geofence) => {
                tracing::info!(geofence_id = %geofence.id, "Geofence saved");
                self.form.on_saved(&geofence);
                Ok(SessionOutcome::Applied(geofence))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Geofence save failed");
                self.form.on_save_failed(&e);
                Err(e.into())
            }
        }
    }

    /// Geofences of the session's campus, for refreshing the list view.
    pub async fn refresh(&self) -> Result<SessionOutcome<Vec<Geofence>>, StoreError> {
        let campus_id = self.form.campus_id();
        let result = tokio::select! {
            _ = self.token.cancelled() => return Ok(SessionOutcome::Discarded),
            result = self.store.list(Some(campus_id)) => result,
        };
        if self.is_closed() {
            return Ok(SessionOutcome::Discarded);
        }
        result.map(SessionOutcome::Applied)
    }

    /// Deletes the geofence being edited. A new draft has nothing to delete.
    pub async fn delete(&mut self) -> Result<SessionOutcome<()>, StoreError> {
        let Some(id) = self.form.geofence_id() else {
            return Ok(SessionOutcome::Discarded);
        };
        if self.is_closed() {
            return Ok(SessionOutcome::Discarded);
        }

        let result = tokio::select! {
            _ = self.token.cancelled() => return Ok(SessionOutcome::Discarded),
            result = self.store.delete(id) => result,
        };
        if self.is_closed() {
            return Ok(SessionOutcome::Discarded);
        }
        result?;
        self.close();
        Ok(SessionOutcome::Applied(()))
    }
}

impl<M: MapSurface> Drop for EditingSession<M> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
