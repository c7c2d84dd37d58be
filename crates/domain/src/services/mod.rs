//! Domain services for the geofence editor.
//!
//! Services contain the editing logic that operates on domain models.

pub mod form;
pub mod geojson;
pub mod map_surface;
pub mod place_search;
pub mod session;
pub mod shape_sync;
pub mod store;

pub use form::{Banner, FormError, GeofenceForm, SubmitRequest};
pub use self::geojson::{
    export_collection, export_geofence, from_feature, from_search_result, to_feature,
    to_feature_collection, ExportDocument, ExportError,
};
pub use map_surface::{MapSurface, RecordingMapSurface, Viewport};
pub use place_search::{
    DebouncedSearch, MockPlaceSearch, PlaceSearch, PlaceSearchError, SearchOutcome,
    DEFAULT_DEBOUNCE,
};
pub use session::{EditingSession, SessionCloser, SessionOutcome};
pub use shape_sync::{EditMode, ShapeSynchronizer, SyncState, DEFAULT_RADIUS_METERS, DEFAULT_ZOOM};
pub use store::{GeofenceStore, StoreError};
