//! Draft state of the geofence editor and its submit flow.

use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{
    Coordinate, Geofence, GeofenceGeometry, GeofenceInput, GeofenceStatus, GeofenceType,
    GeofenceUpdate, GeometryPatch,
};
use crate::services::store::{GeofenceStore, StoreError};
use shared::validation::validate_required;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Transient message shown above the form until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

/// A validated write, ready to send to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    Create { campus_id: Uuid, input: GeofenceInput },
    Update { id: Uuid, update: GeofenceUpdate },
}

impl SubmitRequest {
    pub async fn send(self, store: &dyn GeofenceStore) -> Result<Geofence, StoreError> {
        match self {
            SubmitRequest::Create { campus_id, input } => store.create(campus_id, input).await,
            SubmitRequest::Update { id, update } => store.update(id, update).await,
        }
    }
}

/// Draft field state for creating or editing one geofence.
///
/// Geometry only changes through [`GeometryPatch`]es coming from the shape
/// synchronizer or a place import.
#[derive(Debug, Clone)]
pub struct GeofenceForm {
    campus_id: Uuid,
    geofence_id: Option<Uuid>,
    name: String,
    description: String,
    status: GeofenceStatus,
    kind: GeofenceType,
    geometry: Option<GeofenceGeometry>,
    errors: ValidationErrors,
    banner: Option<Banner>,
}

impl GeofenceForm {
    /// Empty form for a new radius geofence under `campus_id`.
    pub fn new(campus_id: Uuid) -> Self {
        Self {
            campus_id,
            geofence_id: None,
            name: String::new(),
            description: String::new(),
            status: GeofenceStatus::Active,
            kind: GeofenceType::Radius,
            geometry: None,
            errors: ValidationErrors::new(),
            banner: None,
        }
    }

    /// Form pre-filled from a persisted geofence.
    pub fn edit(geofence: &Geofence) -> Self {
        Self {
            geofence_id: Some(geofence.id),
            name: geofence.name.clone(),
            description: geofence.description.clone(),
            status: geofence.status,
            kind: geofence.kind(),
            geometry: Some(geofence.geometry.clone()),
            ..Self::new(geofence.campus_id)
        }
    }

    pub fn campus_id(&self) -> Uuid {
        self.campus_id
    }

    pub fn geofence_id(&self) -> Option<Uuid> {
        self.geofence_id
    }

    pub fn is_editing(&self) -> bool {
        self.geofence_id.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> GeofenceStatus {
        self.status
    }

    pub fn kind(&self) -> GeofenceType {
        self.kind
    }

    pub fn geometry(&self) -> Option<&GeofenceGeometry> {
        self.geometry.as_ref()
    }

    pub fn center(&self) -> Option<Coordinate> {
        self.geometry.as_ref().map(GeofenceGeometry::center)
    }

    pub fn radius(&self) -> Option<f64> {
        match self.geometry {
            Some(GeofenceGeometry::Radius { radius, .. }) => Some(radius),
            _ => None,
        }
    }

    pub fn polygon(&self) -> Option<&[Coordinate]> {
        match &self.geometry {
            Some(GeofenceGeometry::Polygon { polygon, .. }) => Some(polygon),
            _ => None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_status(&mut self, status: GeofenceStatus) {
        self.status = status;
    }

    /// Switches the active type. Geometry of the other type is dropped.
    pub fn set_type(&mut self, kind: GeofenceType) {
        self.kind = kind;
        if self.geometry.as_ref().is_some_and(|g| g.kind() != kind) {
            self.geometry = None;
        }
    }

    /// Applies a geometry patch; a patch of the other type switches the type.
    pub fn apply_patch(&mut self, patch: GeometryPatch) {
        if let Some(kind) = patch.kind() {
            self.kind = kind;
        }
        self.geometry = patch.into_geometry();
    }

    /// Field errors from the last submit attempt.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// First error message recorded for `field`.
    pub fn field_error(&self, field: &str) -> Option<String> {
        self.errors
            .field_errors()
            .get(field)
            .and_then(|errors| errors.first())
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Validated create payload, if the draft is complete.
    pub fn to_input(&self) -> Result<GeofenceInput, ValidationErrors> {
        self.validate()?;
        let geometry = self.geometry.clone().ok_or_else(ValidationErrors::new)?;
        Ok(GeofenceInput {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            geometry,
            status: self.status,
        })
    }

    /// Validates the draft and records field errors on failure.
    pub fn validate_for_submit(&mut self) -> Result<SubmitRequest, FormError> {
        let input = match self.to_input() {
            Ok(input) => input,
            Err(errors) => {
                tracing::debug!(
                    fields = ?errors.field_errors().keys().collect::<Vec<_>>(),
                    "Geofence form blocked by validation"
                );
                self.errors = errors.clone();
                return Err(FormError::Invalid(errors));
            }
        };

        self.errors = ValidationErrors::new();
        Ok(match self.geofence_id {
            Some(id) => SubmitRequest::Update {
                id,
                update: input.into(),
            },
            None => SubmitRequest::Create {
                campus_id: self.campus_id,
                input,
            },
        })
    }

    /// Records a successful save. Further submits update the saved geofence.
    pub fn on_saved(&mut self, geofence: &Geofence) {
        let message = if self.geofence_id.is_some() {
            format!("Geofence \"{}\" updated", geofence.name)
        } else {
            format!("Geofence \"{}\" created", geofence.name)
        };
        self.geofence_id = Some(geofence.id);
        self.banner = Some(Banner::Success(message));
    }

    /// Records a failed save. Draft fields are left untouched for a retry.
    pub fn on_save_failed(&mut self, error: &StoreError) {
        self.banner = Some(Banner::Error(error.to_string()));
    }

    /// Validates, writes to the store and records the outcome.
    ///
    /// Nothing reaches the store when validation fails.
    pub async fn submit(&mut self, store: &dyn GeofenceStore) -> Result<Geofence, FormError> {
        let request = self.validate_for_submit()?;
        match request.send(store).await {
            Ok(geofence) => {
                tracing::info!(geofence_id = %geofence.id, "Geofence saved");
                self.on_saved(&geofence);
                Ok(geofence)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Geofence save failed");
                self.on_save_failed(&e);
                Err(e.into())
            }
        }
    }
}

impl Validate for GeofenceForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_required(&self.name) {
            errors.add("name", e);
        }
        if let Err(e) = validate_required(&self.description) {
            errors.add("description", e);
        }

        match &self.geometry {
            Some(geometry) if geometry.kind() == self.kind => geometry.collect_errors(&mut errors),
            _ => {
                let mut err = ValidationError::new("geometry_required");
                err.message = Some(match self.kind {
                    GeofenceType::Radius => "Place a circle on the map".into(),
                    GeofenceType::Polygon => "Draw a polygon on the map".into(),
                });
                errors.add("geometry", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        saved: Mutex<Vec<(Uuid, GeofenceInput)>>,
        updates: Mutex<Vec<(Uuid, GeofenceUpdate)>>,
        fail: bool,
    }

    fn persisted(campus_id: Uuid, input: GeofenceInput) -> Geofence {
        Geofence {
            id: Uuid::new_v4(),
            campus_id,
            name: input.name,
            description: input.description,
            geometry: input.geometry,
            status: input.status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[async_trait::async_trait]
    impl GeofenceStore for FakeStore {
        async fn list(&self, _campus_id: Option<Uuid>) -> Result<Vec<Geofence>, StoreError> {
            Ok(Vec::new())
        }

        async fn get(&self, id: Uuid) -> Result<Geofence, StoreError> {
            Err(StoreError::NotFound(id))
        }

        async fn create(&self, campus_id: Uuid, input: GeofenceInput) -> Result<Geofence, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.saved.lock().unwrap().push((campus_id, input.clone()));
            Ok(persisted(campus_id, input))
        }

        async fn update(&self, id: Uuid, update: GeofenceUpdate) -> Result<Geofence, StoreError> {
            self.updates.lock().unwrap().push((id, update.clone()));
            let input = GeofenceInput {
                name: update.name.unwrap_or_default(),
                description: update.description.unwrap_or_default(),
                geometry: update
                    .geometry
                    .unwrap_or_else(|| GeofenceGeometry::radius(Coordinate::default(), 1.0)),
                status: update.status.unwrap_or_default(),
            };
            let mut geofence = persisted(Uuid::nil(), input);
            geofence.id = id;
            Ok(geofence)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn filled_form() -> GeofenceForm {
        let mut form = GeofenceForm::new(Uuid::new_v4());
        form.set_name("Main Gate");
        form.set_description("North entrance");
        form.apply_patch(GeometryPatch::Radius {
            center: Coordinate::new(25.7617, -80.1918),
            radius: 100.0,
        });
        form
    }

    #[test]
    fn test_new_form_defaults() {
        let form = GeofenceForm::new(Uuid::nil());
        assert_eq!(form.kind(), GeofenceType::Radius);
        assert_eq!(form.status(), GeofenceStatus::Active);
        assert!(form.geometry().is_none());
        assert!(!form.is_editing());
    }

    #[test]
    fn test_apply_patch_updates_fields() {
        let mut form = filled_form();
        form.apply_patch(GeometryPatch::Radius {
            center: Coordinate::new(25.7617, -80.1918),
            radius: 250.0,
        });
        assert_eq!(form.radius(), Some(250.0));

        let square = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 2.0),
            Coordinate::new(2.0, 2.0),
        ];
        form.apply_patch(GeometryPatch::polygon(square.clone()));
        assert_eq!(form.kind(), GeofenceType::Polygon);
        assert_eq!(form.polygon(), Some(square.as_slice()));
        assert_eq!(form.radius(), None);

        form.apply_patch(GeometryPatch::Cleared);
        assert_eq!(form.kind(), GeofenceType::Polygon);
        assert!(form.geometry().is_none());
    }

    #[test]
    fn test_set_type_drops_other_geometry() {
        let mut form = filled_form();
        form.set_type(GeofenceType::Radius);
        assert!(form.geometry().is_some());
        form.set_type(GeofenceType::Polygon);
        assert!(form.geometry().is_none());
    }

    #[test]
    fn test_validation_reports_each_field() {
        let mut form = GeofenceForm::new(Uuid::nil());
        let err = form.validate_for_submit().unwrap_err();
        let FormError::Invalid(errors) = err else {
            panic!("expected validation error");
        };
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("description"));
        assert_eq!(fields["geometry"][0].code, "geometry_required");
        assert_eq!(form.field_error("name").as_deref(), Some("This field is required"));
    }

    #[test]
    fn test_validation_radius_out_of_range() {
        let mut form = filled_form();
        form.apply_patch(GeometryPatch::Radius {
            center: Coordinate::new(25.7617, -80.1918),
            radius: 0.0,
        });
        assert!(form.validate_for_submit().is_err());
        assert_eq!(form.errors().field_errors()["radius"][0].code, "radius_range");
    }

    #[test]
    fn test_successful_validation_clears_errors() {
        let mut form = filled_form();
        form.set_name("");
        assert!(form.validate_for_submit().is_err());
        form.set_name("Main Gate");
        assert!(form.validate_for_submit().is_ok());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_submit_request_trims_text() {
        let mut form = filled_form();
        form.set_name("  Main Gate ");
        let request = form.validate_for_submit().unwrap();
        let SubmitRequest::Create { input, .. } = request else {
            panic!("expected create request");
        };
        assert_eq!(input.name, "Main Gate");
    }

    #[tokio::test]
    async fn test_submit_creates_then_updates() {
        let store = FakeStore::default();
        let mut form = filled_form();

        let created = form.submit(&store).await.unwrap();
        assert_eq!(form.geofence_id(), Some(created.id));
        assert_eq!(
            form.banner(),
            Some(&Banner::Success("Geofence \"Main Gate\" created".to_string()))
        );

        form.set_description("Main entrance");
        form.submit(&store).await.unwrap();
        let updates = store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, created.id);
        assert_eq!(updates[0].1.description.as_deref(), Some("Main entrance"));
    }

    #[tokio::test]
    async fn test_invalid_submit_never_reaches_store() {
        let store = FakeStore::default();
        let mut form = filled_form();
        form.set_name("");

        assert!(matches!(form.submit(&store).await, Err(FormError::Invalid(_))));
        assert!(store.saved.lock().unwrap().is_empty());
        assert!(form.banner().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_draft() {
        let store = FakeStore {
            fail: true,
            ..FakeStore::default()
        };
        let mut form = filled_form();

        let err = form.submit(&store).await.unwrap_err();
        assert!(matches!(err, FormError::Store(StoreError::Unavailable(_))));
        assert!(matches!(form.banner(), Some(Banner::Error(_))));
        assert_eq!(form.name(), "Main Gate");
        assert_eq!(form.radius(), Some(100.0));
        assert!(!form.is_editing());

        form.dismiss_banner();
        assert!(form.banner().is_none());
    }

    #[test]
    fn test_edit_prefills_from_geofence() {
        let input = filled_form().to_input().unwrap();
        let geofence = persisted(Uuid::new_v4(), input);
        let form = GeofenceForm::edit(&geofence);

        assert!(form.is_editing());
        assert_eq!(form.campus_id(), geofence.campus_id);
        assert_eq!(form.name(), "Main Gate");
        assert_eq!(form.geometry(), Some(&geofence.geometry));
    }
}
