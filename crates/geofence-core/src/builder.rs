//! Polygon drafting state machine
//!
//! ```text
//!            add_vertex            finish (≥3)             commit (name)
//!   Idle ───────────────► Drawing ─────────────► AwaitingMetadata ─────────► Committed
//!    ▲                     │  ▲ add_vertex                                      │
//!    │                     └──┘                                                 │
//!    └──────────────────────── clear (from any state) ◄─────────────────────────┘
//! ```
//!
//! Committed behaves like Idle for the next `add_vertex`: a fresh draft starts.
//! Failed transitions leave the builder exactly as it was.

use crate::transform::ScreenTransform;
use crate::{
    Boundary, FenceCategory, FenceError, FenceId, FenceRegistry, GeoPoint, NewFence, PixelPoint,
    Result, SurfaceBounds, TimeWindow, ValidationError, MIN_BOUNDARY_POINTS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuilderState {
    /// No draft in progress
    Idle,
    /// Collecting vertices
    Drawing,
    /// Polygon closed; waiting for name and other metadata
    AwaitingMetadata,
    /// Last draft was committed to the registry
    Committed,
}

/// User-supplied fence attributes collected after the polygon is closed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FenceMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: FenceCategory,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
}

impl FenceMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append an empty restriction slot for the form to fill in
    pub fn add_restriction(&mut self) {
        self.restrictions.push(String::new());
    }

    pub fn update_restriction(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        let slot = self
            .restrictions
            .get_mut(index)
            .ok_or(ValidationError::RestrictionIndex(index))?;
        *slot = text.into();
        Ok(())
    }

    pub fn remove_restriction(&mut self, index: usize) -> Result<String> {
        if index >= self.restrictions.len() {
            return Err(ValidationError::RestrictionIndex(index).into());
        }
        Ok(self.restrictions.remove(index))
    }
}

#[derive(Debug, Clone)]
pub struct PolygonBuilder {
    transform: ScreenTransform,
    state: BuilderState,
    vertices: Vec<GeoPoint>,
    metadata: FenceMetadata,
}

impl PolygonBuilder {
    pub fn new(transform: ScreenTransform) -> Self {
        Self {
            transform,
            state: BuilderState::Idle,
            vertices: Vec::new(),
            metadata: FenceMetadata::default(),
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn transform(&self) -> &ScreenTransform {
        &self.transform
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the finish affordance should be enabled
    pub fn can_finish(&self) -> bool {
        self.state == BuilderState::Drawing && self.vertices.len() >= MIN_BOUNDARY_POINTS
    }

    /// Map a pointer position to geographic coordinates and append it.
    pub fn add_vertex(&mut self, pixel: PixelPoint, bounds: SurfaceBounds) -> Result<GeoPoint> {
        self.ensure_accepting_vertices()?;
        let point = self.transform.to_geo(pixel, bounds)?;
        self.push_vertex(point);
        Ok(point)
    }

    /// Append an already-geographic vertex.
    pub fn add_point(&mut self, point: GeoPoint) -> Result<()> {
        self.ensure_accepting_vertices()?;
        let point = GeoPoint::new(point.lat, point.lng)?;
        self.push_vertex(point);
        Ok(())
    }

    fn ensure_accepting_vertices(&self) -> Result<()> {
        if self.state == BuilderState::AwaitingMetadata {
            return Err(FenceError::InvalidTransition {
                action: "add vertex",
                state: self.state,
            });
        }
        Ok(())
    }

    fn push_vertex(&mut self, point: GeoPoint) {
        if self.state != BuilderState::Drawing {
            self.vertices.clear();
            self.metadata = FenceMetadata::default();
            self.state = BuilderState::Drawing;
        }
        self.vertices.push(point);
        debug!("Vertex {} at {}", self.vertices.len(), point);
    }

    /// Close the polygon and move on to metadata entry.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            BuilderState::AwaitingMetadata => Ok(()),
            BuilderState::Drawing if self.vertices.len() >= MIN_BOUNDARY_POINTS => {
                self.state = BuilderState::AwaitingMetadata;
                debug!("Draft closed with {} vertices", self.vertices.len());
                Ok(())
            }
            BuilderState::Drawing => Err(ValidationError::TooFewPoints {
                required: MIN_BOUNDARY_POINTS,
                actual: self.vertices.len(),
            }
            .into()),
            BuilderState::Idle | BuilderState::Committed => Err(ValidationError::TooFewPoints {
                required: MIN_BOUNDARY_POINTS,
                actual: 0,
            }
            .into()),
        }
    }

    pub fn metadata(&self) -> &FenceMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> Result<&mut FenceMetadata> {
        self.ensure_awaiting("edit metadata")?;
        Ok(&mut self.metadata)
    }

    pub fn set_metadata(&mut self, metadata: FenceMetadata) -> Result<()> {
        *self.metadata_mut()? = metadata;
        Ok(())
    }

    /// Assemble the fence from the draft and hand it to the registry.
    ///
    /// An empty name is rejected and the draft stays in AwaitingMetadata.
    pub fn commit(&mut self, registry: &mut FenceRegistry) -> Result<FenceId> {
        self.ensure_awaiting("commit")?;
        if self.metadata.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let boundary = Boundary::new(self.vertices.clone())?;
        let metadata = self.metadata.clone();
        let mut fence = NewFence::new(metadata.name, boundary)
            .with_description(metadata.description)
            .with_category(metadata.category)
            .with_restrictions(metadata.restrictions);
        fence.time_window = metadata.time_window;

        let id = registry.add(fence)?;

        self.vertices.clear();
        self.metadata = FenceMetadata::default();
        self.state = BuilderState::Committed;
        info!("Draft committed as fence {}", id);
        Ok(id)
    }

    /// Discard the draft and any pending metadata.
    pub fn clear(&mut self) {
        if self.state != BuilderState::Idle || !self.vertices.is_empty() {
            debug!("Draft cleared ({} vertices discarded)", self.vertices.len());
        }
        self.vertices.clear();
        self.metadata = FenceMetadata::default();
        self.state = BuilderState::Idle;
    }

    /// Draft vertices in surface coordinates, for vertex markers
    pub fn draft_pixels(&self, bounds: SurfaceBounds) -> Result<Vec<PixelPoint>> {
        self.vertices
            .iter()
            .map(|p| self.transform.to_pixel(*p, bounds))
            .collect()
    }

    fn ensure_awaiting(&self, action: &'static str) -> Result<()> {
        if self.state != BuilderState::AwaitingMetadata {
            return Err(FenceError::InvalidTransition {
                action,
                state: self.state,
            });
        }
        Ok(())
    }
}

impl Default for PolygonBuilder {
    fn default() -> Self {
        Self::new(ScreenTransform::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FenceStatus;

    fn surface() -> SurfaceBounds {
        SurfaceBounds::new(100.0, 100.0)
    }

    fn click(builder: &mut PolygonBuilder, x: f64, y: f64) {
        builder.add_vertex(PixelPoint::new(x, y), surface()).unwrap();
    }

    fn drawn_triangle() -> PolygonBuilder {
        let mut builder = PolygonBuilder::default();
        click(&mut builder, 0.0, 0.0);
        click(&mut builder, 10.0, 0.0);
        click(&mut builder, 5.0, 10.0);
        builder
    }

    #[test]
    fn test_first_vertex_starts_drawing() {
        let mut builder = PolygonBuilder::default();
        assert_eq!(builder.state(), BuilderState::Idle);
        click(&mut builder, 50.0, 50.0);
        assert_eq!(builder.state(), BuilderState::Drawing);
        assert_eq!(builder.vertex_count(), 1);
    }

    #[test]
    fn test_commit_scenario() {
        let mut registry = FenceRegistry::new();
        let mut builder = drawn_triangle();
        assert!(builder.can_finish());

        builder.finish().unwrap();
        assert_eq!(builder.state(), BuilderState::AwaitingMetadata);

        builder.metadata_mut().unwrap().name = "Test Zone".to_string();
        let id = builder.commit(&mut registry).unwrap();

        assert_eq!(builder.state(), BuilderState::Committed);
        assert_eq!(builder.vertex_count(), 0);

        let fence = registry.get(id).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(fence.name, "Test Zone");
        assert_eq!(fence.status, FenceStatus::Active);
        assert_eq!(fence.category, FenceCategory::Restricted);
        assert_eq!(fence.boundary.len(), 3);
        assert!(fence.visible);
        assert!(fence.restrictions.is_empty());
        assert!((fence.boundary.points()[0].lat - 28.6189).abs() < 1e-9);
        assert!((fence.boundary.points()[0].lng - 77.2040).abs() < 1e-9);
    }

    #[test]
    fn test_finish_with_too_few_points() {
        let mut builder = PolygonBuilder::default();
        click(&mut builder, 0.0, 0.0);
        click(&mut builder, 10.0, 0.0);
        assert!(!builder.can_finish());

        let err = builder.finish().unwrap_err();
        assert_eq!(
            err,
            FenceError::Validation(ValidationError::TooFewPoints { required: 3, actual: 2 })
        );
        assert_eq!(builder.state(), BuilderState::Drawing);
        assert_eq!(builder.vertex_count(), 2);
    }

    #[test]
    fn test_finish_from_idle() {
        let mut builder = PolygonBuilder::default();
        assert!(builder.finish().is_err());
        assert_eq!(builder.state(), BuilderState::Idle);
    }

    #[test]
    fn test_commit_with_empty_name_keeps_draft() {
        let mut registry = FenceRegistry::new();
        let mut builder = drawn_triangle();
        builder.finish().unwrap();
        builder.metadata_mut().unwrap().name = "   ".to_string();

        let err = builder.commit(&mut registry).unwrap_err();
        assert_eq!(err, FenceError::Validation(ValidationError::EmptyName));
        assert_eq!(builder.state(), BuilderState::AwaitingMetadata);
        assert_eq!(builder.vertex_count(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_commit_requires_awaiting_metadata() {
        let mut registry = FenceRegistry::new();
        let mut builder = drawn_triangle();
        assert!(matches!(
            builder.commit(&mut registry),
            Err(FenceError::InvalidTransition { state: BuilderState::Drawing, .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_vertices_rejected_while_awaiting_metadata() {
        let mut builder = drawn_triangle();
        builder.finish().unwrap();
        assert!(builder
            .add_vertex(PixelPoint::new(1.0, 1.0), surface())
            .is_err());
        assert_eq!(builder.vertex_count(), 3);
        assert_eq!(builder.state(), BuilderState::AwaitingMetadata);
    }

    #[test]
    fn test_degenerate_surface_leaves_state() {
        let mut builder = PolygonBuilder::default();
        let err = builder
            .add_vertex(PixelPoint::new(1.0, 1.0), SurfaceBounds::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, FenceError::DegenerateSurface { .. }));
        assert_eq!(builder.state(), BuilderState::Idle);
        assert_eq!(builder.vertex_count(), 0);
    }

    #[test]
    fn test_clear_from_any_state() {
        let mut builder = drawn_triangle();
        builder.finish().unwrap();
        builder.metadata_mut().unwrap().name = "Draft".to_string();

        builder.clear();
        assert_eq!(builder.state(), BuilderState::Idle);
        assert_eq!(builder.vertex_count(), 0);
        assert_eq!(builder.metadata(), &FenceMetadata::default());

        builder.clear();
        assert_eq!(builder.state(), BuilderState::Idle);
    }

    #[test]
    fn test_coincident_points_accepted() {
        let mut registry = FenceRegistry::new();
        let mut builder = PolygonBuilder::default();
        for _ in 0..3 {
            click(&mut builder, 20.0, 20.0);
        }
        builder.finish().unwrap();
        builder.set_metadata(FenceMetadata::named("Dot")).unwrap();
        let id = builder.commit(&mut registry).unwrap();
        assert_eq!(registry.get(id).unwrap().boundary.len(), 3);
    }

    #[test]
    fn test_committed_then_new_draft() {
        let mut registry = FenceRegistry::new();
        let mut builder = drawn_triangle();
        builder.finish().unwrap();
        builder.set_metadata(FenceMetadata::named("First")).unwrap();
        builder.commit(&mut registry).unwrap();

        click(&mut builder, 30.0, 30.0);
        assert_eq!(builder.state(), BuilderState::Drawing);
        assert_eq!(builder.vertex_count(), 1);
    }

    #[test]
    fn test_restriction_editing() {
        let mut registry = FenceRegistry::new();
        let mut builder = drawn_triangle();
        builder.finish().unwrap();

        let meta = builder.metadata_mut().unwrap();
        meta.name = "Red Fort Restricted Area".to_string();
        meta.add_restriction();
        meta.add_restriction();
        meta.add_restriction();
        meta.update_restriction(0, "No access after 6 PM").unwrap();
        meta.update_restriction(2, "No drones").unwrap();
        assert!(meta.update_restriction(5, "x").is_err());
        assert_eq!(meta.remove_restriction(2).unwrap(), "No drones");
        assert!(meta.remove_restriction(7).is_err());

        let id = builder.commit(&mut registry).unwrap();
        // the untouched blank slot is dropped
        assert_eq!(
            registry.get(id).unwrap().restrictions,
            vec!["No access after 6 PM"]
        );
    }

    #[test]
    fn test_draft_pixels_round_trip() {
        let builder = drawn_triangle();
        let pixels = builder.draft_pixels(surface()).unwrap();
        let expected = [(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)];
        for (p, (x, y)) in pixels.iter().zip(expected) {
            assert!((p.x - x).abs() < 1e-6);
            assert!((p.y - y).abs() < 1e-6);
        }
    }
}
