//! Geo-fence Authoring Core
//!
//! Screen/geographic coordinate transform, polygon drafting and an
//! in-memory registry of named polygonal zones for the tourist-safety
//! operations dashboard.
//!
//! # Data Flow
//!
//! ```text
//! pointer click ─► ScreenTransform::to_geo ─► PolygonBuilder::add_vertex
//!                                                   │ finish + commit
//!                                                   ▼
//!                 render::svg_path ◄─ ScreenTransform::to_pixel ◄─ FenceRegistry
//! ```
//!
//! Everything here is synchronous and single-owner: the registry and the
//! builder are plain values mutated through `&mut self`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod builder;
pub mod fence;
pub mod registry;
pub mod render;
pub mod transform;

pub use builder::{BuilderState, FenceMetadata, PolygonBuilder};
pub use fence::{
    Boundary, Fence, FenceCategory, FenceId, FenceStatus, NewFence, TimeWindow,
};
pub use registry::{FenceRegistry, FenceStats};
pub use transform::{ScreenTransform, SurfaceBounds};

/// Minimum vertex count for a closed fence boundary
pub const MIN_BOUNDARY_POINTS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("too few points: need at least {required}, have {actual}")]
    TooFewPoints { required: usize, actual: usize },
    #[error("fence name cannot be empty")]
    EmptyName,
    #[error("latitude out of range [-90, 90]: {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude out of range [-180, 180]: {0}")]
    LongitudeOutOfRange(f64),
    #[error("time window must cover at least one weekday")]
    EmptyTimeWindow,
    #[error("no restriction at index {0}")]
    RestrictionIndex(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FenceError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("fence not found: {0}")]
    NotFound(FenceId),
    #[error("display surface is degenerate: {width}x{height}")]
    DegenerateSurface { width: f64, height: f64 },
    #[error("scale must be positive and finite: {0}")]
    InvalidScale(f64),
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: BuilderState,
    },
}

pub type Result<T> = std::result::Result<T, FenceError>;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Create a point, rejecting out-of-range or non-finite coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat).into());
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::LongitudeOutOfRange(lng).into());
        }
        Ok(Self { lat, lng })
    }

    /// GeoJSON position order: `[lng, lat]`
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Position on the display surface; origin top-left, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
