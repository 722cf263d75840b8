//! Authoring configuration
//!
//! Reference point, scale and default surface size. Values come from the
//! environment and can be overridden on the command line; anything unset
//! or unparsable falls back to the defaults.

use geofence_core::transform::{DEFAULT_REFERENCE_LAT, DEFAULT_REFERENCE_LNG, DEFAULT_SCALE};
use geofence_core::{GeoPoint, ScreenTransform, SurfaceBounds};
use std::str::FromStr;

pub const ENV_REF_LAT: &str = "GEOFENCE_REF_LAT";
pub const ENV_REF_LON: &str = "GEOFENCE_REF_LON";
pub const ENV_SCALE: &str = "GEOFENCE_SCALE";
pub const ENV_SURFACE_WIDTH: &str = "GEOFENCE_SURFACE_WIDTH";
pub const ENV_SURFACE_HEIGHT: &str = "GEOFENCE_SURFACE_HEIGHT";

pub const DEFAULT_SURFACE_WIDTH: f64 = 800.0;
pub const DEFAULT_SURFACE_HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorConfig {
    pub ref_lat: f64,
    pub ref_lon: f64,
    /// Degrees per pixel
    pub scale: f64,
    pub surface_width: f64,
    pub surface_height: f64,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            ref_lat: DEFAULT_REFERENCE_LAT,
            ref_lon: DEFAULT_REFERENCE_LNG,
            scale: DEFAULT_SCALE,
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
        }
    }
}

impl AuthorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str, default: f64| parse_or(lookup(key), default);

        Self {
            ref_lat: get(ENV_REF_LAT, defaults.ref_lat),
            ref_lon: get(ENV_REF_LON, defaults.ref_lon),
            scale: get(ENV_SCALE, defaults.scale),
            surface_width: get(ENV_SURFACE_WIDTH, defaults.surface_width),
            surface_height: get(ENV_SURFACE_HEIGHT, defaults.surface_height),
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        ref_lat: Option<f64>,
        ref_lon: Option<f64>,
        scale: Option<f64>,
    ) -> Self {
        if let Some(lat) = ref_lat {
            self.ref_lat = lat;
        }
        if let Some(lon) = ref_lon {
            self.ref_lon = lon;
        }
        if let Some(scale) = scale {
            self.scale = scale;
        }
        self
    }

    pub fn transform(&self) -> geofence_core::Result<ScreenTransform> {
        let reference = GeoPoint::new(self.ref_lat, self.ref_lon)?;
        ScreenTransform::new(reference, self.scale)
    }

    pub fn surface(&self) -> SurfaceBounds {
        SurfaceBounds::new(self.surface_width, self.surface_height)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
