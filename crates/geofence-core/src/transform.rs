//! Screen ⇄ geographic coordinate transform
//!
//! A linear offset-and-scale mapping around a fixed reference point, not a
//! map projection. Pixel offsets from the surface centre are multiplied by
//! `scale` (degrees per pixel); the vertical axis is inverted so that
//! moving up the screen increases latitude.

use crate::{FenceError, GeoPoint, PixelPoint, Result};
use serde::{Deserialize, Serialize};

/// Default reference point (New Delhi)
pub const DEFAULT_REFERENCE_LAT: f64 = 28.6139;
pub const DEFAULT_REFERENCE_LNG: f64 = 77.2090;

/// Default scale in degrees per pixel
pub const DEFAULT_SCALE: f64 = 0.0001;

/// Size of the interactive display surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBounds {
    pub width: f64,
    pub height: f64,
}

impl SurfaceBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A surface that has not been laid out yet has no usable area
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    fn check(&self) -> Result<()> {
        if self.is_degenerate() {
            return Err(FenceError::DegenerateSurface {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Map a surface pixel to a geographic point.
pub fn to_geo(
    pixel: PixelPoint,
    bounds: SurfaceBounds,
    reference: GeoPoint,
    scale: f64,
) -> Result<GeoPoint> {
    bounds.check()?;
    check_scale(scale)?;

    let center = bounds.center();
    let lat = reference.lat + (center.y - pixel.y) * scale;
    let lng = reference.lng + (pixel.x - center.x) * scale;

    GeoPoint::new(lat, lng).map_err(|_| {
        FenceError::InvalidCoordinates(format!(
            "pixel ({:.1}, {:.1}) maps outside the globe: lat={:.6} lng={:.6}",
            pixel.x, pixel.y, lat, lng
        ))
    })
}

/// Inverse of [`to_geo`].
pub fn to_pixel(
    geo: GeoPoint,
    bounds: SurfaceBounds,
    reference: GeoPoint,
    scale: f64,
) -> Result<PixelPoint> {
    bounds.check()?;
    check_scale(scale)?;

    let center = bounds.center();
    let x = (geo.lng - reference.lng) / scale + center.x;
    let y = center.y - (geo.lat - reference.lat) / scale;

    Ok(PixelPoint::new(x, y))
}

fn check_scale(scale: f64) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(FenceError::InvalidScale(scale))
    }
}

/// Fixed reference point and scale shared by drawing and rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenTransform {
    reference: GeoPoint,
    scale: f64,
}

impl ScreenTransform {
    pub fn new(reference: GeoPoint, scale: f64) -> Result<Self> {
        check_scale(scale)?;
        Ok(Self { reference, scale })
    }

    pub fn to_geo(&self, pixel: PixelPoint, bounds: SurfaceBounds) -> Result<GeoPoint> {
        to_geo(pixel, bounds, self.reference, self.scale)
    }

    pub fn to_pixel(&self, geo: GeoPoint, bounds: SurfaceBounds) -> Result<PixelPoint> {
        to_pixel(geo, bounds, self.reference, self.scale)
    }
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self {
            reference: GeoPoint {
                lat: DEFAULT_REFERENCE_LAT,
                lng: DEFAULT_REFERENCE_LNG,
            },
            scale: DEFAULT_SCALE,
        }
    }
}
