//! Render-ready views of the registry and the current draft
//!
//! Pixel paths are re-derived from geographic coordinates through the
//! inverse transform on every call; nothing here is cached.

use crate::builder::PolygonBuilder;
use crate::transform::ScreenTransform;
use crate::{Fence, FenceId, GeoPoint, PixelPoint, Result, SurfaceBounds};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write;

pub const FILL_OPACITY: f64 = 0.2;
pub const STROKE_WIDTH: f64 = 2.0;
pub const DRAFT_COLOR: &str = "#3B82F6";
pub const DRAFT_DASH: &str = "5,5";
pub const MARKER_RADIUS: f64 = 4.0;

/// SVG path through `points`: `M x,y L x,y … Z`. Empty input gives an empty path.
pub fn svg_path(
    points: &[GeoPoint],
    transform: &ScreenTransform,
    bounds: SurfaceBounds,
) -> Result<String> {
    path_data(points, transform, bounds, true)
}

fn path_data(
    points: &[GeoPoint],
    transform: &ScreenTransform,
    bounds: SurfaceBounds,
    closed: bool,
) -> Result<String> {
    let mut d = String::new();
    for (i, point) in points.iter().enumerate() {
        let px = transform.to_pixel(*point, bounds)?;
        let cmd = if i == 0 { "M" } else { " L" };
        // Writing to a String cannot fail
        let _ = write!(d, "{} {:.2},{:.2}", cmd, tidy(px.x), tidy(px.y));
    }
    if closed && !d.is_empty() {
        d.push_str(" Z");
    }
    Ok(d)
}

/// One visible fence, ready to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFence {
    pub id: FenceId,
    pub name: String,
    pub category: &'static str,
    pub color: &'static str,
    /// Badge classes for the fence list
    pub badge_class: &'static str,
    pub fill_opacity: f64,
    pub stroke_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
    pub path: String,
    /// Label position (first vertex)
    pub label_anchor: PixelPoint,
}

/// Visible fences in registry order.
pub fn render_fences(
    fences: &[Fence],
    transform: &ScreenTransform,
    bounds: SurfaceBounds,
) -> Result<Vec<RenderedFence>> {
    fences
        .iter()
        .filter(|f| f.visible)
        .map(|f| {
            let style = f.category.style();
            let first = f.boundary.points()[0];
            Ok(RenderedFence {
                id: f.id,
                name: f.name.clone(),
                category: style.label,
                color: style.color,
                badge_class: style.badge_class,
                fill_opacity: FILL_OPACITY,
                stroke_width: STROKE_WIDTH,
                dash: style.dash,
                path: svg_path(f.boundary.points(), transform, bounds)?,
                label_anchor: transform.to_pixel(first, bounds)?,
            })
        })
        .collect()
}

/// In-progress draft: vertex markers plus an open dashed polyline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftOverlay {
    pub markers: Vec<PixelPoint>,
    /// Empty until the draft has two vertices
    pub path: String,
}

pub fn render_draft(builder: &PolygonBuilder, bounds: SurfaceBounds) -> Result<DraftOverlay> {
    let markers = builder.draft_pixels(bounds)?;
    let path = if builder.vertex_count() > 1 {
        path_data(builder.vertices(), builder.transform(), bounds, false)?
    } else {
        String::new()
    };
    Ok(DraftOverlay { markers, path })
}

/// Standalone SVG document with fence outlines, labels and the draft overlay.
pub fn svg_document(
    fences: &[RenderedFence],
    draft: Option<&DraftOverlay>,
    bounds: SurfaceBounds,
) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = bounds.width,
        h = bounds.height
    );

    for f in fences {
        let dash = f.dash.unwrap_or("none");
        let _ = writeln!(
            svg,
            r#"  <g id="fence-{}"><path d="{}" fill="{}" fill-opacity="{}" stroke="{}" stroke-width="{}" stroke-dasharray="{}"/><text x="{:.2}" y="{:.2}" fill="{}" font-size="12" font-weight="bold" text-anchor="middle">{}</text></g>"#,
            f.id,
            f.path,
            f.color,
            f.fill_opacity,
            f.color,
            f.stroke_width,
            dash,
            tidy(f.label_anchor.x),
            tidy(f.label_anchor.y),
            f.color,
            escape_xml(&f.name)
        );
    }

    if let Some(draft) = draft {
        for m in &draft.markers {
            let _ = writeln!(
                svg,
                r#"  <circle cx="{:.2}" cy="{:.2}" r="{}" fill="{}" stroke="white" stroke-width="2"/>"#,
                tidy(m.x),
                tidy(m.y),
                MARKER_RADIUS,
                DRAFT_COLOR
            );
        }
        if !draft.path.is_empty() {
            let _ = writeln!(
                svg,
                r#"  <path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-dasharray="{}"/>"#,
                draft.path, DRAFT_COLOR, STROKE_WIDTH, DRAFT_DASH
            );
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Round to path precision, folding `-0.00` into `0.00`
fn tidy(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Export fences as a GeoJSON FeatureCollection of closed polygons.
pub fn to_geojson(fences: &[Fence]) -> FeatureCollection {
    let features = fences
        .iter()
        .map(|f| {
            let ring: Vec<Vec<f64>> = f
                .boundary
                .closed_ring()
                .into_iter()
                .map(GeoPoint::to_position)
                .collect();

            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), json!(f.name));
            properties.insert("description".to_string(), json!(f.description));
            properties.insert("status".to_string(), json!(f.status));
            properties.insert("category".to_string(), json!(f.category.label()));
            properties.insert("color".to_string(), json!(f.color()));
            properties.insert("restrictions".to_string(), json!(f.restrictions));
            properties.insert("time_window".to_string(), json!(f.time_window));
            properties.insert("visible".to_string(), json!(f.visible));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: Some(Id::String(f.id.to_string())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Boundary, FenceCategory, FenceRegistry, NewFence};

    fn surface() -> SurfaceBounds {
        SurfaceBounds::new(100.0, 100.0)
    }

    fn triangle_from_pixels(t: &ScreenTransform) -> Boundary {
        let points = [(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)]
            .iter()
            .map(|(x, y)| t.to_geo(PixelPoint::new(*x, *y), surface()).unwrap())
            .collect();
        Boundary::new(points).unwrap()
    }

    #[test]
    fn test_svg_path_closed() {
        let t = ScreenTransform::default();
        let boundary = triangle_from_pixels(&t);
        let d = svg_path(boundary.points(), &t, surface()).unwrap();
        assert_eq!(d, "M 0.00,0.00 L 10.00,0.00 L 5.00,10.00 Z");
    }

    #[test]
    fn test_svg_path_empty() {
        let t = ScreenTransform::default();
        assert_eq!(svg_path(&[], &t, surface()).unwrap(), "");
    }

    #[test]
    fn test_render_skips_hidden_and_styles_by_category() {
        let t = ScreenTransform::default();
        let mut registry = FenceRegistry::new();
        let hidden = registry
            .add(NewFence::new("Hidden", triangle_from_pixels(&t)))
            .unwrap();
        registry
            .add(
                NewFence::new("Market <North>", triangle_from_pixels(&t))
                    .with_category(FenceCategory::WarningZone),
            )
            .unwrap();
        registry.set_visibility(hidden, false).unwrap();

        let rendered = render_fences(registry.list(), &t, surface()).unwrap();
        assert_eq!(rendered.len(), 1);
        let r = &rendered[0];
        assert_eq!(r.color, "#D97706");
        assert_eq!(r.dash, Some("5,5"));
        assert_eq!(r.category, "Warning Zone");
        assert_eq!(r.badge_class, "bg-yellow-100 text-yellow-800");
        assert!((r.label_anchor.x - 0.0).abs() < 1e-6);

        let svg = svg_document(&rendered, None, surface());
        assert!(svg.contains("Market &lt;North&gt;"));
        assert!(!svg.contains("Hidden"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_render_degenerate_surface() {
        let t = ScreenTransform::default();
        let mut registry = FenceRegistry::new();
        registry
            .add(NewFence::new("Zone", triangle_from_pixels(&t)))
            .unwrap();
        assert!(render_fences(registry.list(), &t, SurfaceBounds::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_draft_overlay_is_open() {
        let mut builder = PolygonBuilder::default();
        builder.add_vertex(PixelPoint::new(0.0, 0.0), surface()).unwrap();
        let overlay = render_draft(&builder, surface()).unwrap();
        assert_eq!(overlay.markers.len(), 1);
        assert!(overlay.path.is_empty());

        builder.add_vertex(PixelPoint::new(20.0, 0.0), surface()).unwrap();
        let overlay = render_draft(&builder, surface()).unwrap();
        assert_eq!(overlay.path, "M 0.00,0.00 L 20.00,0.00");
    }

    #[test]
    fn test_geojson_ring_is_closed_lng_lat() {
        let t = ScreenTransform::default();
        let mut registry = FenceRegistry::new();
        registry
            .add(NewFence::new("Zone", triangle_from_pixels(&t)).with_restrictions(["No vendors"]))
            .unwrap();

        let fc = to_geojson(registry.list());
        assert_eq!(fc.features.len(), 1);

        let json = serde_json::to_value(&fc).unwrap();
        let ring = &json["features"][0]["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().unwrap().len(), 4);
        assert_eq!(ring[0], ring[3]);
        assert!((ring[0][0].as_f64().unwrap() - 77.2040).abs() < 1e-9);
        assert!((ring[0][1].as_f64().unwrap() - 28.6189).abs() < 1e-9);
        assert_eq!(json["features"][0]["properties"]["category"], "Restricted");
        assert_eq!(json["features"][0]["properties"]["restrictions"][0], "No vendors");
    }
}
