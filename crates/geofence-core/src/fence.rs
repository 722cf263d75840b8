//! Fence data model
//!
//! A fence is a named, closed polygon tagged with a category, free-text
//! restrictions and an optional weekly time window.

use crate::{FenceError, GeoPoint, Result, ValidationError, MIN_BOUNDARY_POINTS};
use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque fence identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FenceId(Uuid);

impl FenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Zone category; drives colour, badge and stroke style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum FenceCategory {
    #[default]
    Restricted = 0,
    SafeZone = 1,
    WarningZone = 2,
    EmergencyZone = 3,
}

/// Display attributes for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    pub category: FenceCategory,
    pub label: &'static str,
    /// Stroke and fill colour
    pub color: &'static str,
    /// Badge classes for list views
    pub badge_class: &'static str,
    /// SVG `stroke-dasharray`; `None` draws a solid outline
    pub dash: Option<&'static str>,
}

/// Indexed by `FenceCategory as usize`
const CATEGORY_STYLES: [CategoryStyle; 4] = [
    CategoryStyle {
        category: FenceCategory::Restricted,
        label: "Restricted",
        color: "#DC2626",
        badge_class: "bg-red-100 text-red-800",
        dash: None,
    },
    CategoryStyle {
        category: FenceCategory::SafeZone,
        label: "Safe Zone",
        color: "#16A34A",
        badge_class: "bg-green-100 text-green-800",
        dash: None,
    },
    CategoryStyle {
        category: FenceCategory::WarningZone,
        label: "Warning Zone",
        color: "#D97706",
        badge_class: "bg-yellow-100 text-yellow-800",
        dash: Some("5,5"),
    },
    CategoryStyle {
        category: FenceCategory::EmergencyZone,
        label: "Emergency Zone",
        color: "#2563EB",
        badge_class: "bg-blue-100 text-blue-800",
        dash: None,
    },
];

impl FenceCategory {
    pub const ALL: [FenceCategory; 4] = [
        FenceCategory::Restricted,
        FenceCategory::SafeZone,
        FenceCategory::WarningZone,
        FenceCategory::EmergencyZone,
    ];

    pub fn style(self) -> &'static CategoryStyle {
        &CATEGORY_STYLES[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.style().label
    }

    pub fn color(self) -> &'static str {
        self.style().color
    }

    pub fn badge_class(self) -> &'static str {
        self.style().badge_class
    }

    pub fn dash(self) -> Option<&'static str> {
        self.style().dash
    }
}

impl fmt::Display for FenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FenceStatus {
    #[default]
    Active,
    Inactive,
}

/// Weekly time window during which a fence's restrictions apply.
///
/// When `start > end` the window runs past midnight into the next day;
/// `days` names the day on which the window opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub days: Vec<Weekday>,
}

impl TimeWindow {
    pub fn new(
        start: NaiveTime,
        end: NaiveTime,
        days: impl IntoIterator<Item = Weekday>,
    ) -> Result<Self> {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();

        let window = Self { start, end, days };
        window.validate()?;
        Ok(window)
    }

    /// 00:00–23:59, every day
    pub fn always() -> Self {
        Self {
            start: NaiveTime::default(),
            end: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default(),
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.days.is_empty() {
            return Err(ValidationError::EmptyTimeWindow.into());
        }
        Ok(())
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether a local timestamp falls inside the window (minute resolution).
    pub fn is_active_at(&self, at: NaiveDateTime) -> bool {
        let t = (at.hour(), at.minute());
        let start = (self.start.hour(), self.start.minute());
        let end = (self.end.hour(), self.end.minute());
        let day = at.weekday();

        if !self.wraps_midnight() {
            return self.days.contains(&day) && start <= t && t <= end;
        }

        (t >= start && self.days.contains(&day)) || (t <= end && self.days.contains(&day.pred()))
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::always()
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// Closed polygon boundary with at least three vertices.
///
/// The last vertex implicitly connects back to the first; the closing point
/// is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")]
pub struct Boundary(Vec<GeoPoint>);

impl Boundary {
    pub fn new(points: Vec<GeoPoint>) -> Result<Self> {
        if points.len() < MIN_BOUNDARY_POINTS {
            return Err(ValidationError::TooFewPoints {
                required: MIN_BOUNDARY_POINTS,
                actual: points.len(),
            }
            .into());
        }
        for p in &points {
            GeoPoint::new(p.lat, p.lng)?;
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Vertices with the first repeated at the end (GeoJSON linear ring)
    pub fn closed_ring(&self) -> Vec<GeoPoint> {
        let mut ring = self.0.clone();
        if let Some(first) = self.0.first() {
            ring.push(*first);
        }
        ring
    }
}

impl TryFrom<Vec<GeoPoint>> for Boundary {
    type Error = FenceError;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Boundary> for Vec<GeoPoint> {
    fn from(boundary: Boundary) -> Self {
        boundary.0
    }
}

/// Fence contents without registry-assigned identity or timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFence {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: FenceStatus,
    #[serde(default)]
    pub category: FenceCategory,
    pub boundary: Boundary,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl NewFence {
    /// Active, visible, Restricted fence with no restrictions
    pub fn new(name: impl Into<String>, boundary: Boundary) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: FenceStatus::Active,
            category: FenceCategory::default(),
            boundary,
            restrictions: Vec::new(),
            time_window: None,
            visible: true,
        }
    }

    pub fn with_category(mut self, category: FenceCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_restrictions<I, S>(mut self, restrictions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.restrictions = restrictions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(window) = &self.time_window {
            window.validate()?;
        }
        Ok(())
    }

    /// Trim the name and restrictions, dropping blank restriction entries.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.restrictions = self
            .restrictions
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fence {
    pub id: FenceId,
    pub name: String,
    pub description: String,
    pub status: FenceStatus,
    pub category: FenceCategory,
    pub boundary: Boundary,
    pub restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Fence {
    pub(crate) fn from_new(id: FenceId, new: NewFence, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            status: new.status,
            category: new.category,
            boundary: new.boundary,
            restrictions: new.restrictions,
            time_window: new.time_window,
            visible: new.visible,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn color(&self) -> &'static str {
        self.category.color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn triangle() -> Boundary {
        Boundary::new(vec![pt(28.61, 77.20), pt(28.62, 77.20), pt(28.62, 77.21)]).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_style_table_is_aligned() {
        for category in FenceCategory::ALL {
            assert_eq!(category.style().category, category);
        }
        assert_eq!(FenceCategory::Restricted.color(), "#DC2626");
        assert_eq!(FenceCategory::SafeZone.label(), "Safe Zone");
        assert_eq!(FenceCategory::WarningZone.dash(), Some("5,5"));
        assert_eq!(FenceCategory::EmergencyZone.badge_class(), "bg-blue-100 text-blue-800");
    }

    #[test]
    fn test_boundary_needs_three_points() {
        let err = Boundary::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)]).unwrap_err();
        assert_eq!(
            err,
            FenceError::Validation(ValidationError::TooFewPoints { required: 3, actual: 2 })
        );
    }

    #[test]
    fn test_boundary_allows_coincident_points() {
        let b = Boundary::new(vec![pt(1.0, 1.0), pt(1.0, 1.0), pt(1.0, 1.0)]).unwrap();
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn test_closed_ring_repeats_first() {
        let ring = triangle().closed_ring();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_boundary_deserialize_validates() {
        let too_short = r#"[{"lat": 1.0, "lng": 1.0}]"#;
        assert!(serde_json::from_str::<Boundary>(too_short).is_err());

        let out_of_range =
            r#"[{"lat": 91.0, "lng": 1.0}, {"lat": 1.0, "lng": 1.0}, {"lat": 2.0, "lng": 1.0}]"#;
        assert!(serde_json::from_str::<Boundary>(out_of_range).is_err());
    }

    #[test]
    fn test_new_fence_normalized_drops_blank_restrictions() {
        let fence = NewFence::new("  Red Fort  ", triangle())
            .with_restrictions(["No drones", "   ", "", " After 6 PM "])
            .normalized();
        assert_eq!(fence.name, "Red Fort");
        assert_eq!(fence.restrictions, vec!["No drones", "After 6 PM"]);
    }

    #[test]
    fn test_new_fence_rejects_blank_name() {
        let fence = NewFence::new("   ", triangle());
        assert_eq!(
            fence.validate(),
            Err(FenceError::Validation(ValidationError::EmptyName))
        );
    }

    #[test]
    fn test_time_window_rejects_no_days() {
        let err = TimeWindow::new(hm(9, 0), hm(17, 0), []).unwrap_err();
        assert_eq!(err, FenceError::Validation(ValidationError::EmptyTimeWindow));
    }

    #[test]
    fn test_time_window_daytime() {
        let w = TimeWindow::new(hm(9, 0), hm(18, 0), [Weekday::Sat, Weekday::Sun]).unwrap();
        // 2024-06-01 is a Saturday
        assert!(w.is_active_at(at(2024, 6, 1, 9, 0)));
        assert!(w.is_active_at(at(2024, 6, 1, 18, 0)));
        assert!(!w.is_active_at(at(2024, 6, 1, 18, 1)));
        assert!(!w.is_active_at(at(2024, 6, 3, 12, 0)));
    }

    #[test]
    fn test_time_window_overnight() {
        let w = TimeWindow::new(hm(18, 0), hm(6, 0), [Weekday::Fri]).unwrap();
        assert!(w.wraps_midnight());
        // Friday evening and early Saturday belong to Friday's window
        assert!(w.is_active_at(at(2024, 5, 31, 22, 30)));
        assert!(w.is_active_at(at(2024, 6, 1, 5, 59)));
        assert!(!w.is_active_at(at(2024, 6, 1, 22, 30)));
        assert!(!w.is_active_at(at(2024, 5, 31, 5, 0)));
    }

    #[test]
    fn test_always_covers_every_day() {
        let w = TimeWindow::always();
        assert_eq!(w.days.len(), 7);
        assert!(w.is_active_at(at(2024, 6, 4, 23, 59)));
        assert!(w.is_active_at(at(2024, 6, 4, 0, 0)));
    }

    #[test]
    fn test_time_window_serializes_as_hh_mm() {
        let w = TimeWindow::new(hm(6, 30), hm(18, 0), [Weekday::Mon]).unwrap();
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["start"], "06:30");
        assert_eq!(json["end"], "18:00");

        let raw = r#"{"start": "22:00", "end": "05:00:00", "days": ["Mon", "Tuesday"]}"#;
        let parsed: TimeWindow = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.end, hm(5, 0));
        assert_eq!(parsed.days, vec![Weekday::Mon, Weekday::Tue]);
    }
}
