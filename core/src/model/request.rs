use crate::model::site::{Coordinate, DetectionMode};
use crate::prelude::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis window: an hour count (`"24"`) or a free label (`"Last Month"`).
/// Always sent as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeRange {
    Hours(u32),
    Label(String),
}

impl TimeRange {
    /// Number of hours the range covers, used for chart time labels.
    pub fn hours(&self) -> u32 {
        match self {
            TimeRange::Hours(hours) => *hours,
            TimeRange::Label(label) => match label.to_ascii_lowercase().as_str() {
                "last day" | "last 24 hours" => 24,
                "last week" => 24 * 7,
                "last month" => 24 * 30,
                "last year" => 24 * 365,
                _ => 24,
            },
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Hours(24)
    }
}

impl From<String> for TimeRange {
    fn from(value: String) -> Self {
        match value.trim().parse::<u32>() {
            Ok(hours) => TimeRange::Hours(hours),
            Err(_) => TimeRange::Label(value),
        }
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Hours(hours) => write!(f, "{}", hours),
            TimeRange::Label(label) => f.write_str(label),
        }
    }
}

/// Detection parameters read from the control panel at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub mode: DetectionMode,
    pub sensitivity: f64,
    pub time_range: TimeRange,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            mode: DetectionMode::Deforestation,
            sensitivity: 0.7,
            time_range: TimeRange::default(),
        }
    }
}

/// A validated, open polygon ring (closing point removed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct PolygonRing(Vec<Coordinate>);

impl PolygonRing {
    /// Normalizes and validates a drawn ring. A trailing point equal to the
    /// first one is dropped before counting.
    pub fn new(mut points: Vec<Coordinate>) -> Result<Self, GeometryError> {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        let distinct = points
            .iter()
            .enumerate()
            .filter(|(index, point)| !points[..*index].contains(point))
            .count();
        if distinct < 3 {
            return Err(GeometryError::TooFewPoints(distinct));
        }
        if let Some((index, coordinate)) = points
            .iter()
            .enumerate()
            .find(|(_, point)| !point.is_valid())
        {
            return Err(GeometryError::OutOfRange {
                index,
                coordinate: *coordinate,
            });
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.0
    }

    /// Vertex average; good enough to anchor mock detections near the area.
    pub fn centroid(&self) -> Coordinate {
        let count = self.0.len() as f64;
        let (lat, lng) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(lat, lng), point| (lat + point.lat, lng + point.lng));
        Coordinate::new(lat / count, lng / count)
    }
}

impl TryFrom<Vec<Coordinate>> for PolygonRing {
    type Error = GeometryError;

    fn try_from(points: Vec<Coordinate>) -> Result<Self, Self::Error> {
        PolygonRing::new(points)
    }
}

impl From<PolygonRing> for Vec<Coordinate> {
    fn from(ring: PolygonRing) -> Self {
        ring.0
    }
}

/// Body of `POST /api/analyze-area`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub coordinates: PolygonRing,
    pub detection_mode: DetectionMode,
    pub time_range: TimeRange,
    pub sensitivity: f64,
}

impl AnalysisRequest {
    pub fn new(ring: PolygonRing, settings: &AnalysisSettings) -> Self {
        Self {
            coordinates: ring,
            detection_mode: settings.mode,
            time_range: settings.time_range.clone(),
            sensitivity: settings.sensitivity.clamp(0.0, 1.0),
        }
    }
}

/// An image queued for `POST /api/detect-deforestation`.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        let lower = self.file_name.to_ascii_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".tif") || lower.ends_with(".tiff") {
            "image/tiff"
        } else {
            "image/jpeg"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[[f64; 2]]) -> Vec<Coordinate> {
        points.iter().copied().map(Coordinate::from).collect()
    }

    #[test]
    fn two_point_ring_is_rejected() {
        let err = PolygonRing::new(ring(&[[10.0, 10.0], [10.0, 11.0]])).unwrap_err();
        assert_eq!(err, GeometryError::TooFewPoints(2));
    }

    #[test]
    fn three_point_ring_is_accepted() {
        let ring = PolygonRing::new(ring(&[[10.0, 10.0], [10.0, 11.0], [11.0, 11.0]])).unwrap();
        assert_eq!(ring.points().len(), 3);
    }

    #[test]
    fn repeated_vertices_do_not_count_twice() {
        let ring = ring(&[[10.0, 10.0], [10.0, 11.0], [10.0, 11.0], [10.0, 10.0], [10.0, 11.0]]);
        assert_eq!(
            PolygonRing::new(ring).unwrap_err(),
            GeometryError::TooFewPoints(2)
        );
    }

    #[test]
    fn closing_point_is_dropped_before_counting() {
        let closed = ring(&[[10.0, 10.0], [10.0, 11.0], [10.0, 10.0]]);
        assert_eq!(
            PolygonRing::new(closed).unwrap_err(),
            GeometryError::TooFewPoints(2)
        );

        let closed = ring(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]);
        assert_eq!(PolygonRing::new(closed).unwrap().points().len(), 3);
    }

    #[test]
    fn out_of_range_point_is_reported() {
        let err = PolygonRing::new(ring(&[[0.0, 0.0], [95.0, 1.0], [1.0, 1.0]])).unwrap_err();
        assert!(matches!(err, GeometryError::OutOfRange { index: 1, .. }));
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let ring = PolygonRing::new(ring(&[[10.0, 10.0], [10.0, 11.0], [11.0, 11.0]])).unwrap();
        let settings = AnalysisSettings {
            mode: DetectionMode::Deforestation,
            sensitivity: 0.7,
            time_range: TimeRange::Hours(24),
        };
        let value = serde_json::to_value(AnalysisRequest::new(ring, &settings)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "coordinates": [[10.0, 10.0], [10.0, 11.0], [11.0, 11.0]],
                "detectionMode": "deforestation",
                "timeRange": "24",
                "sensitivity": 0.7
            })
        );
    }

    #[test]
    fn deserializing_a_short_ring_fails() {
        let json = r#"{"coordinates":[[1.0,1.0],[2.0,2.0]],"detectionMode":"water",
            "timeRange":"24","sensitivity":0.5}"#;
        assert!(serde_json::from_str::<AnalysisRequest>(json).is_err());
    }

    #[test]
    fn time_range_labels_map_to_hours() {
        assert_eq!(TimeRange::from("168".to_string()).hours(), 168);
        assert_eq!(TimeRange::from("Last Month".to_string()).hours(), 720);
        assert_eq!(TimeRange::from("whenever".to_string()).hours(), 24);
    }

    #[test]
    fn centroid_averages_vertices() {
        let ring = PolygonRing::new(ring(&[[0.0, 0.0], [0.0, 3.0], [3.0, 0.0]])).unwrap();
        assert_eq!(ring.centroid(), Coordinate::new(1.0, 1.0));
    }
}
