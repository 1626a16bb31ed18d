use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic point, carried on the wire as a `[lat, lng]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coordinate: Coordinate) -> Self {
        [coordinate.lat, coordinate.lng]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Categorical severity bucket of a detection site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low];

    /// Parses a wire label. Unknown labels fall back to `Low`, matching the
    /// color fallback of [`risk_color`](crate::render::style::risk_color).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => RiskLevel::High,
            "medium" => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        RiskLevel::from_label(&label)
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit in which `DetectionSite::area_size` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaUnit {
    Hectares,
    SquareKilometres,
}

impl AreaUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            AreaUnit::Hectares => "hectares",
            AreaUnit::SquareKilometres => "km²",
        }
    }
}

/// What kind of environmental change an analysis looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    #[default]
    Deforestation,
    Water,
    Biodiversity,
    Carbon,
}

impl DetectionMode {
    pub const ALL: [DetectionMode; 4] = [
        DetectionMode::Deforestation,
        DetectionMode::Water,
        DetectionMode::Biodiversity,
        DetectionMode::Carbon,
    ];

    pub fn area_unit(&self) -> AreaUnit {
        match self {
            DetectionMode::Water => AreaUnit::Hectares,
            _ => AreaUnit::SquareKilometres,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::Deforestation => "deforestation",
            DetectionMode::Water => "water",
            DetectionMode::Biodiversity => "biodiversity",
            DetectionMode::Carbon => "carbon",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DetectionMode::Deforestation => "Deforestation",
            DetectionMode::Water => "Water Body",
            DetectionMode::Biodiversity => "Biodiversity",
            DetectionMode::Carbon => "Carbon",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One flagged location of an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSite {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub coordinates: Coordinate,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    #[serde(rename = "size")]
    pub area_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegetation_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl DetectionSite {
    pub fn new(
        id: impl Into<String>,
        coordinates: Coordinate,
        confidence: f64,
        risk_level: RiskLevel,
        area_size: f64,
    ) -> Self {
        Self {
            id: id.into(),
            coordinates,
            confidence,
            risk_level,
            area_size,
            vegetation_density: None,
            water_quality: None,
            depth: None,
            volume: None,
            kind: None,
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_round_trips_as_pair() {
        let json = serde_json::to_string(&Coordinate::new(10.0, 11.5)).unwrap();
        assert_eq!(json, "[10.0,11.5]");
    }

    #[test]
    fn coordinate_range_checks() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn risk_level_parses_case_insensitively_with_low_fallback() {
        assert_eq!(RiskLevel::from_label("High"), RiskLevel::High);
        assert_eq!(RiskLevel::from_label("medium"), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_label("severe"), RiskLevel::Low);
    }

    #[test]
    fn site_optional_fields_stay_absent() {
        let json = r#"{"coordinates":[1.0,2.0],"riskLevel":"high","confidence":0.9,
            "size":3.5,"type":"Clear-cut","description":"x"}"#;
        let site: DetectionSite = serde_json::from_str(json).unwrap();
        assert_eq!(site.risk_level, RiskLevel::High);
        assert_eq!(site.area_size, 3.5);
        assert_eq!(site.vegetation_density, None);
        assert_eq!(site.water_quality, None);
        assert_eq!(site.kind.as_deref(), Some("Clear-cut"));
        assert!(site.id.is_empty());
    }

    #[test]
    fn water_mode_uses_hectares() {
        assert_eq!(DetectionMode::Water.area_unit(), AreaUnit::Hectares);
        assert_eq!(
            DetectionMode::Carbon.area_unit(),
            AreaUnit::SquareKilometres
        );
    }
}
