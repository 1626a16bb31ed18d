use crate::model::{DetectionMode, DetectionSite, RiskLevel};
use std::fmt;

pub const HIGH_RISK_COLOR: &str = "#e74c3c";
pub const MEDIUM_RISK_COLOR: &str = "#f39c12";
pub const LOW_RISK_COLOR: &str = "#2ecc71";

/// Meters of impact-circle radius per unit of site area.
const CIRCLE_METERS_PER_UNIT: f64 = 100.0;

/// Color for a risk label; anything unrecognized gets the low-risk color.
pub fn risk_color(label: &str) -> &'static str {
    match label {
        "high" => HIGH_RISK_COLOR,
        "medium" => MEDIUM_RISK_COLOR,
        _ => LOW_RISK_COLOR,
    }
}

impl RiskLevel {
    pub fn color(&self) -> &'static str {
        risk_color(self.as_str())
    }

    /// `0xRRGGBB` components of [`RiskLevel::color`].
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = self.color().trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|part| u8::from_str_radix(part, 16).ok())
                .unwrap_or(0)
        };
        (channel(0..2), channel(2..4), channel(4..6))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub class_name: String,
    pub risk: RiskLevel,
    pub label: String,
}

impl MarkerIcon {
    pub fn for_site(site: &DetectionSite) -> Self {
        Self {
            class_name: format!("custom-marker {}-risk", site.risk_level),
            risk: site.risk_level,
            label: format!("{}%", confidence_percent(site.confidence)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImpactCircle {
    pub radius_m: f64,
    pub color: &'static str,
    pub fill_opacity: f32,
}

impl ImpactCircle {
    pub fn for_site(site: &DetectionSite) -> Self {
        Self {
            radius_m: site.area_size * CIRCLE_METERS_PER_UNIT,
            color: site.risk_level.color(),
            fill_opacity: 0.2,
        }
    }
}

/// Popup content: a title and labelled rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl Popup {
    pub fn for_site(site: &DetectionSite, mode: DetectionMode) -> Self {
        let title = format!("{} Detection", site.kind.as_deref().unwrap_or(mode.title()));
        let mut rows = vec![
            ("Risk Level".to_string(), site.risk_level.to_string()),
            (
                "Confidence".to_string(),
                format!("{}%", confidence_percent(site.confidence)),
            ),
            (
                "Area".to_string(),
                format!("{:.2} {}", site.area_size, mode.area_unit().suffix()),
            ),
            ("Location".to_string(), site.coordinates.to_string()),
        ];
        if let Some(density) = site.vegetation_density {
            rows.push(("Vegetation Density".into(), format!("{:.0}%", density)));
        }
        if let Some(quality) = &site.water_quality {
            rows.push(("Water Quality".into(), quality.clone()));
        }
        if let Some(depth) = site.depth {
            rows.push(("Average Depth".into(), format!("{:.1} meters", depth)));
        }
        if let Some(volume) = site.volume {
            rows.push((
                "Volume".into(),
                format!("{:.2} million m³", volume / 1_000_000.0),
            ));
        }
        if !site.description.is_empty() {
            rows.push(("Description".into(), site.description.clone()));
        }
        Self { title, rows }
    }
}

impl fmt::Display for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for (label, value) in &self.rows {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

fn confidence_percent(confidence: f64) -> i64 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    #[test]
    fn risk_colors_match_the_fixed_contract() {
        assert_eq!(risk_color("high"), "#e74c3c");
        assert_eq!(risk_color("medium"), "#f39c12");
        assert_eq!(risk_color("low"), "#2ecc71");
        assert_eq!(risk_color("extreme"), "#2ecc71");
        assert_eq!(risk_color(""), LOW_RISK_COLOR);
    }

    #[test]
    fn rgb_components_decode_from_hex() {
        assert_eq!(RiskLevel::High.rgb(), (0xe7, 0x4c, 0x3c));
        assert_eq!(RiskLevel::Low.rgb(), (0x2e, 0xcc, 0x71));
    }

    #[test]
    fn popup_lists_only_present_attributes() {
        let mut site = DetectionSite::new(
            "site-1",
            Coordinate::new(20.0, 78.0),
            0.826,
            RiskLevel::Medium,
            12.346,
        );
        site.water_quality = Some("Good".into());
        site.volume = Some(2_500_000.0);
        let popup = Popup::for_site(&site, DetectionMode::Water);

        assert_eq!(popup.title, "Water Body Detection");
        let labels: Vec<_> = popup.rows.iter().map(|(label, _)| label.as_str()).collect();
        assert!(labels.contains(&"Water Quality"));
        assert!(!labels.contains(&"Vegetation Density"));
        assert!(popup
            .rows
            .contains(&("Area".to_string(), "12.35 hectares".to_string())));
        assert!(popup
            .rows
            .contains(&("Confidence".to_string(), "83%".to_string())));
        assert!(popup
            .rows
            .contains(&("Volume".to_string(), "2.50 million m³".to_string())));
    }

    #[test]
    fn circle_radius_scales_with_area() {
        let site = DetectionSite::new("a", Coordinate::new(0.0, 0.0), 0.5, RiskLevel::High, 2.5);
        let circle = ImpactCircle::for_site(&site);
        assert_eq!(circle.radius_m, 250.0);
        assert_eq!(circle.color, HIGH_RISK_COLOR);
    }
}
