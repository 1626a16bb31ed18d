use crate::config::DEFAULT_MAP_CENTER;
use crate::model::{Coordinate, DetectionMode, DetectionSite, RiskLevel};
use rand::Rng;
use serde::{Deserialize, Serialize};

const WATER_QUALITIES: [&str; 2] = ["Good", "Moderate"];

/// Parameters of the placeholder detection generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub count: usize,
    pub reference: Coordinate,
    /// Half-width of the uniform jitter around `reference`, in degrees.
    pub jitter_deg: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 10,
            reference: DEFAULT_MAP_CENTER,
            jitter_deg: 1.0,
        }
    }
}

/// Risk bucket from independent draws. The bucket is deliberately not tied to
/// the site's confidence value.
fn draw_risk<R: Rng + ?Sized>(rng: &mut R) -> RiskLevel {
    if rng.gen::<f64>() > 0.7 {
        RiskLevel::High
    } else if rng.gen::<f64>() > 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn describe(mode: DetectionMode, area: f64, unit: &str, pick: usize) -> String {
    let templates: [String; 3] = match mode {
        DetectionMode::Deforestation => [
            format!("Significant deforestation detected in this area, affecting approximately {:.2} {} of forest cover.", area, unit),
            format!("Moderate deforestation activity observed, impacting {:.2} {} of forest area.", area, unit),
            format!("Minor deforestation detected, affecting {:.2} {} of forest cover.", area, unit),
        ],
        DetectionMode::Water => [
            format!("Reservoir surface of {:.2} {} detected with stable shoreline.", area, unit),
            format!("Water body of {:.2} {} showing seasonal shrinkage.", area, unit),
            format!("Small impoundment of {:.2} {} detected.", area, unit),
        ],
        DetectionMode::Biodiversity => [
            format!("Habitat fragmentation across {:.2} {}.", area, unit),
            format!("Reduced canopy diversity over {:.2} {}.", area, unit),
            format!("Edge effects observed on {:.2} {} of habitat.", area, unit),
        ],
        DetectionMode::Carbon => [
            format!("Elevated carbon loss estimated over {:.2} {}.", area, unit),
            format!("Moderate biomass reduction across {:.2} {}.", area, unit),
            format!("Minor carbon stock change over {:.2} {}.", area, unit),
        ],
    };
    templates[pick % templates.len()].clone()
}

/// Produces `config.count` randomized sites for `mode`.
pub fn generate<R: Rng + ?Sized>(
    mode: DetectionMode,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Vec<DetectionSite> {
    let unit = mode.area_unit().suffix();
    (0..config.count)
        .map(|index| {
            let mut offset = || (rng.gen::<f64>() - 0.5) * 2.0 * config.jitter_deg;
            let coordinates = Coordinate::new(
                (config.reference.lat + offset()).clamp(-90.0, 90.0),
                (config.reference.lng + offset()).clamp(-180.0, 180.0),
            );
            let confidence = rng.gen::<f64>();
            let risk_level = draw_risk(rng);
            let area_size = rng.gen::<f64>() * 100.0;

            let mut site = DetectionSite::new(
                format!("site-{}", index),
                coordinates,
                confidence,
                risk_level,
                area_size,
            );
            site.kind = Some(mode.title().to_string());
            match mode {
                DetectionMode::Deforestation => {
                    site.vegetation_density = Some((rng.gen::<f64>() * 100.0).round());
                }
                DetectionMode::Water => {
                    site.area_size = rng.gen::<f64>() * 100.0 + 50.0;
                    site.water_quality =
                        Some(WATER_QUALITIES[rng.gen_range(0..WATER_QUALITIES.len())].into());
                    site.depth = Some(rng.gen::<f64>() * 30.0 + 10.0);
                    site.volume = Some(rng.gen::<f64>() * 1_000_000.0 + 500_000.0);
                }
                DetectionMode::Biodiversity | DetectionMode::Carbon => {}
            }
            site.description = describe(mode, site.area_size, unit, rng.gen_range(0..3));
            site
        })
        .collect()
}
