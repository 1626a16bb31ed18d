use crate::model::site::{DetectionSite, RiskLevel};
use crate::prelude::RenderError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Aggregate response of an area analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_sites: u32,
    pub high_risk: u32,
    pub medium_risk: u32,
    pub low_risk: u32,
    #[serde(default)]
    pub detected_areas: Vec<DetectionSite>,
}

impl AnalysisResult {
    /// Builds a result whose counts are derived from the sites themselves.
    pub fn from_sites(detected_areas: Vec<DetectionSite>) -> Self {
        let count = |level: RiskLevel| {
            detected_areas
                .iter()
                .filter(|site| site.risk_level == level)
                .count() as u32
        };
        Self {
            total_sites: detected_areas.len() as u32,
            high_risk: count(RiskLevel::High),
            medium_risk: count(RiskLevel::Medium),
            low_risk: count(RiskLevel::Low),
            detected_areas,
        }
    }

    pub fn count_for(&self, level: RiskLevel) -> u32 {
        match level {
            RiskLevel::High => self.high_risk,
            RiskLevel::Medium => self.medium_risk,
            RiskLevel::Low => self.low_risk,
        }
    }

    /// Gives every site without an id a positional one and makes
    /// duplicates unique within this result set. Explicit ids keep
    /// precedence over generated ones.
    pub fn assign_missing_ids(&mut self) {
        let mut seen = HashSet::new();
        let renamed: Vec<usize> = self
            .detected_areas
            .iter()
            .enumerate()
            .filter(|(_, site)| site.id.is_empty() || !seen.insert(site.id.clone()))
            .map(|(index, _)| index)
            .collect();
        for index in renamed {
            let mut candidate = format!("site-{}", index);
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("site-{}-{}", index, suffix);
                suffix += 1;
            }
            self.detected_areas[index].id = candidate;
        }
    }

    /// Checks the shape the renderer relies on.
    pub fn validate(&self) -> Result<(), RenderError> {
        let sum = self.high_risk as u64 + self.medium_risk as u64 + self.low_risk as u64;
        if sum != self.total_sites as u64 {
            return Err(RenderError::CountMismatch {
                total: self.total_sites,
                sum,
            });
        }
        if self.detected_areas.len() != self.total_sites as usize {
            return Err(RenderError::SiteCountMismatch {
                expected: self.total_sites as usize,
                actual: self.detected_areas.len(),
            });
        }
        for site in &self.detected_areas {
            if !site.coordinates.is_valid() {
                return Err(RenderError::InvalidSite {
                    id: site.id.clone(),
                    reason: format!("coordinates {} out of range", site.coordinates),
                });
            }
            if !site.confidence.is_finite() || !site.area_size.is_finite() || site.area_size < 0.0
            {
                return Err(RenderError::InvalidSite {
                    id: site.id.clone(),
                    reason: "non-finite confidence or negative area".into(),
                });
            }
        }
        Ok(())
    }
}

/// Response of the image analysis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub deforestation_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, alias = "mask")]
    pub mask_base64: String,
}

impl ImageAnalysis {
    pub fn risk_level(&self) -> RiskLevel {
        risk_from_percentage(self.deforestation_percentage)
    }

    pub fn risk_description(&self) -> &'static str {
        match self.risk_level() {
            RiskLevel::Low => "Low Risk: Minimal deforestation detected",
            RiskLevel::Medium => "Medium Risk: Moderate deforestation detected",
            RiskLevel::High => "High Risk: Significant deforestation detected",
        }
    }

    /// Decodes the PNG mask bytes.
    pub fn mask_png(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(self.mask_base64.trim())
    }
}

/// Buckets a cleared-area percentage: below 10 low, below 30 medium.
pub fn risk_from_percentage(percentage: f64) -> RiskLevel {
    if percentage < 10.0 {
        RiskLevel::Low
    } else if percentage < 30.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}
