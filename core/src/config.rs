use crate::model::{AnalysisSettings, Coordinate, DetectionMode, TimeRange};
use crate::surface::BaseLayer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Map center used by the mock generator and the initial map view (India).
pub const DEFAULT_MAP_CENTER: Coordinate = Coordinate::new(20.5937, 78.9629);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading dashboard config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing dashboard config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Dashboard settings, loadable from YAML. Missing keys keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend_url: String,
    pub analyze_path: String,
    pub image_path: String,
    pub timeout_secs: u64,
    pub map_center: Coordinate,
    pub map_zoom: u8,
    pub base_layer: BaseLayer,
    pub detection_mode: DetectionMode,
    pub sensitivity: f64,
    pub time_range: TimeRange,
    /// Answer analyses from the in-process generator instead of the backend.
    pub demo_mode: bool,
    pub mock_site_count: usize,
    pub mock_seed: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".into(),
            analyze_path: "/api/analyze-area".into(),
            image_path: "/api/detect-deforestation".into(),
            timeout_secs: 30,
            map_center: DEFAULT_MAP_CENTER,
            map_zoom: 5,
            base_layer: BaseLayer::OpenStreetMap,
            detection_mode: DetectionMode::Deforestation,
            sensitivity: 0.7,
            time_range: TimeRange::Hours(24),
            demo_mode: false,
            mock_site_count: 10,
            mock_seed: None,
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn analyze_url(&self) -> String {
        join_url(&self.backend_url, &self.analyze_path)
    }

    pub fn image_url(&self) -> String {
        join_url(&self.backend_url, &self.image_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn initial_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            mode: self.detection_mode,
            sensitivity: self.sensitivity.clamp(0.0, 1.0),
            time_range: self.time_range.clone(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
