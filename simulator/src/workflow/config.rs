use anyhow::Context;
use canopycore::config::DEFAULT_MAP_CENTER;
use canopycore::mock::GeneratorConfig;
use canopycore::model::Coordinate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub bind: SocketAddr,
    pub sites: usize,
    pub seed: Option<u64>,
    pub latency_ms: u64,
    /// Generate sites around the submitted polygon instead of `reference`.
    pub follow_area: bool,
    pub reference: Coordinate,
    pub report_path: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            sites: 10,
            seed: None,
            latency_ms: 0,
            follow_area: true,
            reference: DEFAULT_MAP_CENTER,
            report_path: PathBuf::from("tools/data/offline_analysis.json"),
        }
    }
}

impl BackendConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading backend config {}", path_ref.display()))?;
        let config: BackendConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing backend config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(bind: SocketAddr, sites: usize, seed: Option<u64>, latency_ms: u64) -> Self {
        Self {
            bind,
            sites,
            seed,
            latency_ms,
            ..Self::default()
        }
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn to_generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            count: self.sites,
            reference: self.reference,
            ..GeneratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_generator_config() {
        let cfg = BackendConfig::from_args("127.0.0.1:8080".parse().unwrap(), 4, Some(7), 250);
        assert_eq!(cfg.to_generator_config().count, 4);
        assert_eq!(cfg.latency(), Duration::from_millis(250));
        assert!(cfg.follow_area);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"bind: 0.0.0.0:5050\nsites: 3\nseed: 11\nfollow_area: false\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = BackendConfig::load(&path).unwrap();
        assert_eq!(cfg.sites, 3);
        assert_eq!(cfg.bind.port(), 5050);
        assert_eq!(cfg.seed, Some(11));
        assert!(!cfg.follow_area);
        assert_eq!(cfg.reference, DEFAULT_MAP_CENTER);
    }
}
