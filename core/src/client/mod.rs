pub mod http;

pub use http::{decode_response, AnalysisClient};

use crate::config::DashboardConfig;
use crate::mock::{GeneratorConfig, MockAnalysisService};
use crate::model::{AnalysisRequest, AnalysisResult, ImageAnalysis, ImageUpload};
use crate::prelude::{AnalysisService, ClientResult};

/// The service the dashboard talks to, chosen from configuration.
#[derive(Debug, Clone)]
pub enum Backend {
    Http(AnalysisClient),
    Mock(MockAnalysisService),
}

impl Backend {
    pub fn from_config(config: &DashboardConfig) -> ClientResult<Self> {
        if config.demo_mode {
            let generator = GeneratorConfig {
                count: config.mock_site_count,
                reference: config.map_center,
                ..GeneratorConfig::default()
            };
            Ok(Backend::Mock(MockAnalysisService::new(
                generator,
                config.mock_seed,
            )))
        } else {
            AnalysisClient::new(config).map(Backend::Http)
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Backend::Http(_) => "HTTP backend",
            Backend::Mock(_) => "demo generator",
        }
    }
}

impl AnalysisService for Backend {
    async fn analyze(&self, request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
        match self {
            Backend::Http(client) => client.analyze(request).await,
            Backend::Mock(mock) => AnalysisService::analyze(mock, request).await,
        }
    }

    async fn analyze_image(&self, upload: &ImageUpload) -> ClientResult<ImageAnalysis> {
        match self {
            Backend::Http(client) => client.analyze_image(upload).await,
            Backend::Mock(mock) => AnalysisService::analyze_image(mock, upload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_mode_selects_the_generator() {
        let config = DashboardConfig {
            demo_mode: true,
            ..DashboardConfig::default()
        };
        assert!(matches!(
            Backend::from_config(&config).unwrap(),
            Backend::Mock(_)
        ));
        let live = Backend::from_config(&DashboardConfig::default()).unwrap();
        assert_eq!(live.describe(), "HTTP backend");
    }
}
