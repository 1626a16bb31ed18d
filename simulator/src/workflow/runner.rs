use crate::generator::mask::vegetation_mask;
use crate::workflow::config::BackendConfig;
use anyhow::Context;
use canopycore::mock::MockAnalysisService;
use canopycore::model::{
    AnalysisRequest, AnalysisResult, AnalysisSettings, Coordinate, DetectionMode, ImageAnalysis,
    PolygonRing,
};
use canopycore::telemetry::{Metrics, MetricsRecorder};
use canopycore::AnalysisService;
use std::sync::Arc;

/// Answers analysis requests for the mock backend and the offline run.
#[derive(Clone)]
pub struct Runner {
    config: BackendConfig,
    service: MockAnalysisService,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: BackendConfig) -> Self {
        let mut service = MockAnalysisService::new(config.to_generator_config(), config.seed)
            .with_latency(config.latency());
        if config.follow_area {
            service = service.following_area();
        }
        Self {
            config,
            service,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub async fn execute(&self, request: &AnalysisRequest) -> anyhow::Result<AnalysisResult> {
        self.metrics.record_issued();
        let outcome = self
            .service
            .analyze(request)
            .await
            .context("generating detections");
        let result = outcome.and_then(|result| {
            result
                .validate()
                .context("validating generated result")?;
            Ok(result)
        });
        match &result {
            Ok(_) => self.metrics.record_applied(),
            Err(_) => self.metrics.record_failed(),
        }
        result
    }

    /// Classifies an uploaded image. Errors mean the upload was unusable.
    pub fn analyze_image(&self, bytes: &[u8]) -> anyhow::Result<ImageAnalysis> {
        self.metrics.record_issued();
        let analysis = vegetation_mask(bytes).and_then(|mask| mask.into_analysis());
        match &analysis {
            Ok(_) => self.metrics.record_applied(),
            Err(_) => self.metrics.record_failed(),
        }
        analysis
    }

    /// One analysis over a 1° square at the reference point.
    pub async fn execute_offline(&self, mode: DetectionMode) -> anyhow::Result<AnalysisResult> {
        let center = self.config.reference;
        let ring = PolygonRing::new(vec![
            Coordinate::new(center.lat - 0.5, center.lng - 0.5),
            Coordinate::new(center.lat - 0.5, center.lng + 0.5),
            Coordinate::new(center.lat + 0.5, center.lng + 0.5),
            Coordinate::new(center.lat + 0.5, center.lng - 0.5),
        ])
        .context("building offline area")?;
        let settings = AnalysisSettings {
            mode,
            ..AnalysisSettings::default()
        };
        self.execute(&AnalysisRequest::new(ring, &settings)).await
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runner_executes_workflow() {
        let cfg = BackendConfig {
            sites: 6,
            seed: Some(2),
            ..BackendConfig::default()
        };
        let runner = Runner::new(cfg);
        let result = runner.execute_offline(DetectionMode::Water).await.unwrap();
        assert_eq!(result.total_sites, 6);
        assert_eq!(
            result.high_risk + result.medium_risk + result.low_risk,
            result.total_sites
        );
        assert!(result.detected_areas.iter().all(|site| site.volume.is_some()));
        assert_eq!(runner.metrics().applied, 1);
    }

    #[test]
    fn unreadable_upload_counts_as_failure() {
        let runner = Runner::new(BackendConfig::default());
        assert!(runner.analyze_image(b"\x00\x01").is_err());
        assert_eq!(runner.metrics().failed, 1);
    }
}
