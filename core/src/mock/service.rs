use crate::mock::generator::{generate, GeneratorConfig};
use crate::model::{AnalysisRequest, AnalysisResult, ImageAnalysis, ImageUpload};
use crate::prelude::{AnalysisService, ClientResult};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-process stand-in for the analysis backend.
#[derive(Debug, Clone)]
pub struct MockAnalysisService {
    rng: Arc<Mutex<StdRng>>,
    config: GeneratorConfig,
    /// Center sites on the submitted polygon instead of `config.reference`.
    follow_area: bool,
    latency: Duration,
}

impl MockAnalysisService {
    pub fn new(config: GeneratorConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Arc::new(Mutex::new(rng)),
            config,
            follow_area: false,
            latency: Duration::ZERO,
        }
    }

    pub fn following_area(mut self) -> Self {
        self.follow_area = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Synchronous core of [`AnalysisService::analyze`].
    pub fn generate_result(&self, request: &AnalysisRequest) -> AnalysisResult {
        let mut config = self.config.clone();
        if self.follow_area {
            config.reference = request.coordinates.centroid();
        }
        let sites = self.with_rng(|rng| generate(request.detection_mode, &config, rng));
        debug!(
            "mock analysis produced {} {} sites",
            sites.len(),
            request.detection_mode.as_str()
        );
        AnalysisResult::from_sites(sites)
    }

    /// Random estimate with an empty mask.
    pub fn estimate_image(&self, upload: &ImageUpload) -> ImageAnalysis {
        let (percentage, confidence) = self.with_rng(|rng| {
            (
                (rng.gen::<f64>() * 100.0 * 100.0).round() / 100.0,
                rng.gen_range(0.7..0.95),
            )
        });
        debug!(
            "mock image estimate for {}: {:.2}%",
            upload.file_name, percentage
        );
        ImageAnalysis {
            deforestation_percentage: percentage,
            confidence: Some(confidence),
            mask_base64: String::new(),
        }
    }

    fn with_rng<T>(&self, draw: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock only means another draw panicked; the generator
        // state is still usable.
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        draw(&mut rng)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockAnalysisService {
    fn default() -> Self {
        Self::new(GeneratorConfig::default(), None)
    }
}

impl AnalysisService for MockAnalysisService {
    async fn analyze(&self, request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
        self.delay().await;
        Ok(self.generate_result(request))
    }

    async fn analyze_image(&self, upload: &ImageUpload) -> ClientResult<ImageAnalysis> {
        self.delay().await;
        Ok(self.estimate_image(upload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisSettings, Coordinate, DetectionMode, PolygonRing};

    fn request(mode: DetectionMode) -> AnalysisRequest {
        let ring = PolygonRing::new(vec![
            Coordinate::new(-3.0, -60.0),
            Coordinate::new(-3.0, -59.0),
            Coordinate::new(-2.0, -59.0),
        ])
        .unwrap();
        let settings = AnalysisSettings {
            mode,
            ..AnalysisSettings::default()
        };
        AnalysisRequest::new(ring, &settings)
    }

    #[tokio::test]
    async fn mock_results_are_internally_consistent() {
        let service = MockAnalysisService::new(GeneratorConfig::default(), Some(5));
        let result = service.analyze(&request(DetectionMode::Water)).await.unwrap();
        assert_eq!(result.total_sites, 10);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn following_area_centers_sites_on_the_polygon() {
        let service = MockAnalysisService::new(GeneratorConfig::default(), Some(1)).following_area();
        let request = request(DetectionMode::Deforestation);
        let center = request.coordinates.centroid();
        let result = service.generate_result(&request);
        assert!(result.detected_areas.iter().all(|site| {
            (site.coordinates.lat - center.lat).abs() <= 1.0
                && (site.coordinates.lng - center.lng).abs() <= 1.0
        }));
    }

    #[tokio::test]
    async fn image_estimate_stays_in_range() {
        let service = MockAnalysisService::new(GeneratorConfig::default(), Some(8));
        let upload = ImageUpload::new("plot.png", vec![0u8; 4]);
        let analysis = service.analyze_image(&upload).await.unwrap();
        assert!((0.0..=100.0).contains(&analysis.deforestation_percentage));
        let confidence = analysis.confidence.unwrap();
        assert!((0.7..0.95).contains(&confidence));
        assert!(analysis.mask_png().unwrap().is_empty());
    }
}
