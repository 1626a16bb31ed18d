//! Dashboard state: the selection controller, the renderer and the transient
//! UI state around them, driven by map events and control-panel changes.
//!
//! Requests leave the dashboard as [`PendingAnalysis`] values that the caller
//! runs on its executor and hands back through [`Dashboard::finish`].

pub mod loading;
pub mod notice;

pub use loading::{LoadingGuard, LoadingOverlay};
pub use notice::{Notice, NoticeBoard, NoticeKind, NOTICE_TTL};

use crate::config::DashboardConfig;
use crate::model::{
    AnalysisRequest, AnalysisResult, AnalysisSettings, Coordinate, DetectionMode, ImageAnalysis,
    ImageUpload, PolygonRing, TimeRange,
};
use crate::prelude::{AnalysisError, AnalysisService, DashboardError, GeometryError};
use crate::render::counter::{Clock, MonotonicClock};
use crate::render::{ChartFeed, RenderOutcome, RequestTicket, ResultRenderer, WaterSummary};
use crate::render::style::Popup;
use crate::selection::{AreaSelectionController, SelectionState};
use crate::surface::{
    BaseLayer, ChartBoard, DrawTool, MapEvent, MarkerScene, PolygonDraft, SiteOverlay, StatPanel,
};
use crate::telemetry::{ActivityLog, MetricsRecorder};
use std::sync::Arc;
use std::time::Duration;

/// Zoom level used when centering the map on a single site.
pub const FOCUS_ZOOM: u8 = 15;

/// Period of the scheduled runs while continuous detection is on.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(300);

/// Map size assumed until the map widget reports its own.
pub const DEFAULT_VIEWPORT_PX: (f64, f64) = (1024.0, 768.0);

/// An area analysis that has been issued but not yet sent.
#[derive(Debug)]
pub struct PendingAnalysis {
    pub ticket: RequestTicket,
    pub request: AnalysisRequest,
    guard: LoadingGuard,
}

impl PendingAnalysis {
    /// Sends the request. The loading overlay is released when this returns
    /// or when the future is dropped.
    pub async fn run<S: AnalysisService>(self, service: &S) -> AnalysisCompletion {
        let PendingAnalysis {
            ticket,
            request,
            guard,
        } = self;
        let outcome = service.analyze(&request).await;
        drop(guard);
        AnalysisCompletion { ticket, outcome }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisCompletion {
    pub ticket: RequestTicket,
    pub outcome: Result<AnalysisResult, AnalysisError>,
}

/// An image upload waiting to be sent.
#[derive(Debug)]
pub struct PendingImage {
    pub seq: u64,
    pub upload: ImageUpload,
    guard: LoadingGuard,
}

impl PendingImage {
    pub async fn run<S: AnalysisService>(self, service: &S) -> ImageCompletion {
        let PendingImage { seq, upload, guard } = self;
        let outcome = service.analyze_image(&upload).await;
        drop(guard);
        ImageCompletion {
            seq,
            file_name: upload.file_name,
            outcome,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageCompletion {
    pub seq: u64,
    pub file_name: String,
    pub outcome: Result<ImageAnalysis, AnalysisError>,
}

/// Map viewport: center and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
}

impl MapView {
    /// Slippy-map scale: 256 px cover 360° at zoom 0.
    pub fn deg_per_px(&self) -> f64 {
        360.0 / (256.0 * 2f64.powi(self.zoom.min(20) as i32))
    }

    /// Visible rectangle of a `width` × `height` px map, clamped to the globe.
    pub fn viewport_ring(&self, width: f64, height: f64) -> Result<PolygonRing, GeometryError> {
        let half_lat = height / 2.0 * self.deg_per_px();
        let half_lng = width / 2.0 * self.deg_per_px();
        let south = (self.center.lat - half_lat).max(-90.0);
        let north = (self.center.lat + half_lat).min(90.0);
        let west = (self.center.lng - half_lng).max(-180.0);
        let east = (self.center.lng + half_lng).min(180.0);
        PolygonRing::new(vec![
            Coordinate::new(south, west),
            Coordinate::new(north, west),
            Coordinate::new(north, east),
            Coordinate::new(south, east),
        ])
    }
}

pub type DashboardRenderer<K> = ResultRenderer<MarkerScene, StatPanel, ChartBoard, K>;

pub struct Dashboard<K = MonotonicClock> {
    settings: AnalysisSettings,
    base_layer: BaseLayer,
    view: MapView,
    controller: AreaSelectionController<PolygonDraft>,
    renderer: DashboardRenderer<K>,
    loading: LoadingOverlay,
    notices: NoticeBoard<K>,
    activity: ActivityLog,
    metrics: Arc<MetricsRecorder>,
    water: Option<WaterSummary>,
    selected_site: Option<String>,
    image: Option<(String, ImageAnalysis)>,
    image_seq: u64,
    monitoring: bool,
    viewport_px: (f64, f64),
}

impl Dashboard<MonotonicClock> {
    pub fn new(config: &DashboardConfig) -> Self {
        let feed = match config.mock_seed {
            Some(seed) => ChartFeed::seeded(seed),
            None => ChartFeed::from_entropy(),
        };
        Self::with_parts(config, MonotonicClock, feed)
    }
}

impl<K: Clock + Clone> Dashboard<K> {
    pub fn with_parts(config: &DashboardConfig, clock: K, feed: ChartFeed) -> Self {
        let renderer = ResultRenderer::with_parts(
            MarkerScene::new(),
            StatPanel::default(),
            ChartBoard::default(),
            clock.clone(),
            feed,
        );
        let mut dashboard = Self {
            settings: config.initial_settings(),
            base_layer: config.base_layer,
            view: MapView {
                center: config.map_center,
                zoom: config.map_zoom,
            },
            controller: AreaSelectionController::new(PolygonDraft::new()),
            renderer,
            loading: LoadingOverlay::new(),
            notices: NoticeBoard::new(clock),
            activity: ActivityLog::new(),
            metrics: Arc::new(MetricsRecorder::new()),
            water: None,
            selected_site: None,
            image: None,
            image_seq: 0,
            monitoring: false,
            viewport_px: DEFAULT_VIEWPORT_PX,
        };
        dashboard.renderer.clear();
        dashboard
    }

    /// The "select area" button.
    pub fn toggle_selection(&mut self) -> SelectionState {
        let state = self.controller.toggle();
        match state {
            SelectionState::Selecting => self.activity.record("Area selection started"),
            SelectionState::Idle => self.activity.record("Area selection cancelled"),
            SelectionState::Submitted => {}
        }
        state
    }

    /// A map click while selecting adds a polygon vertex.
    pub fn add_vertex(&mut self, point: Coordinate) {
        if let Some(event) = self.controller.tool_mut().push_vertex(point) {
            self.handle_map_event(event);
        }
    }

    /// Closes the polygon being drawn.
    pub fn finish_shape(&mut self) -> Option<PendingAnalysis> {
        let event = self.controller.tool_mut().finish()?;
        self.handle_map_event(event)
    }

    /// Aborts drawing (escape key).
    pub fn cancel_drawing(&mut self) {
        if self.controller.tool().is_enabled() {
            self.controller.tool_mut().disable();
            self.handle_map_event(MapEvent::DrawStop);
        }
    }

    pub fn handle_map_event(&mut self, event: MapEvent) -> Option<PendingAnalysis> {
        match event {
            MapEvent::DrawStart => {
                self.controller.draw_started();
                None
            }
            MapEvent::DrawStop => {
                self.controller.draw_stopped();
                None
            }
            MapEvent::ShapeCreated(points) => self.shape_created(points),
        }
    }

    fn shape_created(&mut self, points: Vec<Coordinate>) -> Option<PendingAnalysis> {
        match self.controller.shape_created(points, &self.settings) {
            Ok(request) => {
                self.activity.record(format!(
                    "Analyzing {} area ({} points)",
                    request.detection_mode.as_str(),
                    request.coordinates.points().len()
                ));
                Some(self.issue(request))
            }
            Err(err) => {
                self.report_geometry(err);
                None
            }
        }
    }

    fn issue(&mut self, request: AnalysisRequest) -> PendingAnalysis {
        let ticket = self.renderer.issue(request.detection_mode);
        self.metrics.record_issued();
        PendingAnalysis {
            ticket,
            request,
            guard: self.loading.acquire(),
        }
    }

    fn report_geometry(&mut self, err: GeometryError) {
        let err = DashboardError::from(err);
        self.activity.record_failure(err.to_string());
        self.notices.post(NoticeKind::Geometry, err.to_string());
    }

    /// The "start/stop detection" button. Starting runs a detection right
    /// away; stopping clears the results.
    pub fn toggle_monitoring(&mut self) -> Option<PendingAnalysis> {
        if self.monitoring {
            self.monitoring = false;
            self.clear_results();
            self.controller.settle();
            self.activity.record("Continuous detection stopped");
            return None;
        }
        self.monitoring = true;
        self.activity.record(format!(
            "Continuous {} detection started",
            self.settings.mode.as_str()
        ));
        self.detect_now()
    }

    /// Scheduled run, every [`MONITOR_INTERVAL`] while monitoring.
    pub fn monitor_tick(&mut self) -> Option<PendingAnalysis> {
        if !self.monitoring {
            return None;
        }
        self.detect_now()
    }

    /// Analyzes the selected area, or the visible map when none is selected.
    /// Skipped while a new area is being drawn.
    fn detect_now(&mut self) -> Option<PendingAnalysis> {
        if self.controller.is_selecting() {
            return None;
        }
        if let Some(request) = self.controller.resubmit(&self.settings) {
            return Some(self.issue(request));
        }
        let (width, height) = self.viewport_px;
        match self.view.viewport_ring(width, height) {
            Ok(ring) => Some(self.issue(AnalysisRequest::new(ring, &self.settings))),
            Err(err) => {
                self.report_geometry(err);
                None
            }
        }
    }

    /// Switching modes clears the results and discards in-flight responses.
    pub fn set_mode(&mut self, mode: DetectionMode) {
        if self.settings.mode == mode {
            return;
        }
        self.settings.mode = mode;
        self.clear_results();
        self.controller.settle();
        if self.monitoring {
            self.monitoring = false;
            self.activity.record("Continuous detection stopped");
        }
        self.activity
            .record(format!("Detection mode switched to {}", mode.title()));
    }

    /// Changing the window re-runs the analysis for the last selected area.
    pub fn set_time_range(&mut self, range: TimeRange) -> Option<PendingAnalysis> {
        if self.settings.time_range == range {
            return None;
        }
        self.settings.time_range = range;
        self.activity.record(format!(
            "Time range set to {}",
            self.settings.time_range
        ));
        let request = self.controller.resubmit(&self.settings)?;
        Some(self.issue(request))
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.settings.sensitivity = sensitivity.clamp(0.0, 1.0);
    }

    pub fn toggle_base_layer(&mut self) -> BaseLayer {
        self.base_layer = self.base_layer.toggled();
        self.activity
            .record(format!("Base layer switched to {}", self.base_layer));
        self.base_layer
    }

    /// Removes results, the drawn area and any in-flight analysis.
    pub fn clear(&mut self) {
        self.clear_results();
        self.controller.forget_area();
        self.controller.settle();
        self.image = None;
        self.image_seq += 1;
        self.activity.record("Results cleared");
    }

    fn clear_results(&mut self) {
        self.renderer.clear();
        self.water = None;
        self.selected_site = None;
    }

    /// Applies a finished analysis if it is still the latest one.
    pub fn finish(
        &mut self,
        completion: AnalysisCompletion,
    ) -> Result<RenderOutcome, DashboardError> {
        let AnalysisCompletion { ticket, outcome } = completion;
        if self.renderer.is_current(ticket) {
            self.controller.settle();
        }
        let applied = outcome
            .map_err(DashboardError::from)
            .and_then(|result| {
                self.renderer
                    .apply(ticket, result, &self.settings.time_range)
                    .map_err(DashboardError::from)
            });

        match &applied {
            Ok(RenderOutcome::Applied { markers, water }) => {
                self.metrics.record_applied();
                self.water = *water;
                self.selected_site = None;
                self.activity
                    .record(format!("Analysis complete: {} sites detected", markers));
            }
            Ok(RenderOutcome::Stale) => self.metrics.record_stale(),
            Err(err) if self.renderer.is_current(ticket) => {
                self.metrics.record_failed();
                self.activity
                    .record_failure(format!("Analysis failed: {}", err));
                self.notices.post(NoticeKind::Error, err.to_string());
            }
            Err(err) => {
                self.metrics.record_stale();
                log::debug!("ignoring failure of superseded request {}: {}", ticket.seq, err);
            }
        }
        applied
    }

    /// Starts an image analysis. Only the latest upload's answer is kept.
    pub fn analyze_image(&mut self, upload: ImageUpload) -> PendingImage {
        self.image_seq += 1;
        self.activity
            .record(format!("Uploading {} for analysis", upload.file_name));
        PendingImage {
            seq: self.image_seq,
            upload,
            guard: self.loading.acquire(),
        }
    }

    pub fn finish_image(&mut self, completion: ImageCompletion) -> Option<&ImageAnalysis> {
        if completion.seq != self.image_seq {
            return None;
        }
        match completion.outcome {
            Ok(analysis) => {
                self.activity.record(format!(
                    "{}: {:.2}% deforestation ({} risk)",
                    completion.file_name,
                    analysis.deforestation_percentage,
                    analysis.risk_level()
                ));
                self.image = Some((completion.file_name, analysis));
                self.image.as_ref().map(|(_, analysis)| analysis)
            }
            Err(err) => {
                self.activity
                    .record_failure(format!("Image analysis failed: {}", err));
                self.notices.post(NoticeKind::Error, err.to_string());
                None
            }
        }
    }

    /// Opens the popup of the overlay nearest to `point`, if any.
    pub fn select_site_at(&mut self, point: Coordinate, tolerance_deg: f64) -> Option<&Popup> {
        let site_id = self
            .renderer
            .layer()
            .hit_test(point, tolerance_deg)
            .map(|overlay| overlay.site_id.clone());
        self.selected_site = site_id;
        self.selected_overlay().map(|overlay| &overlay.popup)
    }

    pub fn close_popup(&mut self) {
        self.selected_site = None;
    }

    /// Centers the map on a rendered site.
    pub fn focus_site(&mut self, site_id: &str) -> Option<MapView> {
        let position = self
            .renderer
            .layer()
            .overlays()
            .find(|overlay| overlay.site_id == site_id)?
            .position;
        self.view = MapView {
            center: position,
            zoom: FOCUS_ZOOM,
        };
        Some(self.view)
    }

    pub fn set_view(&mut self, view: MapView) {
        self.view = view;
    }

    /// Pixel size of the map widget, used for viewport detection.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_px = (width, height);
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        self.viewport_px
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Advances counter animations and expires notices. Returns whether
    /// anything is still changing.
    pub fn tick(&mut self) -> bool {
        let animating = self.renderer.tick();
        let notices = self.notices.expire();
        animating || notices
    }

    pub fn dismiss_notice(&mut self, id: u64) {
        self.notices.dismiss(id);
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn selection_state(&self) -> SelectionState {
        self.controller.state()
    }

    pub fn draft(&self) -> &PolygonDraft {
        self.controller.tool()
    }

    pub fn selected_area(&self) -> Option<&[Coordinate]> {
        self.controller.last_ring().map(|ring| ring.points())
    }

    pub fn renderer(&self) -> &DashboardRenderer<K> {
        &self.renderer
    }

    pub fn overlays(&self) -> impl Iterator<Item = &SiteOverlay> {
        self.renderer.layer().overlays()
    }

    pub fn selected_overlay(&self) -> Option<&SiteOverlay> {
        let id = self.selected_site.as_deref()?;
        self.overlays().find(|overlay| overlay.site_id == id)
    }

    pub fn base_layer(&self) -> BaseLayer {
        self.base_layer
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_visible()
    }

    pub fn loading(&self) -> &LoadingOverlay {
        &self.loading
    }

    pub fn notices(&self) -> &NoticeBoard<K> {
        &self.notices
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.metrics)
    }

    pub fn water_summary(&self) -> Option<WaterSummary> {
        self.water
    }

    pub fn image_analysis(&self) -> Option<(&str, &ImageAnalysis)> {
        self.image
            .as_ref()
            .map(|(name, analysis)| (name.as_str(), analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectionSite, RiskLevel};
    use crate::prelude::{ClientResult, RenderError};
    use crate::render::counter::{ManualClock, ANIMATION_WINDOW};
    use crate::surface::StatKind;

    /// Answers every request with the same canned outcome.
    struct FixedService {
        outcome: ClientResult<AnalysisResult>,
    }

    impl AnalysisService for FixedService {
        async fn analyze(&self, _request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
            self.outcome.clone()
        }

        async fn analyze_image(&self, upload: &ImageUpload) -> ClientResult<ImageAnalysis> {
            Ok(ImageAnalysis {
                deforestation_percentage: upload.bytes.len() as f64,
                confidence: Some(0.9),
                mask_base64: String::new(),
            })
        }
    }

    fn two_sites() -> AnalysisResult {
        AnalysisResult::from_sites(vec![
            DetectionSite::new("a", Coordinate::new(10.2, 10.4), 0.91, RiskLevel::High, 4.0),
            DetectionSite::new("b", Coordinate::new(10.6, 10.8), 0.42, RiskLevel::Low, 1.0),
        ])
    }

    fn dashboard() -> (Dashboard<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let dashboard =
            Dashboard::with_parts(&DashboardConfig::default(), clock.clone(), ChartFeed::seeded(4));
        (dashboard, clock)
    }

    fn draw_triangle(dashboard: &mut Dashboard<ManualClock>) -> Option<PendingAnalysis> {
        dashboard.toggle_selection();
        for point in [
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 11.0),
            Coordinate::new(11.0, 11.0),
        ] {
            dashboard.add_vertex(point);
        }
        dashboard.finish_shape()
    }

    #[tokio::test]
    async fn drawn_area_is_analyzed_and_rendered() {
        let (mut dashboard, clock) = dashboard();
        let service = FixedService {
            outcome: Ok(two_sites()),
        };

        let pending = draw_triangle(&mut dashboard).unwrap();
        assert_eq!(pending.request.coordinates.points().len(), 3);
        assert_eq!(pending.request.detection_mode, DetectionMode::Deforestation);
        assert_eq!(pending.request.time_range.to_string(), "24");
        assert_eq!(pending.request.sensitivity, 0.7);
        assert!(dashboard.is_loading());
        assert_eq!(dashboard.selection_state(), SelectionState::Submitted);

        let completion = pending.run(&service).await;
        assert!(!dashboard.is_loading());
        let outcome = dashboard.finish(completion).unwrap();
        assert!(matches!(outcome, RenderOutcome::Applied { markers: 2, .. }));
        assert_eq!(dashboard.overlays().count(), 2);
        assert_eq!(dashboard.selection_state(), SelectionState::Idle);

        clock.advance(ANIMATION_WINDOW);
        dashboard.tick();
        assert_eq!(dashboard.renderer().stats().value(StatKind::TotalSites), 2);
        assert_eq!(dashboard.renderer().stats().value(StatKind::HighRisk), 1);
        assert_eq!(dashboard.metrics().snapshot().applied, 1);
    }

    #[tokio::test]
    async fn slower_earlier_response_is_discarded() {
        let (mut dashboard, _) = dashboard();
        let first = draw_triangle(&mut dashboard).unwrap();
        dashboard.controller.settle();
        let second = dashboard
            .set_time_range(TimeRange::Label("Last Week".into()))
            .unwrap();

        let late = FixedService {
            outcome: Ok(AnalysisResult::from_sites(vec![DetectionSite::new(
                "x",
                Coordinate::new(1.0, 1.0),
                0.5,
                RiskLevel::Medium,
                2.0,
            )])),
        };
        let fresh = FixedService {
            outcome: Ok(two_sites()),
        };

        let b = second.run(&fresh).await;
        dashboard.finish(b).unwrap();
        let a = first.run(&late).await;
        assert_eq!(dashboard.finish(a).unwrap(), RenderOutcome::Stale);

        assert_eq!(dashboard.overlays().count(), 2);
        assert_eq!(dashboard.metrics().snapshot().stale, 1);
        assert!(!dashboard.is_loading());
    }

    #[tokio::test]
    async fn mode_switch_invalidates_in_flight_request() {
        let (mut dashboard, _) = dashboard();
        let pending = draw_triangle(&mut dashboard).unwrap();
        dashboard.set_mode(DetectionMode::Water);
        assert_eq!(dashboard.selection_state(), SelectionState::Idle);

        let completion = pending
            .run(&FixedService {
                outcome: Ok(two_sites()),
            })
            .await;
        assert_eq!(dashboard.finish(completion).unwrap(), RenderOutcome::Stale);
        assert_eq!(dashboard.overlays().count(), 0);
    }

    #[tokio::test]
    async fn failed_request_posts_a_transient_notice() {
        let (mut dashboard, clock) = dashboard();
        let pending = draw_triangle(&mut dashboard).unwrap();
        let completion = pending
            .run(&FixedService {
                outcome: Err(AnalysisError::ServerError {
                    status: 502,
                    body: "bad gateway".into(),
                }),
            })
            .await;

        let err = dashboard.finish(completion).unwrap_err();
        assert!(matches!(err, DashboardError::Analysis(_)));
        assert!(!dashboard.is_loading());
        assert_eq!(dashboard.selection_state(), SelectionState::Idle);
        assert!(dashboard.notices().latest(NoticeKind::Error).is_some());

        clock.advance(NOTICE_TTL);
        dashboard.tick();
        assert!(dashboard.notices().is_empty());
        assert_eq!(dashboard.metrics().snapshot().failed, 1);
    }

    #[tokio::test]
    async fn malformed_result_keeps_previous_markers() {
        let (mut dashboard, _) = dashboard();
        let ok = draw_triangle(&mut dashboard)
            .unwrap()
            .run(&FixedService {
                outcome: Ok(two_sites()),
            })
            .await;
        dashboard.finish(ok).unwrap();

        let mut broken = two_sites();
        broken.high_risk = 5;
        let pending = dashboard
            .set_time_range(TimeRange::Hours(48))
            .unwrap();
        let completion = pending
            .run(&FixedService {
                outcome: Ok(broken),
            })
            .await;
        let err = dashboard.finish(completion).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Render(RenderError::CountMismatch { .. })
        ));
        assert_eq!(dashboard.overlays().count(), 2);
    }

    #[test]
    fn two_point_shape_is_reported_near_the_map() {
        let (mut dashboard, _) = dashboard();
        dashboard.toggle_selection();
        dashboard.add_vertex(Coordinate::new(10.0, 10.0));
        dashboard.add_vertex(Coordinate::new(10.0, 11.0));
        assert!(dashboard.finish_shape().is_none());
        assert_eq!(dashboard.selection_state(), SelectionState::Idle);
        assert!(!dashboard.is_loading());
        assert!(dashboard.notices().latest(NoticeKind::Geometry).is_some());
    }

    #[tokio::test]
    async fn clicking_a_marker_opens_its_popup_and_focus_centers_it() {
        let (mut dashboard, _) = dashboard();
        let completion = draw_triangle(&mut dashboard)
            .unwrap()
            .run(&FixedService {
                outcome: Ok(two_sites()),
            })
            .await;
        dashboard.finish(completion).unwrap();

        let popup = dashboard
            .select_site_at(Coordinate::new(10.21, 10.41), 0.05)
            .unwrap();
        assert_eq!(popup.title, "Deforestation Detection");
        assert_eq!(dashboard.selected_overlay().unwrap().site_id, "a");

        let view = dashboard.focus_site("b").unwrap();
        assert_eq!(view.center, Coordinate::new(10.6, 10.8));
        assert_eq!(view.zoom, FOCUS_ZOOM);
        assert!(dashboard.focus_site("missing").is_none());
    }

    #[tokio::test]
    async fn only_the_latest_image_answer_is_kept() {
        let (mut dashboard, _) = dashboard();
        let service = FixedService {
            outcome: Ok(AnalysisResult::default()),
        };
        let older = dashboard.analyze_image(ImageUpload::new("old.png", vec![0; 5]));
        let newer = dashboard.analyze_image(ImageUpload::new("new.png", vec![0; 40]));

        let done = newer.run(&service).await;
        let analysis = dashboard.finish_image(done).unwrap();
        assert_eq!(analysis.risk_level(), RiskLevel::High);
        let stale = older.run(&service).await;
        assert!(dashboard.finish_image(stale).is_none());
        assert_eq!(dashboard.image_analysis().unwrap().0, "new.png");
        assert!(!dashboard.is_loading());
    }

    #[tokio::test]
    async fn clearing_drops_an_image_answer_still_in_flight() {
        let (mut dashboard, _) = dashboard();
        let service = FixedService {
            outcome: Ok(AnalysisResult::default()),
        };
        let pending = dashboard.analyze_image(ImageUpload::new("scene.png", vec![0; 12]));
        dashboard.clear();

        let done = pending.run(&service).await;
        assert!(dashboard.finish_image(done).is_none());
        assert!(dashboard.image_analysis().is_none());
    }

    #[tokio::test]
    async fn monitoring_without_an_area_scans_the_viewport() {
        let (mut dashboard, _) = dashboard();
        let service = FixedService {
            outcome: Ok(two_sites()),
        };
        let center = dashboard.view().center;

        let first = dashboard.toggle_monitoring().unwrap();
        assert!(dashboard.is_monitoring());
        let ring = first.request.coordinates.points().to_vec();
        assert_eq!(ring.len(), 4);
        assert!(ring.iter().any(|corner| corner.lat < center.lat && corner.lng < center.lng));
        assert!(ring.iter().any(|corner| corner.lat > center.lat && corner.lng > center.lng));

        let second = dashboard.monitor_tick().unwrap();
        let stale = first.run(&service).await;
        assert_eq!(dashboard.finish(stale).unwrap(), RenderOutcome::Stale);
        let fresh = second.run(&service).await;
        dashboard.finish(fresh).unwrap();
        assert_eq!(dashboard.overlays().count(), 2);

        assert!(dashboard.toggle_monitoring().is_none());
        assert!(!dashboard.is_monitoring());
        assert_eq!(dashboard.overlays().count(), 0);
        assert!(dashboard.monitor_tick().is_none());
    }

    #[tokio::test]
    async fn monitoring_follows_the_selected_area_until_the_mode_changes() {
        let (mut dashboard, _) = dashboard();
        let service = FixedService {
            outcome: Ok(two_sites()),
        };
        let drawn = draw_triangle(&mut dashboard).unwrap();
        let area = drawn.request.coordinates.clone();
        let done = drawn.run(&service).await;
        dashboard.finish(done).unwrap();

        let pending = dashboard.toggle_monitoring().unwrap();
        assert_eq!(pending.request.coordinates, area);
        let tick = dashboard.monitor_tick().unwrap();
        assert_eq!(tick.request.coordinates, area);

        dashboard.set_mode(DetectionMode::Water);
        assert!(!dashboard.is_monitoring());
        assert!(dashboard.monitor_tick().is_none());
        let late = tick.run(&service).await;
        assert_eq!(dashboard.finish(late).unwrap(), RenderOutcome::Stale);
    }

    #[test]
    fn viewport_ring_is_clamped_to_the_globe() {
        let view = MapView {
            center: Coordinate::new(20.0, 78.0),
            zoom: 0,
        };
        let ring = view.viewport_ring(1024.0, 768.0).unwrap();
        for corner in ring.points() {
            assert!(corner.is_valid());
        }
        let close = MapView { zoom: 12, ..view };
        let ring = close.viewport_ring(800.0, 600.0).unwrap();
        assert!(ring.points().iter().all(|c| (c.lat - 20.0).abs() < 0.2));
        assert!(view.viewport_ring(0.0, 0.0).is_err());
    }

    #[test]
    fn clear_resets_everything_and_is_repeatable() {
        let (mut dashboard, _) = dashboard();
        let _pending = draw_triangle(&mut dashboard);
        for _ in 0..2 {
            dashboard.clear();
            assert_eq!(dashboard.overlays().count(), 0);
            assert!(dashboard.selected_area().is_none());
            assert_eq!(dashboard.selection_state(), SelectionState::Idle);
        }
    }
}
