use crate::model::{AnalysisResult, DetectionMode, DetectionSite, TimeRange};
use crate::prelude::RenderError;
use crate::render::charts::{self, ChartFeed, ChartKind};
use crate::render::counter::{Clock, MonotonicClock, StatBoard};
use crate::render::style::{ImpactCircle, MarkerIcon, Popup};
use crate::surface::{
    ChartSurface, MarkerLayer, OverlayId, SiteOverlay, StatDisplay, StatKind,
};
use chrono::Local;

/// Identifies one issued analysis request. Only the most recent ticket may
/// change what the renderer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub seq: u64,
    pub mode: DetectionMode,
}

/// Aggregate shown for water-mode results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterSummary {
    pub reservoirs: usize,
    pub total_volume_m3: f64,
}

impl WaterSummary {
    fn from_sites(sites: &[DetectionSite]) -> Self {
        Self {
            reservoirs: sites.len(),
            total_volume_m3: sites.iter().filter_map(|site| site.volume).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Applied {
        markers: usize,
        water: Option<WaterSummary>,
    },
    /// A newer request was issued (or the view was cleared) after this one.
    Stale,
}

/// Sole owner of the detection overlays, stat counters and chart series.
pub struct ResultRenderer<L, S, C, K = MonotonicClock> {
    layer: L,
    stats: S,
    charts: C,
    clock: K,
    board: StatBoard,
    feed: ChartFeed,
    active: Vec<(String, OverlayId)>,
    result: Option<AnalysisResult>,
    latest_seq: u64,
}

impl<L, S, C> ResultRenderer<L, S, C, MonotonicClock>
where
    L: MarkerLayer,
    S: StatDisplay,
    C: ChartSurface,
{
    pub fn new(layer: L, stats: S, charts: C) -> Self {
        Self::with_parts(layer, stats, charts, MonotonicClock, ChartFeed::from_entropy())
    }
}

impl<L, S, C, K> ResultRenderer<L, S, C, K>
where
    L: MarkerLayer,
    S: StatDisplay,
    C: ChartSurface,
    K: Clock,
{
    pub fn with_parts(layer: L, stats: S, charts: C, clock: K, feed: ChartFeed) -> Self {
        Self {
            layer,
            stats,
            charts,
            clock,
            board: StatBoard::default(),
            feed,
            active: Vec::new(),
            result: None,
            latest_seq: 0,
        }
    }

    /// Issues the ticket for a new request, superseding every earlier one.
    pub fn issue(&mut self, mode: DetectionMode) -> RequestTicket {
        self.latest_seq += 1;
        RequestTicket {
            seq: self.latest_seq,
            mode,
        }
    }

    /// Makes every outstanding ticket stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest_seq += 1;
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    /// Applies `result` if `ticket` is still the latest request.
    pub fn apply(
        &mut self,
        ticket: RequestTicket,
        result: AnalysisResult,
        range: &TimeRange,
    ) -> Result<RenderOutcome, RenderError> {
        if !self.is_current(ticket) {
            log::debug!("discarding stale result for request {}", ticket.seq);
            return Ok(RenderOutcome::Stale);
        }
        self.render(result, ticket.mode, range)
    }

    /// Replaces the rendered result. A malformed result is rejected before
    /// anything on screen changes.
    pub fn render(
        &mut self,
        mut result: AnalysisResult,
        mode: DetectionMode,
        range: &TimeRange,
    ) -> Result<RenderOutcome, RenderError> {
        result.validate()?;
        result.assign_missing_ids();

        self.clear_overlays();
        for site in &result.detected_areas {
            let overlay = SiteOverlay {
                site_id: site.id.clone(),
                position: site.coordinates,
                icon: MarkerIcon::for_site(site),
                circle: ImpactCircle::for_site(site),
                popup: Popup::for_site(site, mode),
            };
            let id = self.layer.add(overlay);
            self.active.push((site.id.clone(), id));
        }

        let now = self.clock.now();
        for (stat, value) in [
            (StatKind::TotalSites, result.total_sites),
            (StatKind::HighRisk, result.high_risk),
            (StatKind::MediumRisk, result.medium_risk),
            (StatKind::LowRisk, result.low_risk),
        ] {
            self.board.animate_to(stat, value, now);
        }
        self.board.tick(now, &mut self.stats);

        let wall = Local::now();
        self.charts
            .update(ChartKind::RiskDistribution, charts::risk_distribution(&result));
        self.charts
            .update(ChartKind::Trend, self.feed.trend(mode, range, wall));
        self.charts
            .update(ChartKind::Impact, self.feed.impact(mode, range, wall));

        let water = (mode == DetectionMode::Water)
            .then(|| WaterSummary::from_sites(&result.detected_areas));
        let markers = self.active.len();
        log::info!(
            "rendered {} {} sites ({} high / {} medium / {} low)",
            markers,
            mode.as_str(),
            result.high_risk,
            result.medium_risk,
            result.low_risk
        );
        self.result = Some(result);
        Ok(RenderOutcome::Applied { markers, water })
    }

    /// Advances the counter animations. Returns whether any are still running.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        self.board.tick(now, &mut self.stats);
        self.board.is_animating()
    }

    /// Removes every overlay, zeroes the counters and resets the charts.
    /// Outstanding requests become stale.
    pub fn clear(&mut self) {
        self.invalidate();
        self.clear_overlays();
        self.result = None;
        self.board.reset(&mut self.stats);
        self.charts.reset();
        self.charts.update(
            ChartKind::RiskDistribution,
            charts::risk_distribution(&AnalysisResult::default()),
        );
    }

    fn clear_overlays(&mut self) {
        for (_, id) in self.active.drain(..) {
            self.layer.remove(id);
        }
    }

    pub fn active_result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn marker_count(&self) -> usize {
        self.active.len()
    }

    pub fn displayed(&self, stat: StatKind) -> u32 {
        self.board.displayed(stat)
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn stats(&self) -> &S {
        &self.stats
    }

    pub fn charts(&self) -> &C {
        &self.charts
    }
}
