use crate::model::Coordinate;
use crate::render::charts::{ChartKind, ChartSeries};
use crate::surface::{ChartSurface, MarkerLayer, OverlayId, SiteOverlay, StatDisplay, StatKind};
use std::collections::{BTreeMap, HashMap};

/// Retained set of overlays currently on the map.
#[derive(Debug, Clone, Default)]
pub struct MarkerScene {
    overlays: BTreeMap<OverlayId, SiteOverlay>,
    next_id: u64,
}

impl MarkerScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn overlays(&self) -> impl Iterator<Item = &SiteOverlay> {
        self.overlays.values()
    }

    /// Closest overlay within `tolerance_deg` of `point`.
    pub fn hit_test(&self, point: Coordinate, tolerance_deg: f64) -> Option<&SiteOverlay> {
        self.overlays
            .values()
            .map(|overlay| {
                let d_lat = overlay.position.lat - point.lat;
                let d_lng = overlay.position.lng - point.lng;
                (overlay, (d_lat * d_lat + d_lng * d_lng).sqrt())
            })
            .filter(|(_, distance)| *distance <= tolerance_deg)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(overlay, _)| overlay)
    }
}

impl MarkerLayer for MarkerScene {
    fn add(&mut self, overlay: SiteOverlay) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.overlays.insert(id, overlay);
        id
    }

    fn remove(&mut self, id: OverlayId) {
        self.overlays.remove(&id);
    }
}

/// Displayed values of the four stat counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatPanel {
    values: [u32; 4],
}

impl StatPanel {
    pub fn value(&self, stat: StatKind) -> u32 {
        self.values[stat.index()]
    }
}

impl StatDisplay for StatPanel {
    fn show(&mut self, stat: StatKind, value: u32) {
        self.values[stat.index()] = value;
    }
}

/// Latest series pushed to each chart.
#[derive(Debug, Clone, Default)]
pub struct ChartBoard {
    charts: HashMap<ChartKind, ChartSeries>,
}

impl ChartBoard {
    pub fn series(&self, chart: ChartKind) -> Option<&ChartSeries> {
        self.charts.get(&chart)
    }
}

impl ChartSurface for ChartBoard {
    fn update(&mut self, chart: ChartKind, series: ChartSeries) {
        self.charts.insert(chart, series);
    }

    fn reset(&mut self) {
        self.charts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectionMode, DetectionSite, RiskLevel};
    use crate::render::style::{ImpactCircle, MarkerIcon, Popup};

    fn overlay(id: &str, lat: f64, lng: f64) -> SiteOverlay {
        let site = DetectionSite::new(id, Coordinate::new(lat, lng), 0.8, RiskLevel::High, 1.0);
        SiteOverlay {
            site_id: site.id.clone(),
            position: site.coordinates,
            icon: MarkerIcon::for_site(&site),
            circle: ImpactCircle::for_site(&site),
            popup: Popup::for_site(&site, DetectionMode::Deforestation),
        }
    }

    #[test]
    fn hit_test_picks_the_closest_overlay_in_range() {
        let mut scene = MarkerScene::new();
        scene.add(overlay("near", 10.0, 10.0));
        let far = scene.add(overlay("far", 10.3, 10.0));

        let hit = scene.hit_test(Coordinate::new(10.1, 10.0), 0.5).unwrap();
        assert_eq!(hit.site_id, "near");
        assert!(scene.hit_test(Coordinate::new(12.0, 12.0), 0.5).is_none());

        scene.remove(far);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn chart_board_reset_drops_every_series() {
        let mut board = ChartBoard::default();
        board.update(
            ChartKind::RiskDistribution,
            ChartSeries::new("Risk", vec!["High".into()], vec![1.0]),
        );
        assert!(board.series(ChartKind::RiskDistribution).is_some());
        board.reset();
        assert!(board.series(ChartKind::RiskDistribution).is_none());
    }
}
