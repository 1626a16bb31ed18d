//! Seams between the dashboard logic and the widgets it drives.
//!
//! Components receive the surface they control at construction time; the
//! in-memory implementations here back both the desktop visualizer and the
//! tests.

pub mod draw;
pub mod layers;
pub mod scene;

pub use draw::PolygonDraft;
pub use layers::BaseLayer;
pub use scene::{ChartBoard, MarkerScene, StatPanel};

use crate::model::Coordinate;
use crate::render::charts::{ChartKind, ChartSeries};
use crate::render::style::{ImpactCircle, MarkerIcon, Popup};

/// Events emitted by the map's drawing tool.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    DrawStart,
    DrawStop,
    ShapeCreated(Vec<Coordinate>),
}

/// Polygon drawing tool plus the layer holding the drawn shape.
pub trait DrawTool {
    fn enable(&mut self);
    fn disable(&mut self);
    fn clear_shape(&mut self);
    fn is_enabled(&self) -> bool;
}

/// Opaque handle of an overlay added to a [`MarkerLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// Marker, impact circle and popup drawn for one detection site.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteOverlay {
    pub site_id: String,
    pub position: Coordinate,
    pub icon: MarkerIcon,
    pub circle: ImpactCircle,
    pub popup: Popup,
}

/// Map layer that detection overlays are drawn on.
pub trait MarkerLayer {
    fn add(&mut self, overlay: SiteOverlay) -> OverlayId;
    fn remove(&mut self, id: OverlayId);
}

/// The four numeric counters of the stats panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    TotalSites,
    HighRisk,
    MediumRisk,
    LowRisk,
}

impl StatKind {
    pub const ALL: [StatKind; 4] = [
        StatKind::TotalSites,
        StatKind::HighRisk,
        StatKind::MediumRisk,
        StatKind::LowRisk,
    ];

    pub fn index(&self) -> usize {
        match self {
            StatKind::TotalSites => 0,
            StatKind::HighRisk => 1,
            StatKind::MediumRisk => 2,
            StatKind::LowRisk => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatKind::TotalSites => "Total Sites",
            StatKind::HighRisk => "High Risk",
            StatKind::MediumRisk => "Medium Risk",
            StatKind::LowRisk => "Low Risk",
        }
    }
}

pub trait StatDisplay {
    fn show(&mut self, stat: StatKind, value: u32);
}

pub trait ChartSurface {
    fn update(&mut self, chart: ChartKind, series: ChartSeries);
    fn reset(&mut self);
}
