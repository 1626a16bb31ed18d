use crate::model::Coordinate;
use crate::surface::{DrawTool, MapEvent};

/// In-memory polygon drawing tool: collects vertices while enabled and keeps
/// the last completed shape on the drawn-items layer.
#[derive(Debug, Clone, Default)]
pub struct PolygonDraft {
    enabled: bool,
    vertices: Vec<Coordinate>,
    shape: Option<Vec<Coordinate>>,
}

impl PolygonDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex. Returns `DrawStart` for the first vertex of a shape.
    pub fn push_vertex(&mut self, point: Coordinate) -> Option<MapEvent> {
        if !self.enabled {
            return None;
        }
        self.vertices.push(point);
        (self.vertices.len() == 1).then_some(MapEvent::DrawStart)
    }

    /// Closes the current shape and emits `ShapeCreated` with its ring.
    pub fn finish(&mut self) -> Option<MapEvent> {
        if !self.enabled || self.vertices.is_empty() {
            return None;
        }
        let ring = std::mem::take(&mut self.vertices);
        self.shape = Some(ring.clone());
        Some(MapEvent::ShapeCreated(ring))
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn shape(&self) -> Option<&[Coordinate]> {
        self.shape.as_deref()
    }
}

impl DrawTool for PolygonDraft {
    fn enable(&mut self) {
        self.enabled = true;
        self.vertices.clear();
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.vertices.clear();
    }

    fn clear_shape(&mut self) {
        self.shape = None;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
