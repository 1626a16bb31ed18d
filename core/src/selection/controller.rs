use crate::model::{AnalysisRequest, AnalysisSettings, Coordinate, PolygonRing};
use crate::prelude::GeometryError;
use crate::surface::DrawTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Selecting,
    Submitted,
}

/// Drives the polygon tool: `Idle → Selecting → Submitted → Idle`.
pub struct AreaSelectionController<D> {
    tool: D,
    state: SelectionState,
    last_ring: Option<PolygonRing>,
}

impl<D: DrawTool> AreaSelectionController<D> {
    pub fn new(tool: D) -> Self {
        Self {
            tool,
            state: SelectionState::Idle,
            last_ring: None,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_selecting(&self) -> bool {
        self.state == SelectionState::Selecting
    }

    /// Enters or cancels selection mode. Ignored while a request is pending.
    pub fn toggle(&mut self) -> SelectionState {
        match self.state {
            SelectionState::Idle => {
                self.tool.enable();
                self.state = SelectionState::Selecting;
            }
            SelectionState::Selecting => {
                self.tool.disable();
                self.state = SelectionState::Idle;
            }
            SelectionState::Submitted => {}
        }
        self.state
    }

    pub fn draw_started(&mut self) {
        self.tool.clear_shape();
    }

    /// Draw tool stopped on its own (e.g. escape pressed).
    pub fn draw_stopped(&mut self) {
        if self.state == SelectionState::Selecting && !self.tool.is_enabled() {
            self.state = SelectionState::Idle;
        }
    }

    /// Validates a completed shape and builds the request for it.
    pub fn shape_created(
        &mut self,
        points: Vec<Coordinate>,
        settings: &AnalysisSettings,
    ) -> Result<AnalysisRequest, GeometryError> {
        self.tool.disable();
        match PolygonRing::new(points) {
            Ok(ring) => {
                self.state = SelectionState::Submitted;
                self.last_ring = Some(ring.clone());
                Ok(AnalysisRequest::new(ring, settings))
            }
            Err(err) => {
                self.tool.clear_shape();
                self.state = SelectionState::Idle;
                Err(err)
            }
        }
    }

    /// Rebuilds the request for the last submitted area with new settings.
    pub fn resubmit(&mut self, settings: &AnalysisSettings) -> Option<AnalysisRequest> {
        if self.state == SelectionState::Selecting {
            return None;
        }
        let ring = self.last_ring.clone()?;
        self.state = SelectionState::Submitted;
        Some(AnalysisRequest::new(ring, settings))
    }

    /// The pending request finished, successfully or not.
    pub fn settle(&mut self) {
        if self.state == SelectionState::Submitted {
            self.state = SelectionState::Idle;
        }
    }

    /// Forgets the last area, e.g. when the view is cleared.
    pub fn forget_area(&mut self) {
        self.last_ring = None;
        self.tool.clear_shape();
    }

    pub fn last_ring(&self) -> Option<&PolygonRing> {
        self.last_ring.as_ref()
    }

    pub fn tool(&self) -> &D {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut D {
        &mut self.tool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PolygonDraft;

    fn triangle() -> Vec<Coordinate> {
        vec![
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 11.0),
            Coordinate::new(11.0, 11.0),
        ]
    }

    #[test]
    fn toggle_enters_and_cancels_selection() {
        let mut controller = AreaSelectionController::new(PolygonDraft::new());
        assert_eq!(controller.toggle(), SelectionState::Selecting);
        assert!(controller.tool().is_enabled());
        assert_eq!(controller.toggle(), SelectionState::Idle);
        assert!(!controller.tool().is_enabled());
    }

    #[test]
    fn toggle_is_ignored_while_submitted() {
        let mut controller = AreaSelectionController::new(PolygonDraft::new());
        controller.toggle();
        controller
            .shape_created(triangle(), &AnalysisSettings::default())
            .unwrap();
        assert_eq!(controller.toggle(), SelectionState::Submitted);
        controller.settle();
        assert_eq!(controller.state(), SelectionState::Idle);
    }

    #[test]
    fn valid_shape_builds_a_request_with_current_settings() {
        let mut controller = AreaSelectionController::new(PolygonDraft::new());
        controller.toggle();
        let settings = AnalysisSettings {
            sensitivity: 0.3,
            ..AnalysisSettings::default()
        };
        let request = controller.shape_created(triangle(), &settings).unwrap();
        assert_eq!(request.coordinates.points().len(), 3);
        assert_eq!(request.sensitivity, 0.3);
        assert_eq!(controller.state(), SelectionState::Submitted);
        assert!(!controller.tool().is_enabled());
    }

    #[test]
    fn invalid_shape_returns_to_idle() {
        let mut controller = AreaSelectionController::new(PolygonDraft::new());
        controller.toggle();
        let err = controller
            .shape_created(triangle()[..2].to_vec(), &AnalysisSettings::default())
            .unwrap_err();
        assert_eq!(err, GeometryError::TooFewPoints(2));
        assert_eq!(controller.state(), SelectionState::Idle);
        assert!(controller.last_ring().is_none());
        assert!(controller.tool().shape().is_none());
    }

    #[test]
    fn resubmit_reuses_the_last_area() {
        let mut controller = AreaSelectionController::new(PolygonDraft::new());
        assert!(controller.resubmit(&AnalysisSettings::default()).is_none());
        controller.toggle();
        controller
            .shape_created(triangle(), &AnalysisSettings::default())
            .unwrap();
        controller.settle();
        let request = controller.resubmit(&AnalysisSettings::default()).unwrap();
        assert_eq!(request.coordinates.points(), &triangle()[..]);
    }
}
