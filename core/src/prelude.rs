use crate::model::{AnalysisRequest, AnalysisResult, Coordinate, ImageAnalysis, ImageUpload};
use std::future::Future;

/// A user-drawn shape that cannot be submitted.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs at least 3 distinct points, got {0}")]
    TooFewPoints(usize),
    #[error("point {index} is out of range: {coordinate}")]
    OutOfRange { index: usize, coordinate: Coordinate },
}

/// Failures of a single analysis request. None of them are retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("server returned {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("unexpected response: {0}")]
    ParseError(String),
}

/// A result whose shape the renderer refuses to draw.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("risk counts sum to {sum} but total is {total}")]
    CountMismatch { total: u32, sum: u64 },
    #[error("expected {expected} detected areas, got {actual}")]
    SiteCountMismatch { expected: usize, actual: usize },
    #[error("site {id}: {reason}")]
    InvalidSite { id: String, reason: String },
}

/// Everything the dashboard can report to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("invalid area: {0}")]
    InvalidGeometry(#[from] GeometryError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("could not display results: {0}")]
    Render(#[from] RenderError),
}

pub type ClientResult<T> = Result<T, AnalysisError>;

/// Anything that can answer an analysis request: the HTTP client or the
/// in-process mock generator.
pub trait AnalysisService {
    fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = ClientResult<AnalysisResult>> + Send;

    fn analyze_image(
        &self,
        upload: &ImageUpload,
    ) -> impl Future<Output = ClientResult<ImageAnalysis>> + Send;
}
