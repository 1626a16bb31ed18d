pub mod request;
pub mod result;
pub mod site;

pub use request::{AnalysisRequest, AnalysisSettings, ImageUpload, PolygonRing, TimeRange};
pub use result::{risk_from_percentage, AnalysisResult, ImageAnalysis};
pub use site::{AreaUnit, Coordinate, DetectionMode, DetectionSite, RiskLevel};
