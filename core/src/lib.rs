//! Client-side core of the Canopy Watch dashboard.
//!
//! The modules cover the area-selection workflow, the analysis client and its
//! mock substitute, and the renderer that keeps map markers, stat counters and
//! chart series in step with the last applied result.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod mock;
pub mod model;
pub mod prelude;
pub mod render;
pub mod selection;
pub mod surface;
pub mod telemetry;

pub use prelude::{AnalysisError, AnalysisService, DashboardError, GeometryError, RenderError};
