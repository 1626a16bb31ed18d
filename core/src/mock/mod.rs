//! Randomized detection results for demos and for the simulator backend.

pub mod generator;
pub mod service;

pub use generator::{generate, GeneratorConfig};
pub use service::MockAnalysisService;
