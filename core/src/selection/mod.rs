pub mod controller;

pub use controller::{AreaSelectionController, SelectionState};
