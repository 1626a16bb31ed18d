pub mod charts;
pub mod counter;
pub mod renderer;
pub mod style;

pub use charts::{ChartFeed, ChartKind, ChartSeries};
pub use counter::{Clock, MonotonicClock, StatBoard};
pub use renderer::{RenderOutcome, RequestTicket, ResultRenderer, WaterSummary};
pub use style::risk_color;
