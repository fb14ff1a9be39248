//! Chart rendering and manifest parsing for testrun charts

mod chart;
mod manifest;

pub use chart::{ChartRenderer, MiniJinjaChartRenderer};
pub use manifest::parse_testruns;
