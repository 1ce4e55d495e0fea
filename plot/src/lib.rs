//! World to screen mapping, grid planning and curve sampling for a 2D
//! function plotter.

mod config;
mod error;
pub mod grid;
mod point;
mod trace;
mod viewport;

pub use config::ViewportConfig;
pub use error::{PlotError, PlotResult};
pub use grid::{format_label, grid_step, GridLine, GridPlan};
pub use point::{PlotPoint, PlotRect, ScreenPoint};
pub use trace::{connects, Sample, ShadeSide, ShadeSpan, Shading, Trace};
pub use viewport::Viewport;
