use tracing::trace;

use crate::{PlotPoint, ScreenPoint, Viewport};

/// Target distance between neighbouring grid lines, in pixels.
pub const DEFAULT_PIXELS_PER_LINE: f64 = 100.0;
/// Upper bound on lines per axis.
pub const MAX_LINES: usize = 1000;

/// Picks a `1`, `2` or `5` times `10^k` world step so that lines land about
/// `pixels_per_line` pixels apart at the given scale.
///
/// The step never grows as `scale` grows.
pub fn grid_step(scale: f64, pixels_per_line: f64) -> f64 {
    let target = pixels_per_line / scale;
    if !(target.is_finite() && target > 0.0) {
        return f64::NAN;
    }
    let mut k = target.log10().floor() as i32;
    // log10 is not exact around powers of ten
    if decimal(1.0, k + 1) <= target {
        k += 1;
    } else if decimal(1.0, k) > target {
        k -= 1;
    }
    let ratio = target / decimal(1.0, k);
    let mantissa = if ratio > 5.0 {
        5.0
    } else if ratio > 2.0 {
        2.0
    } else {
        1.0
    };
    decimal(mantissa, k)
}

/// `mantissa * 10^k`, rounded once.
fn decimal(mantissa: f64, k: i32) -> f64 {
    if k >= 0 {
        mantissa * 10f64.powi(k)
    } else {
        mantissa / 10f64.powi(-k)
    }
}

/// Tick label for a grid line, or `None` for the line through the origin.
pub fn format_label(value: f64) -> Option<String> {
    let magnitude = value.abs();
    if magnitude <= 1e-10 || !value.is_finite() {
        return None;
    }
    if magnitude >= 1e6 || magnitude < 1e-3 {
        Some(format!("{value:.2e}"))
    } else {
        Some(format_general(value, 6))
    }
}

/// Fixed notation with `digits` significant digits and no trailing zeros.
fn format_general(value: f64, digits: usize) -> String {
    let scientific = format!("{:.*e}", digits - 1, value);
    let exponent: i32 = scientific
        .rsplit_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    let fixed = format!("{value:.decimals$}");
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridLine {
    /// Position along the axis in world units.
    pub world: f64,
    /// Position along the axis in pixels.
    pub screen: f64,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridPlan {
    pub step: f64,
    /// Lines of constant x, left to right.
    pub vertical: Vec<GridLine>,
    /// Lines of constant y, bottom to top.
    pub horizontal: Vec<GridLine>,
    /// Screen position of the world origin; the axes run through it.
    pub origin: ScreenPoint,
}

fn lines(min: f64, max: f64, step: f64, to_screen: impl Fn(f64) -> f64) -> Vec<GridLine> {
    if !(step.is_finite() && step > 0.0 && min.is_finite() && max.is_finite()) {
        return Vec::new();
    }
    let first = (min / step).floor() * step;
    let mut last = f64::NEG_INFINITY;
    (0..MAX_LINES)
        .map(|i| first + i as f64 * step)
        .take_while(|world| *world <= max)
        // steps below float precision at this magnitude repeat positions
        .filter(|world| {
            let fresh = *world > last;
            last = *world;
            fresh
        })
        .map(|world| GridLine {
            world,
            screen: to_screen(world),
            label: format_label(world),
        })
        .collect()
}

/// Lays out the grid for one frame.
pub fn plan(viewport: &Viewport, pixels_per_line: f64) -> GridPlan {
    #[cfg(feature = "tracy")]
    profiling::scope!("grid::plan");
    let step = grid_step(viewport.scale(), pixels_per_line);
    let bounds = viewport.visible_bounds();
    let vertical = lines(bounds.min.x, bounds.max.x, step, |x| {
        viewport.to_screen(PlotPoint::new(x, 0.0)).x
    });
    let horizontal = lines(bounds.min.y, bounds.max.y, step, |y| {
        viewport.to_screen(PlotPoint::new(0.0, y)).y
    });
    trace!(step, vertical = vertical.len(), horizontal = horizontal.len(), "planned grid");
    GridPlan {
        step,
        vertical,
        horizontal,
        origin: viewport.to_screen(PlotPoint::default()),
    }
}
