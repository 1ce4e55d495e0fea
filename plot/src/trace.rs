use itertools::Itertools;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{PlotPoint, ScreenPoint, Viewport};

/// One evaluated pixel column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub world: PlotPoint,
    pub screen: ScreenPoint,
    /// False when the function produced NaN or an infinity here.
    pub finite: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadeSide {
    Above,
    Below,
}

/// How the region of an inequality is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shading {
    pub side: ShadeSide,
    /// Whether the boundary curve belongs to the region (`<=`, `>=`).
    pub inclusive: bool,
}

/// Vertical run of shaded pixels in one column, `top <= bottom` in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadeSpan {
    pub x: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Whether a segment may be drawn between two neighbouring samples.
///
/// Jumps taller than `max_jump` pixels are treated as asymptotes.
pub fn connects(prev: &Sample, next: &Sample, max_jump: f64) -> bool {
    prev.finite && next.finite && (next.screen.y - prev.screen.y).abs() <= max_jump
}

/// The sampled curve of one function across the viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    pub samples: Vec<Sample>,
    pub shading: Option<Shading>,
    height: f64,
}

impl Trace {
    /// Evaluates `f` once per pixel column, left to right.
    ///
    /// Columns are evaluated in parallel; `samples` is always in column order.
    pub fn sweep<F>(viewport: &Viewport, shading: Option<Shading>, f: F) -> Trace
    where
        F: Fn(f64) -> f64 + Sync,
    {
        #[cfg(feature = "tracy")]
        profiling::scope!("Trace::sweep");
        let samples = (0..viewport.width())
            .into_par_iter()
            .map(|column| {
                let x = viewport.column_to_world_x(column);
                let y = f(x);
                let world = PlotPoint::new(x, y);
                Sample {
                    world,
                    screen: viewport.to_screen(world),
                    finite: y.is_finite(),
                }
            })
            .collect();
        Trace {
            samples,
            shading,
            height: viewport.height() as f64,
        }
    }

    /// Line segments to draw, in screen space.
    pub fn segments(&self) -> Vec<(ScreenPoint, ScreenPoint)> {
        self.samples
            .iter()
            .tuple_windows()
            .filter(|(prev, next)| connects(prev, next, self.height))
            .map(|(prev, next)| (prev.screen, next.screen))
            .collect()
    }

    /// Samples that are finite but have no drawable segment on either side.
    pub fn isolated(&self) -> Vec<ScreenPoint> {
        let n = self.samples.len();
        (0..n)
            .filter(|&i| {
                let s = &self.samples[i];
                let left = i > 0 && connects(&self.samples[i - 1], s, self.height);
                let right = i + 1 < n && connects(s, &self.samples[i + 1], self.height);
                s.finite && !left && !right
            })
            .map(|i| self.samples[i].screen)
            .collect()
    }

    /// Shaded spans for an inequality, clipped to the screen.
    pub fn shade_spans(&self) -> Vec<ShadeSpan> {
        let Some(shading) = self.shading else {
            return Vec::new();
        };
        self.samples
            .iter()
            .filter(|s| s.finite)
            .map(|s| {
                let y = s.screen.y.clamp(0.0, self.height);
                match shading.side {
                    ShadeSide::Above => ShadeSpan {
                        x: s.screen.x,
                        top: 0.0,
                        bottom: y,
                    },
                    ShadeSide::Below => ShadeSpan {
                        x: s.screen.x,
                        top: y,
                        bottom: self.height,
                    },
                }
            })
            .filter(|span| span.bottom > span.top)
            .collect()
    }
}
