use tracing::trace;

use crate::{PlotError, PlotPoint, PlotRect, PlotResult, ScreenPoint};

pub const DEFAULT_ZOOM_FACTOR: f64 = 1.1;
pub const DEFAULT_MIN_SCALE: f64 = 1e-6;
pub const DEFAULT_MAX_SCALE: f64 = 1e9;

/// The visible window onto the graph.
///
/// `scale` is in pixels per world unit. Zooming only ever changes `scale`
/// and panning only ever moves `center`, so repeated gestures do not
/// accumulate rounding error in the visible bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    center: PlotPoint,
    scale: f64,
    width: u32,
    height: u32,
    zoom_factor: f64,
    min_scale: f64,
    max_scale: f64,
}

fn check_size(width: u32, height: u32) -> PlotResult<()> {
    if width == 0 || height == 0 {
        return Err(PlotError::EmptyViewport { width, height });
    }
    Ok(())
}

impl Viewport {
    pub fn new(width: u32, height: u32, center: PlotPoint, scale: f64) -> PlotResult<Self> {
        check_size(width, height)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(PlotError::InvalidScale(scale));
        }
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(PlotError::config("center must be finite"));
        }
        Ok(Viewport {
            center,
            scale: scale.clamp(DEFAULT_MIN_SCALE, DEFAULT_MAX_SCALE),
            width,
            height,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
        })
    }

    /// Replaces the per-notch zoom factor and the scale limits.
    pub fn with_zoom(mut self, factor: f64, min_scale: f64, max_scale: f64) -> PlotResult<Self> {
        if !(factor.is_finite() && factor > 1.0) {
            return Err(PlotError::zoom(format!("factor must be above 1, got {factor}")));
        }
        if !(min_scale > 0.0 && min_scale <= max_scale && max_scale.is_finite()) {
            return Err(PlotError::zoom(format!(
                "scale limits must satisfy 0 < min <= max, got [{min_scale}, {max_scale}]"
            )));
        }
        self.zoom_factor = factor;
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self.scale = self.scale.clamp(min_scale, max_scale);
        Ok(self)
    }

    pub fn center(&self) -> PlotPoint {
        self.center
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn to_screen(&self, p: PlotPoint) -> ScreenPoint {
        ScreenPoint {
            x: (p.x - self.center.x) * self.scale + self.width as f64 / 2.0,
            y: self.height as f64 / 2.0 - (p.y - self.center.y) * self.scale,
        }
    }

    pub fn to_world(&self, p: ScreenPoint) -> PlotPoint {
        PlotPoint {
            x: (p.x - self.width as f64 / 2.0) / self.scale + self.center.x,
            y: (self.height as f64 / 2.0 - p.y) / self.scale + self.center.y,
        }
    }

    /// World x at the left edge of a pixel column.
    pub fn column_to_world_x(&self, column: u32) -> f64 {
        (column as f64 - self.width as f64 / 2.0) / self.scale + self.center.x
    }

    /// World rectangle covered by the screen.
    pub fn visible_bounds(&self) -> PlotRect {
        let top_left = self.to_world(ScreenPoint::new(0.0, 0.0));
        let bottom_right = self.to_world(ScreenPoint::new(self.width as f64, self.height as f64));
        PlotRect {
            min: PlotPoint::new(top_left.x, bottom_right.y),
            max: PlotPoint::new(bottom_right.x, top_left.y),
        }
    }

    /// Drags the graph by a pixel delta; the content follows the pointer.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.center.x -= dx / self.scale;
        self.center.y += dy / self.scale;
    }

    /// Zooms by `zoom_factor` per wheel notch, keeping the world point under
    /// `cursor` where it is on screen. Positive notches zoom in.
    pub fn zoom_at(&mut self, cursor: ScreenPoint, notches: f64) {
        if !notches.is_finite() || notches == 0.0 {
            return;
        }
        let before = self.to_world(cursor);
        self.scale = (self.scale * self.zoom_factor.powf(notches)).clamp(self.min_scale, self.max_scale);
        let after = self.to_world(cursor);
        self.center.x += before.x - after.x;
        self.center.y += before.y - after.y;
        trace!(scale = self.scale, x = self.center.x, y = self.center.y, "zoomed");
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            center: PlotPoint::default(),
            scale: 40.0,
            width: 800,
            height: 600,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn viewports() -> Vec<Viewport> {
        let mut out = Vec::new();
        for &(cx, cy) in &[(0.0, 0.0), (12.5, -3.0), (-1e4, 2e3)] {
            for &scale in &[0.01, 1.0, 40.0, 12345.0] {
                for &(w, h) in &[(800, 600), (1, 1), (1921, 1079)] {
                    out.push(Viewport::new(w, h, PlotPoint::new(cx, cy), scale).unwrap());
                }
            }
        }
        out
    }

    #[test]
    fn screen_world_round_trip() {
        for vp in viewports() {
            for i in 0..=10 {
                for j in 0..=10 {
                    let p = ScreenPoint::new(
                        vp.width() as f64 * i as f64 / 10.0,
                        vp.height() as f64 * j as f64 / 10.0,
                    );
                    let back = vp.to_screen(vp.to_world(p));
                    assert!(close(back.x, p.x, 1e-4) && close(back.y, p.y, 1e-4), "{vp:?} {p:?} {back:?}");
                }
            }
        }
    }

    #[test]
    fn world_screen_round_trip() {
        let vp = Viewport::new(800, 600, PlotPoint::new(3.0, -2.0), 40.0).unwrap();
        let p = PlotPoint::new(-7.25, 11.5);
        let back = vp.to_world(vp.to_screen(p));
        assert!(close(back.x, p.x, 1e-9) && close(back.y, p.y, 1e-9));
    }

    #[test]
    fn center_maps_to_middle_and_y_points_down() {
        let vp = Viewport::new(800, 600, PlotPoint::new(1.0, 1.0), 40.0).unwrap();
        assert_eq!(vp.to_screen(PlotPoint::new(1.0, 1.0)), ScreenPoint::new(400.0, 300.0));
        assert_eq!(vp.to_screen(PlotPoint::new(2.0, 2.0)), ScreenPoint::new(440.0, 260.0));
    }

    #[test]
    fn visible_bounds_cover_screen() {
        let vp = Viewport::default();
        let bounds = vp.visible_bounds();
        assert_eq!(bounds.min, PlotPoint::new(-10.0, -7.5));
        assert_eq!(bounds.max, PlotPoint::new(10.0, 7.5));
        assert_eq!(bounds.width(), 20.0);
    }

    #[test]
    fn pan_is_scale_invariant_in_pixels() {
        for scale in [1.0, 40.0, 500.0] {
            let mut vp = Viewport::new(800, 600, PlotPoint::default(), scale).unwrap();
            let anchor = PlotPoint::new(1.0, 1.0);
            let before = vp.to_screen(anchor);
            vp.pan(25.0, -10.0);
            let after = vp.to_screen(anchor);
            assert!(close(after.x - before.x, 25.0, 1e-9));
            assert!(close(after.y - before.y, -10.0, 1e-9));
        }
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut vp = Viewport::default();
        let cursor = ScreenPoint::new(613.0, 97.0);
        let anchor = vp.to_world(cursor);
        vp.zoom_at(cursor, 1.0);
        assert!(close(vp.scale(), 44.0, 1e-9));
        let moved = vp.to_world(cursor);
        assert!(close(moved.x, anchor.x, 1e-9) && close(moved.y, anchor.y, 1e-9));

        vp.zoom_at(cursor, -3.0);
        let moved = vp.to_world(cursor);
        assert!(close(moved.x, anchor.x, 1e-9) && close(moved.y, anchor.y, 1e-9));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::default().with_zoom(2.0, 10.0, 80.0).unwrap();
        let cursor = ScreenPoint::new(400.0, 300.0);
        vp.zoom_at(cursor, 10.0);
        assert_eq!(vp.scale(), 80.0);
        vp.zoom_at(cursor, -10.0);
        assert_eq!(vp.scale(), 10.0);
        vp.zoom_at(cursor, f64::NAN);
        assert_eq!(vp.scale(), 10.0);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            Viewport::new(0, 10, PlotPoint::default(), 1.0),
            Err(PlotError::EmptyViewport { .. })
        ));
        assert!(matches!(
            Viewport::new(10, 10, PlotPoint::default(), 0.0),
            Err(PlotError::InvalidScale(_))
        ));
        assert!(Viewport::new(10, 10, PlotPoint::default(), f64::INFINITY).is_err());
        assert!(Viewport::default().with_zoom(1.0, 1.0, 2.0).is_err());
        assert!(Viewport::default().with_zoom(1.1, 3.0, 2.0).is_err());
        assert!(matches!(
            Viewport::new(0, 10, PlotPoint::default(), 1.0),
            Err(PlotError::EmptyViewport { width: 0, height: 10 })
        ));
    }
}
