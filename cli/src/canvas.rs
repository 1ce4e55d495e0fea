use grapher::plot::{GridPlan, ScreenPoint, ShadeSpan, Trace, Viewport};

/// Character grid covering the viewport's pixels.
pub struct Canvas {
    cols: usize,
    rows: usize,
    width: f64,
    height: f64,
    cells: Vec<char>,
}

impl Canvas {
    pub fn new(cols: usize, rows: usize, viewport: &Viewport) -> Self {
        let (cols, rows) = (cols.max(1), rows.max(1));
        Canvas {
            cols,
            rows,
            width: viewport.width() as f64,
            height: viewport.height() as f64,
            cells: vec![' '; cols * rows],
        }
    }

    fn cell(&self, p: ScreenPoint) -> Option<(usize, usize)> {
        if !(p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y < self.height) {
            return None;
        }
        let col = ((p.x / self.width * self.cols as f64) as usize).min(self.cols - 1);
        let row = ((p.y / self.height * self.rows as f64) as usize).min(self.rows - 1);
        Some((col, row))
    }

    fn cell_size(&self) -> (f64, f64) {
        (self.width / self.cols as f64, self.height / self.rows as f64)
    }

    fn put(&mut self, p: ScreenPoint, c: char) {
        if let Some((col, row)) = self.cell(p) {
            self.cells[row * self.cols + col] = c;
        }
    }

    fn get(&self, col: usize, row: usize) -> char {
        self.cells[row * self.cols + col]
    }

    pub fn shade(&mut self, spans: &[ShadeSpan]) {
        let (_, cell_height) = self.cell_size();
        for span in spans {
            let mut y = span.top;
            while y < span.bottom {
                self.put(ScreenPoint::new(span.x, y), '.');
                y += cell_height;
            }
        }
    }

    /// Axes through the origin, with a tick at every grid line.
    pub fn axes(&mut self, grid: &GridPlan) {
        let (cell_width, cell_height) = self.cell_size();
        for row in 0..self.rows {
            let y = (row as f64 + 0.5) * cell_height;
            self.put(ScreenPoint::new(grid.origin.x, y), '|');
        }
        for col in 0..self.cols {
            let x = (col as f64 + 0.5) * cell_width;
            self.put(ScreenPoint::new(x, grid.origin.y), '-');
        }
        for line in &grid.vertical {
            self.put(ScreenPoint::new(line.screen, grid.origin.y), '+');
        }
        for line in &grid.horizontal {
            self.put(ScreenPoint::new(grid.origin.x, line.screen), '+');
        }
    }

    pub fn curve(&mut self, trace: &Trace) {
        let (cell_width, cell_height) = self.cell_size();
        for (a, b) in trace.segments() {
            let steps = ((b.x - a.x).abs() / cell_width)
                .max((b.y - a.y).abs() / cell_height)
                .ceil() as usize
                + 1;
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                self.put(ScreenPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t), '#');
            }
        }
        for p in trace.isolated() {
            self.put(p, '#');
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.cols + 1) * self.rows);
        for row in 0..self.rows {
            let line: String = (0..self.cols).map(|col| self.get(col, row)).collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use grapher::{plot::PlotPoint, Graph};

    use super::*;

    #[test]
    fn out_of_view_points_are_dropped() {
        let vp = Viewport::new(100, 50, PlotPoint::default(), 10.0).unwrap();
        let canvas = Canvas::new(10, 5, &vp);
        assert_eq!(canvas.cell(ScreenPoint::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(canvas.cell(ScreenPoint::new(99.9, 49.9)), Some((9, 4)));
        assert_eq!(canvas.cell(ScreenPoint::new(100.0, 0.0)), None);
        assert_eq!(canvas.cell(ScreenPoint::new(-0.1, 0.0)), None);
        assert_eq!(canvas.cell(ScreenPoint::new(f64::NAN, 0.0)), None);
    }

    #[test]
    fn draws_axes_and_curve() {
        let vp = Viewport::new(400, 400, PlotPoint::default(), 20.0).unwrap();
        let mut graph = Graph::new(vp, 100.0);
        graph.push("y = x");
        let frame = graph.frame();
        let mut canvas = Canvas::new(40, 20, graph.viewport());
        canvas.axes(&frame.grid);
        canvas.curve(&frame.curves[0].as_ref().unwrap().trace);
        let text = canvas.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[3].find('|'), Some(20));
        // step 2 at 20 px per unit puts a tick every 4 columns along the x axis
        for col in (0..40).step_by(4).filter(|col| !(16..=20).contains(col)) {
            assert_eq!(canvas.get(col, 10), '+', "column {col}");
            assert_eq!(canvas.get(col + 1, 10), '-', "column {}", col + 1);
        }
        // the diagonal reaches both corners
        assert_eq!(canvas.get(0, 19), '#');
        assert_eq!(canvas.get(39, 0), '#');
    }

    #[test]
    fn shading_fills_below() {
        let mut graph = Graph::default();
        graph.push("y < 0");
        let frame = graph.frame();
        let mut canvas = Canvas::new(20, 10, graph.viewport());
        canvas.shade(&frame.curves[0].as_ref().unwrap().trace.shade_spans());
        assert_eq!(canvas.get(3, 9), '.');
        assert_eq!(canvas.get(3, 5), '.');
        assert_eq!(canvas.get(3, 4), ' ');
    }
}
