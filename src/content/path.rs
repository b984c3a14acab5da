/// Affine matrix `[a b c d e f]` as used by `cm` and `Tm`
pub type Matrix = [f64; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `lhs` applied first, then `rhs`
pub fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    [
        lhs[0] * rhs[0] + lhs[1] * rhs[2],
        lhs[0] * rhs[1] + lhs[1] * rhs[3],
        lhs[2] * rhs[0] + lhs[3] * rhs[2],
        lhs[2] * rhs[1] + lhs[3] * rhs[3],
        lhs[4] * rhs[0] + lhs[5] * rhs[2] + rhs[4],
        lhs[4] * rhs[1] + lhs[5] * rhs[3] + rhs[5],
    ]
}

pub fn transform(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

/// A straight line piece in user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Segment {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn is_horizontal(&self, tolerance: f64) -> bool {
        (self.y0 - self.y1).abs() <= tolerance
    }

    pub fn is_vertical(&self, tolerance: f64) -> bool {
        (self.x0 - self.x1).abs() <= tolerance
    }

    pub fn length(&self) -> f64 {
        (self.x1 - self.x0).hypot(self.y1 - self.y0)
    }
}

/// Axis-aligned rectangle in user space, normalised so `x0 <= x1`, `y0 <= y1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn edges(&self) -> [Segment; 4] {
        [
            Segment::new(self.x0, self.y0, self.x1, self.y0),
            Segment::new(self.x1, self.y0, self.x1, self.y1),
            Segment::new(self.x0, self.y1, self.x1, self.y1),
            Segment::new(self.x0, self.y0, self.x0, self.y1),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
enum PathItem {
    Line(Segment),
    /// `re` operands transformed to user space; kept whole so painting
    /// can tell a filled bar apart from four strokes
    Rect(Rect),
}

/// Path under construction between `m`/`re` and a painting operator
#[derive(Debug, Default)]
pub struct PathBuilder {
    items: Vec<PathItem>,
    start: Option<(f64, f64)>,
    current: Option<(f64, f64)>,
}

impl PathBuilder {
    pub fn move_to(&mut self, p: (f64, f64)) {
        self.start = Some(p);
        self.current = Some(p);
    }

    pub fn line_to(&mut self, p: (f64, f64)) {
        if let Some((x, y)) = self.current {
            self.items.push(PathItem::Line(Segment::new(x, y, p.0, p.1)));
        } else {
            self.start = Some(p);
        }
        self.current = Some(p);
    }

    /// Curves are not rulings; only the current point moves
    pub fn curve_to(&mut self, p: (f64, f64)) {
        self.current = Some(p);
    }

    pub fn close(&mut self) {
        if let (Some(start), Some(current)) = (self.start, self.current) {
            if start != current {
                self.line_to(start);
            }
        }
    }

    /// `re` with all four corners already in user space
    pub fn rect(&mut self, corners: [(f64, f64); 4]) {
        let axis_aligned = (corners[0].1 - corners[1].1).abs() < 1e-6
            && (corners[1].0 - corners[2].0).abs() < 1e-6;
        if axis_aligned {
            let r = Rect::from_corners(corners[0].0, corners[0].1, corners[2].0, corners[2].1);
            self.items.push(PathItem::Rect(r));
        } else {
            for i in 0..4 {
                let (a, b) = (corners[i], corners[(i + 1) % 4]);
                self.items.push(PathItem::Line(Segment::new(a.0, a.1, b.0, b.1)));
            }
        }
        self.move_to(corners[0]);
    }

    /// Paint the path, appending its pieces, and reset it
    pub fn paint(&mut self, filled: bool, segments: &mut Vec<Segment>, bars: &mut Vec<Rect>) {
        for item in self.items.drain(..) {
            match item {
                PathItem::Line(seg) => segments.push(seg),
                PathItem::Rect(r) if filled => bars.push(r),
                PathItem::Rect(r) => segments.extend(r.edges()),
            }
        }
        self.discard();
    }

    pub fn discard(&mut self) {
        self.items.clear();
        self.start = None;
        self.current = None;
    }
}
