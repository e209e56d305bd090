//! Square regions and the quadrant split arithmetic.

use crate::point::Point;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// One of the four children of a split region.
///
/// Numbered 1 to 4 in slot order: x below the split and y below it, x at or
/// above and y below, x below and y at or above, both at or above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    MinMin,
    MaxMin,
    MinMax,
    MaxMax,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::MinMin,
        Quadrant::MaxMin,
        Quadrant::MinMax,
        Quadrant::MaxMax,
    ];

    /// Zero-based index (0..4).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-based child slot (1..=4).
    #[inline]
    pub fn slot(self) -> usize {
        self.index() + 1
    }

    /// Quadrant for a one-based child slot.
    pub fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            1..=4 => Some(Self::ALL[slot - 1]),
            _ => None,
        }
    }

    #[inline]
    fn high_x(self) -> bool {
        matches!(self, Quadrant::MaxMin | Quadrant::MaxMax)
    }

    #[inline]
    fn high_y(self) -> bool {
        matches!(self, Quadrant::MinMax | Quadrant::MaxMax)
    }
}

impl Bounds {
    /// Zero-sized region at the origin, used by trees built from no points.
    pub const ZERO: Bounds = Bounds {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Smallest rectangle enclosing every finite point.
    ///
    /// Points with a NaN or infinite coordinate are skipped. Returns `None`
    /// when no finite point remains.
    pub fn enclosing<P: Point>(points: &[P]) -> Option<Self> {
        let mut found = false;
        let mut bounds = Bounds::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );

        for point in points.iter().filter(|p| p.is_finite()) {
            let (x, y) = (point.x(), point.y());
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
            found = true;
        }

        found.then_some(bounds)
    }

    /// Grow the shorter side so the region becomes square.
    ///
    /// The lower-left corner (`min_x`, `min_y`) is kept. The grown side never
    /// ends short of the original maximum, even when `min + side` rounds down.
    pub fn squarify(self) -> Self {
        let (width, height) = (self.width(), self.height());
        if width > height {
            Self {
                max_y: (self.min_y + width).max(self.max_y),
                ..self
            }
        } else {
            Self {
                max_x: (self.min_x + height).max(self.max_x),
                ..self
            }
        }
    }

    /// Get the width of the bounds.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounds.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Get center X (the vertical split line).
    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    /// Get center Y (the horizontal split line).
    #[inline]
    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.width() == self.height()
    }

    /// Closed-interval containment on both axes.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Quadrant a position falls into when this region is split at its center.
    #[inline]
    pub fn quadrant(&self, x: f64, y: f64) -> Quadrant {
        let high_x = x >= self.center_x();
        let high_y = y >= self.center_y();
        Quadrant::ALL[high_x as usize + 2 * high_y as usize]
    }

    /// Region covered by one quadrant of this region.
    #[inline]
    pub fn child(&self, quadrant: Quadrant) -> Bounds {
        let (sx, sy) = (self.center_x(), self.center_y());
        let mut child = *self;
        if quadrant.high_x() {
            child.min_x = sx;
        } else {
            child.max_x = sx;
        }
        if quadrant.high_y() {
            child.min_y = sy;
        } else {
            child.max_y = sy;
        }
        child
    }
}
