use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// Axis-aligned rectangle in screen pixels.
///
/// Used as the "origin rectangle" of UI transitions: callers measure where a
/// thing sits on screen and pass the value in, so the transition itself never
/// has to query layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_min_size(min: Point, width: f32, height: f32) -> Self {
        Self { min, max: Point::new(min.x + width, min.y + height) }
    }

    pub fn from_center_size(center: Point, width: f32, height: f32) -> Self {
        let min = Point::new(center.x - width * 0.5, center.y - height * 0.5);
        Self::from_min_size(min, width, height)
    }

    pub fn width(&self) -> f32 { self.max.x - self.min.x }
    pub fn height(&self) -> f32 { self.max.y - self.min.y }

    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) * 0.5, (self.min.y + self.max.y) * 0.5)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn expand(&self, margin: f32) -> Rect {
        Rect {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn lerp(&self, other: &Rect, t: f32) -> Rect {
        Rect { min: self.min.lerp(other.min, t), max: self.max.lerp(other.max, t) }
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let u = 1.0 - t;
    1.0 - u * u * u
}

/// Rectangle of a panel growing out of `origin` into `target` at progress `t`
/// (clamped to `0..=1`), eased out.
pub fn reveal(origin: &Rect, target: &Rect, t: f32) -> Rect {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
    origin.lerp(target, ease_out_cubic(t))
}

/// Control points of the cubic curve drawn for a link between two points.
///
/// The curve bows sideways by a fraction of the link length so that links
/// stay readable when they overlap a straight row of nodes.
pub fn link_curve(a: Point, b: Point) -> [Point; 4] {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let bow = 0.18;
    // perpendicular of (dx, dy) is (-dy, dx)
    let off = Point::new(-dy * bow, dx * bow);
    let c1 = Point::new(a.x + dx / 3.0 + off.x, a.y + dy / 3.0 + off.y);
    let c2 = Point::new(a.x + dx * 2.0 / 3.0 + off.x, a.y + dy * 2.0 / 3.0 + off.y);
    [a, c1, c2, b]
}

/// k-th point of a golden-angle spiral around `center`.
pub fn golden_spiral_position(center: Point, k: u32, spacing: f32) -> Point {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let r = spacing * (k as f32 + 1.0).sqrt();
    let theta = k as f32 * golden_angle;
    Point::new(center.x + r * theta.cos(), center.y + r * theta.sin())
}
