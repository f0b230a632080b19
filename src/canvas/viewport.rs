use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};

pub const MIN_SCALE: f32 = 0.2;
pub const MAX_SCALE: f32 = 3.0;
pub const DEFAULT_ZOOM_SENSITIVITY: f32 = 0.001;
/// Screen margin left around the content by `fit`.
pub const FIT_PADDING: f32 = 40.0;

/// Pan offset and zoom scale mapping world coordinates onto the screen.
///
/// `x`/`y` is where the world origin sits in canvas pixels. Zoom is applied
/// around that origin, not around the cursor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    // Offset restored by `reset`; tracks the canvas centre.
    home: Point,
    #[serde(default = "default_sensitivity")]
    sensitivity: f32,
}

fn default_sensitivity() -> f32 { DEFAULT_ZOOM_SENSITIVITY }

impl Default for Viewport {
    fn default() -> Self {
        Self::centered(0.0, 0.0)
    }
}

impl Viewport {
    /// Viewport with the world origin in the middle of a `width` x `height` canvas.
    pub fn centered(width: f32, height: f32) -> Self {
        let home = Point::new(width * 0.5, height * 0.5);
        Self { x: home.x, y: home.y, scale: 1.0, home, sensitivity: DEFAULT_ZOOM_SENSITIVITY }
    }

    /// Viewport at an explicit offset and scale; that offset becomes home.
    pub fn new(x: f32, y: f32, scale: f32) -> Self {
        let scale = if scale.is_finite() { scale.clamp(MIN_SCALE, MAX_SCALE) } else { 1.0 };
        Self { x, y, scale, home: Point::new(x, y), sensitivity: DEFAULT_ZOOM_SENSITIVITY }
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.set_sensitivity(sensitivity);
        self
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        if sensitivity.is_finite() && sensitivity > 0.0 {
            self.sensitivity = sensitivity;
        }
    }

    pub fn sensitivity(&self) -> f32 { self.sensitivity }

    pub fn home(&self) -> Point { self.home }

    pub fn screen_to_world(&self, s: Point) -> Point {
        Point::new((s.x - self.x) / self.scale, (s.y - self.y) / self.scale)
    }

    pub fn world_to_screen(&self, w: Point) -> Point {
        Point::new(w.x * self.scale + self.x, w.y * self.scale + self.y)
    }

    /// Add `delta * sensitivity` to the scale, clamped to `[MIN_SCALE, MAX_SCALE]`.
    pub fn zoom(&mut self, delta: f32) {
        let next = self.scale + delta * self.sensitivity;
        if next.is_finite() {
            self.scale = next.clamp(MIN_SCALE, MAX_SCALE);
        } else if next.is_infinite() {
            self.scale = if next > 0.0 { MAX_SCALE } else { MIN_SCALE };
        }
    }

    /// Wheel input with browser sign convention: negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f32) {
        self.zoom(-delta_y);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.x += dx;
            self.y += dy;
        }
    }

    pub fn reset(&mut self) {
        self.x = self.home.x;
        self.y = self.home.y;
        self.scale = 1.0;
    }

    /// Move the home position to a new canvas centre (e.g. after a resize).
    pub fn set_home(&mut self, center: Point) {
        if center.is_finite() {
            self.home = center;
        }
    }

    /// Re-establish the invariants after loading from disk: finite offsets,
    /// a scale inside `[MIN_SCALE, MAX_SCALE]`, a positive sensitivity.
    pub fn sanitized(mut self) -> Self {
        self.scale = if self.scale.is_finite() { self.scale.clamp(MIN_SCALE, MAX_SCALE) } else { 1.0 };
        if !self.home.is_finite() {
            self.home = Point::ZERO;
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            self.x = self.home.x;
            self.y = self.home.y;
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            self.sensitivity = DEFAULT_ZOOM_SENSITIVITY;
        }
        self
    }

    /// Scale and centre so the world rectangle `bounds` fills `canvas`
    /// (canvas-local pixels) minus `FIT_PADDING`. The scale stays clamped.
    pub fn fit(&mut self, bounds: &Rect, canvas: &Rect) {
        if !bounds.min.is_finite() || !bounds.max.is_finite() || !canvas.min.is_finite() || !canvas.max.is_finite() {
            return;
        }
        let room_w = (canvas.width() - FIT_PADDING * 2.0).max(1.0);
        let room_h = (canvas.height() - FIT_PADDING * 2.0).max(1.0);
        let sx = room_w / bounds.width().max(f32::EPSILON);
        let sy = room_h / bounds.height().max(f32::EPSILON);
        self.scale = sx.min(sy).clamp(MIN_SCALE, MAX_SCALE);
        let c = bounds.center();
        let target = canvas.center();
        self.x = target.x - c.x * self.scale;
        self.y = target.y - c.y * self.scale;
    }

    /// Bring `world` to `screen_center` at scale 1.
    pub fn focus_on(&mut self, world: Point, screen_center: Point) {
        if !world.is_finite() || !screen_center.is_finite() {
            return;
        }
        self.scale = 1.0;
        self.x = screen_center.x - world.x;
        self.y = screen_center.y - world.y;
    }
}
