/// Plane geometry shared by physics, replay and transformations.
///
/// World space is measured in tile cells. `y` grows downward so that
/// world rows line up with level rows: cell `(x, y)` covers
/// `[x, x + 1) × [y, y + 1)` and "up" is negative `y`.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Centre of the integer cell `(cx, cy)`.
    pub fn cell_center(cx: i32, cy: i32) -> Self {
        Vec2::new(cx as f32 + 0.5, cy as f32 + 0.5)
    }

    /// Integer cell containing this point.
    pub fn cell(self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x + rhs.x, self.y + rhs.y) }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x - rhs.x, self.y - rhs.y) }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f32) -> Vec2 { Vec2::new(self.x * k, self.y * k) }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 { Vec2::new(-self.x, -self.y) }
}

// ══════════════════════════════════════════════════════════════
// Axis-aligned boxes
// ══════════════════════════════════════════════════════════════

/// Axis-aligned box, `min` is the top-left corner.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Aabb { min, max }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Aabb { min: center - half, max: center + half }
    }

    /// The unit box of cell `(cx, cy)`.
    pub fn cell(cx: i32, cy: i32) -> Self {
        let min = Vec2::new(cx as f32, cy as f32);
        Aabb { min, max: min + Vec2::new(1.0, 1.0) }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min.x + self.max.x) * 0.5, (self.min.y + self.max.y) * 0.5)
    }

    /// Strict overlap: boxes that merely touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x && other.min.x < self.max.x
            && self.min.y < other.max.y && other.min.y < self.max.y
    }

    /// Grow the box to cover a displacement `d` of itself.
    pub fn swept(&self, d: Vec2) -> Aabb {
        Aabb {
            min: Vec2::new(self.min.x.min(self.min.x + d.x), self.min.y.min(self.min.y + d.y)),
            max: Vec2::new(self.max.x.max(self.max.x + d.x), self.max.y.max(self.max.y + d.y)),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Grid snapping
// ══════════════════════════════════════════════════════════════

/// Snap one coordinate to the centre of its enclosing unit cell.
#[inline]
pub fn snap_coord(c: f32) -> f32 {
    (c + 0.5).round() - 0.5
}

/// Snap a position to the centre of its grid cell (per axis).
pub fn snap_to_grid(p: Vec2) -> Vec2 {
    Vec2::new(snap_coord(p.x), snap_coord(p.y))
}
