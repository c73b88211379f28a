//! Bézier evaluation and arclength.
//!
//! Points are evaluated with de Casteljau's construction (repeated linear
//! interpolation), which stays well conditioned for `t` in `[0, 1]`.
//! Quadratics are measured by elevating them to the equivalent cubic.

use glam::Vec2;

use super::tolerance::MAX_LENGTH_DEPTH;

/// Control points of a quadratic Bézier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadraticBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
}

impl QuadraticBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2) -> Self {
        Self { p0, p1, p2 }
    }

    pub fn eval(&self, t: f32) -> Vec2 {
        let a = self.p0.lerp(self.p1, t);
        let b = self.p1.lerp(self.p2, t);
        a.lerp(b, t)
    }

    pub fn tangent(&self, t: f32) -> Vec2 {
        let a = self.p1 - self.p0;
        let b = self.p2 - self.p1;
        2.0 * a.lerp(b, t)
    }

    /// Exact degree elevation: the returned cubic traces the same curve.
    pub fn to_cubic(&self) -> CubicBezier {
        CubicBezier::new(
            self.p0,
            self.p0 + (self.p1 - self.p0) * (2.0 / 3.0),
            self.p2 + (self.p1 - self.p2) * (2.0 / 3.0),
            self.p2,
        )
    }
}

/// Control points of a cubic Bézier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec2, // Start point
    pub p1: Vec2, // First control point
    pub p2: Vec2, // Second control point
    pub p3: Vec2, // End point
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Evaluate the curve at parameter t ∈ [0, 1].
    pub fn eval(&self, t: f32) -> Vec2 {
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        p012.lerp(p123, t)
    }

    /// Evaluate the tangent (derivative) at parameter t.
    pub fn tangent(&self, t: f32) -> Vec2 {
        let a = self.p1 - self.p0;
        let b = self.p2 - self.p1;
        let c = self.p3 - self.p2;
        let ab = a.lerp(b, t);
        let bc = b.lerp(c, t);
        3.0 * ab.lerp(bc, t)
    }

    /// Compute approximate arc length using adaptive subdivision.
    pub fn arc_length(&self, tolerance: f32) -> f32 {
        arc_length_recursive(self.p0, self.p1, self.p2, self.p3, tolerance, 0)
    }
}

/// Recursive arc length computation with adaptive subdivision.
fn arc_length_recursive(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, tolerance: f32, depth: u32) -> f32 {
    let chord = p0.distance(p3);
    let poly_len = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);

    // If flat enough or max depth reached, use average of chord and polygon
    if depth >= MAX_LENGTH_DEPTH || (poly_len - chord).abs() < tolerance {
        return (chord + poly_len) * 0.5;
    }

    let p01 = p0.lerp(p1, 0.5);
    let p12 = p1.lerp(p2, 0.5);
    let p23 = p2.lerp(p3, 0.5);
    let p012 = p01.lerp(p12, 0.5);
    let p123 = p12.lerp(p23, 0.5);
    let mid = p012.lerp(p123, 0.5);

    arc_length_recursive(p0, p01, p012, mid, tolerance, depth + 1)
        + arc_length_recursive(mid, p123, p23, p3, tolerance, depth + 1)
}
