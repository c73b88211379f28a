use glam::Vec2;

use super::tolerance::{clamp01, EPS_LEN};

/// Squared distance from `p` to segment `a..b`, and the clamped parameter of the projection.
pub fn seg_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> (f32, f32) {
    let v = b - a;
    let w = p - a;
    let vv = v.length_squared();
    let t = if vv > 0.0 { clamp01(w.dot(v) / vv) } else { 0.0 };
    let proj = a + v * t;
    (p.distance_squared(proj), t)
}

pub fn dist_point_to_seg(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let (d2, _) = seg_distance_sq(p, a, b);
    d2.sqrt()
}

/// Unsigned turning angle (radians) between incoming direction `a` and outgoing direction `b`.
/// Zero-length directions count as no turn.
pub fn turning_angle(a: Vec2, b: Vec2) -> f32 {
    let la = a.length();
    let lb = b.length();
    if la <= EPS_LEN || lb <= EPS_LEN {
        return 0.0;
    }
    let c = (a.dot(b) / (la * lb)).clamp(-1.0, 1.0);
    c.acos()
}

pub fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Cumulative chord-length parameters in `[0, 1]`, one per point.
pub fn chord_parameters(points: &[Vec2]) -> Vec<f32> {
    let mut params = Vec::with_capacity(points.len());
    let mut acc = 0.0f32;
    params.push(0.0);
    for w in points.windows(2) {
        acc += w[0].distance(w[1]);
        params.push(acc);
    }
    if acc > EPS_LEN {
        for p in params.iter_mut() {
            *p /= acc;
        }
    } else {
        let n = params.len().saturating_sub(1).max(1) as f32;
        for (i, p) in params.iter_mut().enumerate() {
            *p = i as f32 / n;
        }
    }
    params
}
