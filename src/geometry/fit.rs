//! Auto-fitting of a dense point sequence into a chain of lines and cubics.
//!
//! The polyline is first cut at corners (turning angle at or above the angle
//! threshold). Each corner-free run becomes a single line when every point
//! stays within the distance threshold of its chord, otherwise a least-squares
//! cubic with chord-length parameters. Runs the cubic cannot follow are split
//! at their worst point and fitted again.

use glam::Vec2;

use super::bezier::CubicBezier;
use super::math::{chord_parameters, dist_point_to_seg, turning_angle};
use super::tolerance::{safe_div, EPS_LEN, EPS_POS, MAX_FIT_DEPTH};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FittedSegment {
    Line(Vec2, Vec2),
    Cubic(CubicBezier),
}

impl FittedSegment {
    pub fn start(&self) -> Vec2 {
        match self {
            FittedSegment::Line(a, _) => *a,
            FittedSegment::Cubic(c) => c.p0,
        }
    }

    pub fn end(&self) -> Vec2 {
        match self {
            FittedSegment::Line(_, b) => *b,
            FittedSegment::Cubic(c) => c.p3,
        }
    }
}

pub fn fit_polyline(points: &[Vec2], distance_threshold: f32, angle_threshold: f32) -> Vec<FittedSegment> {
    let mut pts: Vec<Vec2> = points.to_vec();
    pts.dedup_by(|a, b| a.distance(*b) < EPS_POS);
    if pts.len() < 2 {
        return Vec::new();
    }
    let thr = distance_threshold.max(0.0);

    let mut breaks = vec![0usize];
    for i in 1..pts.len() - 1 {
        let turn = turning_angle(pts[i] - pts[i - 1], pts[i + 1] - pts[i]);
        if turn >= angle_threshold {
            breaks.push(i);
        }
    }
    breaks.push(pts.len() - 1);

    let mut out = Vec::new();
    for w in breaks.windows(2) {
        fit_run(&pts[w[0]..=w[1]], thr, 0, &mut out);
    }
    out
}

fn fit_run(run: &[Vec2], thr: f32, depth: u32, out: &mut Vec<FittedSegment>) {
    let n = run.len();
    let (p0, p3) = (run[0], run[n - 1]);
    if n == 2 {
        out.push(FittedSegment::Line(p0, p3));
        return;
    }
    let chord_dev = run[1..n - 1]
        .iter()
        .map(|p| dist_point_to_seg(*p, p0, p3))
        .fold(0.0f32, f32::max);
    if chord_dev <= thr {
        out.push(FittedSegment::Line(p0, p3));
        return;
    }
    if depth >= MAX_FIT_DEPTH {
        for w in run.windows(2) {
            out.push(FittedSegment::Line(w[0], w[1]));
        }
        return;
    }

    let params = chord_parameters(run);
    let cubic = least_squares_cubic(run, &params);
    let mut worst = (0usize, 0.0f32);
    for i in 1..n - 1 {
        let err = run[i].distance(cubic.eval(params[i]));
        if err > worst.1 {
            worst = (i, err);
        }
    }
    if worst.1 <= thr {
        out.push(FittedSegment::Cubic(cubic));
        return;
    }
    let k = worst.0.max(1).min(n - 2);
    fit_run(&run[..=k], thr, depth + 1, out);
    fit_run(&run[k..], thr, depth + 1, out);
}

// Endpoints are fixed; end tangents come from the run's end neighbours and only
// the two handle lengths are solved for (2x2 normal equations).
fn least_squares_cubic(run: &[Vec2], params: &[f32]) -> CubicBezier {
    let n = run.len();
    let (p0, p3) = (run[0], run[n - 1]);
    let t1 = (run[1] - p0).normalize_or_zero();
    let t2 = (run[n - 2] - p3).normalize_or_zero();

    let (mut c00, mut c01, mut c11, mut x0, mut x1) = (0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for (p, &t) in run.iter().zip(params) {
        let u = 1.0 - t;
        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;
        let a1 = t1 * b1;
        let a2 = t2 * b2;
        c00 += a1.dot(a1);
        c01 += a1.dot(a2);
        c11 += a2.dot(a2);
        let rest = *p - (p0 * (b0 + b1) + p3 * (b2 + b3));
        x0 += a1.dot(rest);
        x1 += a2.dot(rest);
    }

    let seg_len = p0.distance(p3);
    let det = c00 * c11 - c01 * c01;
    let mut alpha1 = safe_div(x0 * c11 - x1 * c01, det, 0.0);
    let mut alpha2 = safe_div(c00 * x1 - c01 * x0, det, 0.0);
    let min_alpha = EPS_LEN.max(seg_len * 1e-6);
    if alpha1 < min_alpha || alpha2 < min_alpha {
        alpha1 = seg_len / 3.0;
        alpha2 = seg_len / 3.0;
    }
    CubicBezier::new(p0, p0 + t1 * alpha1, p3 + t2 * alpha2, p3)
}
