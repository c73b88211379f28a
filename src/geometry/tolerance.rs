// Centralized tolerances and helpers for curve evaluation and fitting

pub const EPS_POS: f32 = 1e-5;            // point coincidence threshold (pattern units)
pub const EPS_LEN: f32 = 1e-7;            // zero-length vector threshold
pub const EPS_DENOM: f32 = 1e-10;         // denominator guard for least-squares solves

// Sampling guards
pub const MIN_SAMPLE_STEP: f32 = 1e-4;    // caps a single curve at 10k samples
pub const LENGTH_TOLERANCE: f32 = 1e-4;   // flatness slack for adaptive arclength
pub const MAX_LENGTH_DEPTH: u32 = 16;

// Auto-fitting defaults
pub const DEFAULT_ANGLE_THRESHOLD_DEG: f32 = 15.0;
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.01;
pub const DEFAULT_SAMPLE_STEP: f32 = 0.05;
pub const MAX_FIT_DEPTH: u32 = 12;

#[inline] pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool { (a - b).abs() <= eps }
#[inline] pub fn clamp01(x: f32) -> f32 { x.max(0.0).min(1.0) }

#[inline]
pub fn safe_div(num: f32, den: f32, fallback: f32) -> f32 {
    if den.abs() <= EPS_DENOM { fallback } else { num / den }
}

/// Clamp a caller supplied sampling step into `[MIN_SAMPLE_STEP, 1]`.
/// Non-finite or non-positive steps fall back to the default step.
#[inline]
pub fn sanitize_step(step: f32) -> f32 {
    if !step.is_finite() || step <= 0.0 {
        return DEFAULT_SAMPLE_STEP;
    }
    step.max(MIN_SAMPLE_STEP).min(1.0)
}
