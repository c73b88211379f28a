use serde::{Deserialize, Serialize};

use crate::geometry::tolerance::{
    DEFAULT_ANGLE_THRESHOLD_DEG, DEFAULT_DISTANCE_THRESHOLD, DEFAULT_SAMPLE_STEP, LENGTH_TOLERANCE,
};

/// Sampling and fitting parameters in one struct.
/// Serializable so editors can keep presets next to their documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Turning angle (degrees) at or above which auto-fitting starts a new segment.
    pub angle_threshold_deg: f32,
    /// Maximum deviation accepted when merging points into one segment, and
    /// the adjacent-point dedup distance used when collecting points.
    pub distance_threshold: f32,
    /// Parametric step for callers that don't choose their own.
    pub sample_step: f32,
    /// Flatness slack of the adaptive arclength.
    pub length_tolerance: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            angle_threshold_deg: DEFAULT_ANGLE_THRESHOLD_DEG,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            sample_step: DEFAULT_SAMPLE_STEP,
            length_tolerance: LENGTH_TOLERANCE,
        }
    }
}

impl SamplingConfig {
    pub fn angle_threshold_rad(&self) -> f32 {
        self.angle_threshold_deg.to_radians()
    }

    pub fn with_distance_threshold(mut self, d: f32) -> Self {
        self.distance_threshold = d;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_design_thresholds() {
        let c = SamplingConfig::default();
        assert_eq!(c.angle_threshold_deg, 15.0);
        assert_eq!(c.distance_threshold, 0.01);
        assert!((c.angle_threshold_rad() - 15f32.to_radians()).abs() < 1e-7);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let c: SamplingConfig = serde_json::from_str(r#"{"sample_step": 0.1}"#).unwrap();
        assert_eq!(c.sample_step, 0.1);
        assert_eq!(c.angle_threshold_deg, 15.0);
    }
}
