use crate::error::{ReconstructError, Result};

pub const DEFAULT_HEIGHT: f32 = 1.75;

// Segment lengths as fractions of body height
const NECK_RATIO: f32 = 0.05;
const SHOULDER_WIDTH_RATIO: f32 = 0.25;
const UPPER_ARM_RATIO: f32 = 0.18;
const FOREARM_RATIO: f32 = 0.16;
const SPINE_SEGMENT_RATIO: f32 = 0.10;

/// 身長から求めたユーザーごとの骨の長さ。
///
/// 不変。身長が変わったら作り直す。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnthropometricModel {
    height: f32,
    neck_length: f32,
    shoulder_width: f32,
    upper_arm_length: f32,
    forearm_length: f32,
    upper_spine_length: f32,
    mid_spine_length: f32,
    lower_spine_length: f32,
}

impl AnthropometricModel {
    /// Derives segment lengths from `height` in meters.
    ///
    /// Non-positive or non-finite heights are rejected with `InvalidParameter`
    /// so no zero or negative bone length can be produced.
    pub fn new(height: f32) -> Result<Self> {
        if !height.is_finite() || height <= 0.0 {
            return Err(ReconstructError::invalid_parameter("height", height));
        }
        Ok(Self::from_valid_height(height))
    }

    fn from_valid_height(height: f32) -> Self {
        Self {
            height,
            neck_length: NECK_RATIO * height,
            shoulder_width: SHOULDER_WIDTH_RATIO * height,
            upper_arm_length: UPPER_ARM_RATIO * height,
            forearm_length: FOREARM_RATIO * height,
            upper_spine_length: SPINE_SEGMENT_RATIO * height,
            mid_spine_length: SPINE_SEGMENT_RATIO * height,
            lower_spine_length: SPINE_SEGMENT_RATIO * height,
        }
    }

    pub fn height(&self) -> f32 { self.height }
    pub fn neck_length(&self) -> f32 { self.neck_length }
    pub fn shoulder_width(&self) -> f32 { self.shoulder_width }
    pub fn upper_arm_length(&self) -> f32 { self.upper_arm_length }
    pub fn forearm_length(&self) -> f32 { self.forearm_length }
    pub fn upper_spine_length(&self) -> f32 { self.upper_spine_length }
    pub fn mid_spine_length(&self) -> f32 { self.mid_spine_length }
    pub fn lower_spine_length(&self) -> f32 { self.lower_spine_length }

    /// 首から腰椎まで
    pub fn spine_length(&self) -> f32 {
        self.upper_spine_length + self.mid_spine_length + self.lower_spine_length
    }

    pub fn half_shoulder_width(&self) -> f32 {
        self.shoulder_width / 2.0
    }

    /// 肩から手首までの腕の長さ
    pub fn arm_length(&self) -> f32 {
        self.upper_arm_length + self.forearm_length
    }

    #[cfg(test)]
    fn lengths(&self) -> [f32; 7] {
        [
            self.neck_length,
            self.shoulder_width,
            self.upper_arm_length,
            self.forearm_length,
            self.upper_spine_length,
            self.mid_spine_length,
            self.lower_spine_length,
        ]
    }
}

impl Default for AnthropometricModel {
    fn default() -> Self {
        Self::from_valid_height(DEFAULT_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_matches_new() {
        let model = AnthropometricModel::new(DEFAULT_HEIGHT).unwrap();
        assert_eq!(model, AnthropometricModel::default());
    }

    #[test]
    fn test_reference_lengths() {
        let model = AnthropometricModel::new(1.75).unwrap();
        assert_relative_eq!(model.neck_length(), 0.0875, epsilon = 1e-6);
        assert_relative_eq!(model.shoulder_width(), 0.4375, epsilon = 1e-6);
        assert_relative_eq!(model.upper_arm_length(), 0.315, epsilon = 1e-6);
        assert_relative_eq!(model.forearm_length(), 0.28, epsilon = 1e-6);
        assert_relative_eq!(model.spine_length(), 0.525, epsilon = 1e-6);
    }

    #[test]
    fn test_lengths_scale_linearly() {
        for &h in &[1.0_f32, 1.5, 1.75, 2.2] {
            let base = AnthropometricModel::new(h).unwrap();
            let doubled = AnthropometricModel::new(2.0 * h).unwrap();
            for (a, b) in base.lengths().iter().zip(doubled.lengths().iter()) {
                assert!(*a > 0.0);
                assert_relative_eq!(2.0 * a, *b, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn test_non_positive_height_rejected() {
        for &h in &[0.0_f32, -1.75, f32::NAN, f32::INFINITY] {
            let err = AnthropometricModel::new(h).unwrap_err();
            assert!(matches!(err, ReconstructError::InvalidParameter { name: "height", .. }));
        }
    }
}
