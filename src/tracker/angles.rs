//! Joint angles derived from a reconstructed skeleton
//!
//! Angles are in degrees, measured at the middle joint of a three-joint chain:
//! 180° = straight, 90° = right angle.

use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::pose::{Joint, Side, UpperBodySkeleton};

const MIN_SEGMENT_LENGTH: f32 = 1e-4;

/// Angle at `vertex` between `vertex -> a` and `vertex -> b`.
///
/// None when either segment is too short to define a direction.
pub fn angle_at(a: Vector3<f32>, vertex: Vector3<f32>, b: Vector3<f32>) -> Option<f32> {
    let v1 = a - vertex;
    let v2 = b - vertex;
    let mag1 = v1.norm();
    let mag2 = v2.norm();
    if !(mag1 >= MIN_SEGMENT_LENGTH && mag2 >= MIN_SEGMENT_LENGTH) {
        return None;
    }
    let cos_angle = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Elbow flexion: 0° = straight arm, grows as the forearm folds toward the upper arm
pub fn elbow_flexion(shoulder: Vector3<f32>, elbow: Vector3<f32>, wrist: Vector3<f32>) -> Option<f32> {
    angle_at(shoulder, elbow, wrist).map(|a| 180.0 - a)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkeletonAngles {
    /// shoulder - elbow - wrist
    pub left_elbow: Option<f32>,
    pub right_elbow: Option<f32>,
    /// upper_spine - shoulder - elbow
    pub left_shoulder: Option<f32>,
    pub right_shoulder: Option<f32>,
    /// neck - mid_spine - lower_spine
    pub spine_bend: Option<f32>,
}

impl SkeletonAngles {
    pub fn from_skeleton(skeleton: &UpperBodySkeleton) -> Self {
        let elbow = |side: Side| {
            angle_at(
                skeleton[side.shoulder()],
                skeleton[side.elbow()],
                skeleton[side.wrist()],
            )
        };
        let shoulder = |side: Side| {
            angle_at(
                skeleton[Joint::UpperSpine],
                skeleton[side.shoulder()],
                skeleton[side.elbow()],
            )
        };
        Self {
            left_elbow: elbow(Side::Left),
            right_elbow: elbow(Side::Right),
            left_shoulder: shoulder(Side::Left),
            right_shoulder: shoulder(Side::Right),
            spine_bend: angle_at(
                skeleton[Joint::Neck],
                skeleton[Joint::MidSpine],
                skeleton[Joint::LowerSpine],
            ),
        }
    }

    pub fn elbow(&self, side: Side) -> Option<f32> {
        match side {
            Side::Left => self.left_elbow,
            Side::Right => self.right_elbow,
        }
    }

    pub fn shoulder(&self, side: Side) -> Option<f32> {
        match side {
            Side::Left => self.left_shoulder,
            Side::Right => self.right_shoulder,
        }
    }

    pub fn elbow_flexion(&self, side: Side) -> Option<f32> {
        self.elbow(side).map(|a| 180.0 - a)
    }

    /// Named angles with a defined value, e.g. "left_elbow_angle"
    pub fn to_named_map(&self) -> BTreeMap<&'static str, f32> {
        [
            ("left_elbow_angle", self.left_elbow),
            ("right_elbow_angle", self.right_elbow),
            ("left_shoulder_angle", self.left_shoulder),
            ("right_shoulder_angle", self.right_shoulder),
            ("spine_bend_angle", self.spine_bend),
        ]
        .into_iter()
        .filter_map(|(name, angle)| angle.map(|a| (name, a)))
        .collect()
    }
}
