use nalgebra::{Quaternion, Vector3};
use rayon::prelude::*;

use super::anthropometry::AnthropometricModel;
use super::arm::{ArmSolver, ArmWarning, MIN_DIRECTION_LENGTH};
use crate::config::{Config, DegeneratePolicy, ReconstructionConfig};
use crate::error::{ReconstructError, Result};
use crate::pose::frame::normalize_orientation;
use crate::pose::{ArmSample, FrameInput, Joint, LengthMismatch, SequenceInputs, Side, UpperBodySkeleton};

/// 頭部の向きでワールド座標へ回転した体の局所軸
struct HeadBasis {
    down: Vector3<f32>,
    right: Vector3<f32>,
}

/// バッチ結果: 揃っているフレームごとに1要素、入力順
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReconstruction {
    pub frames: Vec<Result<UpperBodySkeleton>>,
    /// Set when the per-field inputs had different lengths and were truncated
    pub mismatch: Option<LengthMismatch>,
}

impl SequenceReconstruction {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_err()).count()
    }

    /// Fails on a length mismatch first, then on the first failed frame
    pub fn into_strict(self) -> Result<Vec<UpperBodySkeleton>> {
        if let Some(m) = self.mismatch {
            return Err(ReconstructError::SequenceLengthMismatch {
                shortest: m.shortest(),
                longest: m.longest(),
            });
        }
        self.frames.into_iter().collect()
    }
}

/// フレーム単位の上半身推定器。
///
/// フレーム間で状態を持たない。同じ入力からは常に同じ骨格が得られるので、
/// バッチの各フレームは任意の順序・並列で評価できる。
pub struct SkeletonReconstructor {
    model: AnthropometricModel,
    arm: ArmSolver,
    degenerate: DegeneratePolicy,
    parallel: bool,
}

impl SkeletonReconstructor {
    pub fn new(model: AnthropometricModel, config: &ReconstructionConfig) -> Result<Self> {
        Ok(Self {
            arm: ArmSolver::new(&model, config)?,
            model,
            degenerate: config.degenerate,
            parallel: config.parallel,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let model = AnthropometricModel::new(config.body.height)?;
        Self::new(model, &config.reconstruction)
    }

    pub fn model(&self) -> &AnthropometricModel {
        &self.model
    }

    pub fn reconstruct(
        &self,
        head_position: Vector3<f32>,
        head_orientation: Quaternion<f32>,
        left_wrist: Vector3<f32>,
        right_wrist: Vector3<f32>,
        left_forearm: Vector3<f32>,
        right_forearm: Vector3<f32>,
    ) -> Result<UpperBodySkeleton> {
        self.reconstruct_detailed(
            head_position,
            head_orientation,
            left_wrist,
            right_wrist,
            left_forearm,
            right_forearm,
        )
        .map(|(skeleton, _)| skeleton)
    }

    /// Same as `reconstruct`, also returning the arm plausibility warnings
    pub fn reconstruct_detailed(
        &self,
        head_position: Vector3<f32>,
        head_orientation: Quaternion<f32>,
        left_wrist: Vector3<f32>,
        right_wrist: Vector3<f32>,
        left_forearm: Vector3<f32>,
        right_forearm: Vector3<f32>,
    ) -> Result<(UpperBodySkeleton, Vec<ArmWarning>)> {
        let known = [
            ("head", head_position),
            ("left wrist", left_wrist),
            ("right wrist", right_wrist),
            ("left forearm", left_forearm),
            ("right forearm", right_forearm),
        ];
        if let Some((name, _)) = known.iter().find(|(_, p)| !p.iter().all(|c| c.is_finite())) {
            return Err(ReconstructError::degenerate(format!("{} position is not finite", name)));
        }

        let basis = self.head_basis(head_orientation)?;
        let m = &self.model;

        let mut joints = [Vector3::zeros(); Joint::COUNT];
        joints[Joint::Head as usize] = head_position;
        joints[Joint::LeftWrist as usize] = left_wrist;
        joints[Joint::RightWrist as usize] = right_wrist;
        joints[Joint::LeftForearm as usize] = left_forearm;
        joints[Joint::RightForearm as usize] = right_forearm;

        // Rigid spine hanging along the head's down axis
        let neck = head_position + basis.down * m.neck_length();
        let upper_spine = neck + basis.down * m.upper_spine_length();
        let mid_spine = upper_spine + basis.down * m.mid_spine_length();
        let lower_spine = mid_spine + basis.down * m.lower_spine_length();
        joints[Joint::Neck as usize] = neck;
        joints[Joint::UpperSpine as usize] = upper_spine;
        joints[Joint::MidSpine as usize] = mid_spine;
        joints[Joint::LowerSpine as usize] = lower_spine;

        let mut warnings = Vec::new();
        for side in Side::BOTH {
            let (wrist, forearm) = match side {
                Side::Left => (left_wrist, left_forearm),
                Side::Right => (right_wrist, right_forearm),
            };
            let shoulder = upper_spine + basis.right * (side.sign() * m.half_shoulder_width());
            let estimate = self.arm.solve(side, shoulder, forearm, wrist)?;
            joints[side.shoulder() as usize] = shoulder;
            joints[side.elbow() as usize] = estimate.elbow;
            warnings.extend(estimate.warnings);
        }

        Ok((UpperBodySkeleton::from_joints(joints), warnings))
    }

    pub fn reconstruct_frame(&self, frame: &FrameInput) -> Result<UpperBodySkeleton> {
        let FrameInput {
            head,
            left: ArmSample { wrist: left_wrist, forearm: left_forearm },
            right: ArmSample { wrist: right_wrist, forearm: right_forearm },
        } = *frame;
        self.reconstruct(
            head.position,
            head.orientation,
            left_wrist,
            right_wrist,
            left_forearm,
            right_forearm,
        )
    }

    /// Reconstructs every complete frame of `inputs`.
    ///
    /// Output length is the shortest input length; the truncation is reported
    /// through `mismatch`, never silently. Each frame is independent, so a
    /// failed frame does not affect its neighbours.
    pub fn reconstruct_sequence(&self, inputs: SequenceInputs<'_>) -> SequenceReconstruction {
        let n = inputs.len();
        let mismatch = inputs.mismatch();
        if let Some(m) = mismatch {
            tracing::warn!(
                lengths = ?m.lengths,
                dropped = m.dropped(),
                "input sequences differ in length, truncating to {}",
                m.shortest()
            );
        }

        let reconstruct_at = |i: usize| match inputs.frame(i) {
            Some(frame) => self.reconstruct_frame(&frame),
            None => Err(ReconstructError::insufficient_data(format!("frame {} out of range", i))),
        };
        let frames: Vec<Result<UpperBodySkeleton>> = if self.parallel {
            (0..n).into_par_iter().map(reconstruct_at).collect()
        } else {
            (0..n).map(reconstruct_at).collect()
        };

        let result = SequenceReconstruction { frames, mismatch };
        tracing::debug!(
            frames = result.len(),
            failed = result.failed_count(),
            parallel = self.parallel,
            "sequence reconstructed"
        );
        result
    }

    fn head_basis(&self, orientation: Quaternion<f32>) -> Result<HeadBasis> {
        // Non-unit quaternions are normalized here
        let Some(rotation) = normalize_orientation(orientation) else {
            return match self.degenerate {
                DegeneratePolicy::Error => Err(ReconstructError::degenerate(format!(
                    "head orientation quaternion is unusable (norm {})",
                    orientation.norm()
                ))),
                DegeneratePolicy::Fallback => Ok(HeadBasis {
                    down: -Vector3::y(),
                    right: Vector3::x(),
                }),
            };
        };
        let down = (rotation * -Vector3::y()).try_normalize(MIN_DIRECTION_LENGTH);
        let right = (rotation * Vector3::x()).try_normalize(MIN_DIRECTION_LENGTH);
        match (down, right) {
            (Some(down), Some(right)) => Ok(HeadBasis { down, right }),
            _ => Err(ReconstructError::degenerate("head basis vectors collapsed")),
        }
    }
}
