use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use super::joint::Side;

/// Quaternions with a smaller norm carry no usable orientation
pub(crate) const MIN_QUATERNION_NORM: f32 = 1e-6;

/// 非有限成分やノルムが小さすぎる四元数は None。
/// 最大成分で割ってから正規化するので、巨大な成分でもノルムが溢れない
pub(crate) fn normalize_orientation(q: Quaternion<f32>) -> Option<UnitQuaternion<f32>> {
    if !q.coords.iter().all(|c| c.is_finite()) {
        return None;
    }
    let largest = q.coords.amax();
    if largest == 0.0 {
        return None;
    }
    let scaled = q.coords / largest;
    if largest * scaled.norm() < MIN_QUATERNION_NORM {
        return None;
    }
    Some(UnitQuaternion::new_normalize(Quaternion::from_vector(scaled)))
}

/// Head position and orientation for one frame.
///
/// The orientation is kept as a raw quaternion; it is validated and normalized
/// when a frame is reconstructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub position: Vector3<f32>,
    pub orientation: Quaternion<f32>,
}

impl HeadPose {
    pub fn new(position: Vector3<f32>, orientation: Quaternion<f32>) -> Self {
        Self { position, orientation }
    }

    /// Tracking streams store quaternions as [x, y, z, w]
    pub fn from_xyzw(position: [f32; 3], rotation: [f32; 4]) -> Self {
        Self {
            position: Vector3::from(position),
            orientation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        }
    }

    pub fn identity_at(position: Vector3<f32>) -> Self {
        Self::new(position, Quaternion::identity())
    }
}

/// Timestamped head sample (seconds on a monotonic clock)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub timestamp: f64,
    pub pose: HeadPose,
}

impl PoseSample {
    pub fn new(timestamp: f64, pose: HeadPose) -> Self {
        Self { timestamp, pose }
    }
}

/// Tracked points of one hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmSample {
    pub wrist: Vector3<f32>,
    /// Forearm proxy point near the wrist
    pub forearm: Vector3<f32>,
}

impl ArmSample {
    pub fn new(wrist: Vector3<f32>, forearm: Vector3<f32>) -> Self {
        Self { wrist, forearm }
    }

    /// 手首と前腕点の両方が有限値ならトラッキング中とみなす
    pub fn is_tracked(&self) -> bool {
        self.wrist.iter().chain(self.forearm.iter()).all(|c| c.is_finite())
    }
}

/// All six known inputs of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub head: HeadPose,
    pub left: ArmSample,
    pub right: ArmSample,
}

impl FrameInput {
    pub fn new(head: HeadPose, left: ArmSample, right: ArmSample) -> Self {
        Self { head, left, right }
    }

    pub fn arm(&self, side: Side) -> &ArmSample {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn arm_mut(&mut self, side: Side) -> &mut ArmSample {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Lengths of the per-field input sequences when they disagree.
///
/// Batch reconstruction truncates to the shortest input; this records by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    /// head positions, head orientations, left wrists, right wrists, left forearms, right forearms
    pub lengths: [usize; 6],
}

impl LengthMismatch {
    pub fn shortest(&self) -> usize {
        self.lengths.iter().copied().min().unwrap_or(0)
    }

    pub fn longest(&self) -> usize {
        self.lengths.iter().copied().max().unwrap_or(0)
    }

    /// Frames dropped from the longest input
    pub fn dropped(&self) -> usize {
        self.longest() - self.shortest()
    }
}

/// Per-field input sequences for batch reconstruction.
///
/// Fields may have different lengths; only the first `len()` frames are used.
#[derive(Debug, Clone, Copy)]
pub struct SequenceInputs<'a> {
    pub head_positions: &'a [Vector3<f32>],
    pub head_orientations: &'a [Quaternion<f32>],
    pub left_wrists: &'a [Vector3<f32>],
    pub right_wrists: &'a [Vector3<f32>],
    pub left_forearms: &'a [Vector3<f32>],
    pub right_forearms: &'a [Vector3<f32>],
}

impl SequenceInputs<'_> {
    pub fn lengths(&self) -> [usize; 6] {
        [
            self.head_positions.len(),
            self.head_orientations.len(),
            self.left_wrists.len(),
            self.right_wrists.len(),
            self.left_forearms.len(),
            self.right_forearms.len(),
        ]
    }

    /// Number of complete frames (length of the shortest field)
    pub fn len(&self) -> usize {
        self.lengths().iter().copied().min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mismatch(&self) -> Option<LengthMismatch> {
        let lengths = self.lengths();
        if lengths.iter().all(|&l| l == lengths[0]) {
            None
        } else {
            Some(LengthMismatch { lengths })
        }
    }

    /// Frame `index`, or None past the shortest field
    pub fn frame(&self, index: usize) -> Option<FrameInput> {
        if index >= self.len() {
            return None;
        }
        Some(FrameInput {
            head: HeadPose::new(self.head_positions[index], self.head_orientations[index]),
            left: ArmSample::new(self.left_wrists[index], self.left_forearms[index]),
            right: ArmSample::new(self.right_wrists[index], self.right_forearms[index]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_xyzw_order() {
        let head = HeadPose::from_xyzw([1.0, 2.0, 3.0], [0.1, 0.2, 0.3, 0.9]);
        assert_eq!(head.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(head.orientation.w, 0.9);
        assert_eq!(head.orientation.i, 0.1);
        assert_eq!(head.orientation.j, 0.2);
        assert_eq!(head.orientation.k, 0.3);
    }

    #[test]
    fn test_arm_tracking_and_side_access() {
        let mut frame = FrameInput::new(
            HeadPose::identity_at(Vector3::new(0.0, 1.6, 0.0)),
            ArmSample::new(Vector3::new(-0.3, 1.0, 0.2), Vector3::new(-0.2, 1.2, 0.1)),
            ArmSample::new(Vector3::new(0.3, 1.0, 0.2), Vector3::new(0.2, 1.2, 0.1)),
        );
        assert!(frame.arm(Side::Left).is_tracked());
        assert_eq!(frame.arm(Side::Right).wrist.x, 0.3);

        frame.arm_mut(Side::Left).forearm.y = f32::NAN;
        assert!(!frame.left.is_tracked());
        assert!(frame.right.is_tracked());
    }

    #[test]
    fn test_normalize_orientation() {
        let q = normalize_orientation(Quaternion::new(3.0, 0.0, 0.0, 0.0)).unwrap();
        assert!((q.w - 1.0).abs() < 1e-6);

        // squared norm overflows f32 without the rescale
        let huge = normalize_orientation(Quaternion::new(2e19, 2e19, 0.0, 0.0)).unwrap();
        assert!((huge.w - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((huge.i - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        assert!(normalize_orientation(Quaternion::new(0.0, 0.0, 0.0, 0.0)).is_none());
        assert!(normalize_orientation(Quaternion::new(1e-8, 0.0, 0.0, 0.0)).is_none());
        assert!(normalize_orientation(Quaternion::new(f32::NAN, 0.0, 0.0, 1.0)).is_none());
        assert!(normalize_orientation(Quaternion::new(f32::INFINITY, 0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_sequence_len_is_shortest() {
        let points = vec![Vector3::zeros(); 5];
        let short = vec![Vector3::zeros(); 3];
        let quats = vec![Quaternion::identity(); 4];
        let inputs = SequenceInputs {
            head_positions: &points,
            head_orientations: &quats,
            left_wrists: &points,
            right_wrists: &short,
            left_forearms: &points,
            right_forearms: &points,
        };
        assert_eq!(inputs.len(), 3);
        assert!(inputs.frame(2).is_some());
        assert!(inputs.frame(3).is_none());

        let mismatch = inputs.mismatch().unwrap();
        assert_eq!(mismatch.shortest(), 3);
        assert_eq!(mismatch.longest(), 5);
        assert_eq!(mismatch.dropped(), 2);
    }

    #[test]
    fn test_equal_lengths_no_mismatch() {
        let points = vec![Vector3::zeros(); 2];
        let quats = vec![Quaternion::identity(); 2];
        let inputs = SequenceInputs {
            head_positions: &points,
            head_orientations: &quats,
            left_wrists: &points,
            right_wrists: &points,
            left_forearms: &points,
            right_forearms: &points,
        };
        assert!(inputs.mismatch().is_none());
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn test_empty_sequence() {
        let inputs = SequenceInputs {
            head_positions: &[],
            head_orientations: &[],
            left_wrists: &[],
            right_wrists: &[],
            left_forearms: &[],
            right_forearms: &[],
        };
        assert!(inputs.is_empty());
        assert!(inputs.frame(0).is_none());
    }
}
