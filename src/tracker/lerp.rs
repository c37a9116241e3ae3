use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::{ReconstructError, Result};
use crate::pose::frame::normalize_orientation;
use crate::pose::{HeadPose, PoseSample};

/// Head pose stream that can be sampled at arbitrary timestamps.
///
/// Head and hand tracking usually run at different rates; the head is
/// resampled onto the hand timestamps before reconstruction.
#[derive(Debug, Clone)]
pub struct HeadTrack {
    samples: Vec<PoseSample>,
}

impl HeadTrack {
    /// 1サンプル以上、タイムスタンプは有限かつ狭義単調増加であること
    pub fn new(samples: Vec<PoseSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(ReconstructError::insufficient_data("head track has no samples"));
        }
        if let Some(bad) = samples.iter().find(|s| !s.timestamp.is_finite()) {
            return Err(ReconstructError::invalid_parameter("timestamp", bad.timestamp));
        }
        for pair in samples.windows(2) {
            let (prev, cur) = (pair[0].timestamp, pair[1].timestamp);
            if cur <= prev {
                return Err(ReconstructError::out_of_order(prev, cur));
            }
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// (first, last) timestamp
    pub fn time_range(&self) -> (f64, f64) {
        let first = self.samples[0].timestamp;
        let last = self.samples[self.samples.len() - 1].timestamp;
        (first, last)
    }

    /// Pose at `t`, clamped to the track's time range.
    ///
    /// Position is linearly interpolated, orientation slerped along the shortest path.
    pub fn sample_at(&self, t: f64) -> HeadPose {
        let (first, last) = self.time_range();
        if t.is_nan() || t <= first {
            return self.samples[0].pose;
        }
        if t >= last {
            return self.samples[self.samples.len() - 1].pose;
        }

        // first index with timestamp > t; in 1..len because first < t < last
        let upper = self.samples.partition_point(|s| s.timestamp <= t);
        let a = &self.samples[upper - 1];
        let b = &self.samples[upper];
        let alpha = ((t - a.timestamp) / (b.timestamp - a.timestamp)) as f32;

        HeadPose::new(
            lerp_position(&a.pose.position, &b.pose.position, alpha),
            slerp(a.pose.orientation, b.pose.orientation, alpha),
        )
    }

    pub fn resample(&self, timestamps: &[f64]) -> Vec<HeadPose> {
        timestamps.iter().map(|&t| self.sample_at(t)).collect()
    }
}

fn lerp_position(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    a * (1.0 - t) + b * t
}

/// Shortest-path slerp; falls back to nlerp for nearly parallel rotations.
/// Unusable quaternions are passed through so the reconstructor can reject them.
fn slerp(a: Quaternion<f32>, b: Quaternion<f32>, t: f32) -> Quaternion<f32> {
    let (Some(ua), Some(mut ub)) = (normalize_orientation(a), normalize_orientation(b)) else {
        return if t < 0.5 { a } else { b };
    };
    // q and -q are the same rotation; take the nearer one
    if ua.coords.dot(&ub.coords) < 0.0 {
        ub = UnitQuaternion::new_unchecked(-ub.into_inner());
    }
    match ua.try_slerp(&ub, t, 1e-6) {
        Some(q) => q.into_inner(),
        None => ua.nlerp(&ub, t).into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_3(a: &Vector3<f32>, b: &Vector3<f32>, eps: f32) -> bool {
        (a - b).norm() < eps
    }

    fn sample(t: f64, x: f32, q: Quaternion<f32>) -> PoseSample {
        PoseSample::new(t, HeadPose::new(Vector3::new(x, 1.6, 0.0), q))
    }

    fn yaw(deg: f32) -> Quaternion<f32> {
        *UnitQuaternion::from_axis_angle(&Vector3::y_axis(), deg.to_radians()).quaternion()
    }

    fn track() -> HeadTrack {
        HeadTrack::new(vec![
            sample(0.0, 0.0, yaw(0.0)),
            sample(1.0, 1.0, yaw(90.0)),
            sample(2.0, 3.0, yaw(90.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_track_rejected() {
        assert!(matches!(
            HeadTrack::new(Vec::new()),
            Err(ReconstructError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_unordered_track_rejected() {
        let err = HeadTrack::new(vec![
            sample(0.0, 0.0, yaw(0.0)),
            sample(0.0, 1.0, yaw(0.0)),
        ])
        .unwrap_err();
        assert_eq!(err, ReconstructError::out_of_order(0.0, 0.0));
    }

    #[test]
    fn test_non_finite_timestamp_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            // first sample included
            let leading = HeadTrack::new(vec![sample(bad, 0.0, yaw(0.0)), sample(1.0, 1.0, yaw(0.0))]);
            assert!(matches!(
                leading,
                Err(ReconstructError::InvalidParameter { name: "timestamp", .. })
            ));
            let trailing = HeadTrack::new(vec![sample(0.0, 0.0, yaw(0.0)), sample(bad, 1.0, yaw(0.0))]);
            assert!(trailing.is_err());
        }
    }

    #[test]
    fn test_sample_at_knots() {
        let track = track();
        assert!(approx_eq_3(&track.sample_at(1.0).position, &Vector3::new(1.0, 1.6, 0.0), 1e-6));
        assert!(approx_eq_3(&track.sample_at(2.0).position, &Vector3::new(3.0, 1.6, 0.0), 1e-6));
    }

    #[test]
    fn test_interpolate_midpoint() {
        let track = track();
        let pose = track.sample_at(0.5);
        assert!(approx_eq_3(&pose.position, &Vector3::new(0.5, 1.6, 0.0), 1e-6));

        let expected = UnitQuaternion::from_quaternion(yaw(45.0));
        let got = UnitQuaternion::from_quaternion(pose.orientation);
        assert!(got.angle_to(&expected) < 1e-3);

        let pose = track.sample_at(1.5);
        assert!(approx_eq_3(&pose.position, &Vector3::new(2.0, 1.6, 0.0), 1e-6));
    }

    #[test]
    fn test_clamp_to_range() {
        let track = track();
        assert_eq!(track.sample_at(-1.0), track.sample_at(0.0));
        assert_eq!(track.sample_at(10.0), track.sample_at(2.0));
    }

    #[test]
    fn test_single_sample_track() {
        let only = sample(3.0, 0.2, yaw(30.0));
        let track = HeadTrack::new(vec![only]).unwrap();
        assert_eq!(track.sample_at(0.0), only.pose);
        assert_eq!(track.sample_at(5.0), only.pose);
    }

    #[test]
    fn test_slerp_shortest_path() {
        // q and -q are the same rotation: interpolation must not swing through 360
        let a = yaw(10.0);
        let b = -yaw(20.0);
        let mid = UnitQuaternion::from_quaternion(slerp(a, b, 0.5));
        assert!(mid.angle_to(&UnitQuaternion::from_quaternion(yaw(15.0))) < 1e-3);
    }

    #[test]
    fn test_slerp_huge_components() {
        let a = Quaternion::new(2e19, 0.0, 2e19, 0.0);
        let mid = UnitQuaternion::from_quaternion(slerp(a, yaw(90.0), 0.5));
        assert!(mid.angle_to(&UnitQuaternion::from_quaternion(yaw(90.0))) < 1e-3);
    }

    #[test]
    fn test_resample_normalized() {
        let track = track();
        let poses = track.resample(&[0.1, 0.25, 0.75, 1.2]);
        assert_eq!(poses.len(), 4);
        for pose in poses {
            assert!((pose.orientation.norm() - 1.0).abs() < 1e-5);
        }
    }
}
