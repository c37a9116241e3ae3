use super::one_euro::SkeletonFilter;
use crate::config::{Config, FilterMode, SmoothConfig};
use crate::error::{ReconstructError, Result};
use crate::pose::UpperBodySkeleton;

/// 再構成した骨格に適用する、状態を持つ時間方向フィルタ。
///
/// フレームはタイムスタンプの狭義単調増加順で渡すこと。
pub trait JointFilter {
    fn apply(&mut self, timestamp: f64, skeleton: &UpperBodySkeleton) -> Result<UpperBodySkeleton>;
    fn reset(&mut self);
}

/// Runs `filter` over a timed sequence, stopping at the first error
pub fn filter_sequence<F: JointFilter + ?Sized>(
    filter: &mut F,
    frames: &[(f64, UpperBodySkeleton)],
) -> Result<Vec<UpperBodySkeleton>> {
    frames
        .iter()
        .map(|(timestamp, skeleton)| filter.apply(*timestamp, skeleton))
        .collect()
}

/// `[smooth] mode` で選ばれたフィルタ。無効なら `None`
pub fn filter_from_config(config: &Config) -> Result<Option<Box<dyn JointFilter + Send>>> {
    Ok(match config.smooth.mode {
        FilterMode::None => None,
        FilterMode::Ema => Some(Box::new(SkeletonSmoother::from_config(&config.smooth)?)),
        FilterMode::OneEuro => Some(Box::new(SkeletonFilter::from_config(&config.filter)?)),
    })
}

/// 非有限のタイムスタンプと、前フレームから進んでいないタイムスタンプを拒否する
pub(crate) fn check_order(last: Option<f64>, timestamp: f64) -> Result<()> {
    if !timestamp.is_finite() {
        return Err(ReconstructError::invalid_parameter("timestamp", timestamp));
    }
    match last {
        Some(previous) if timestamp <= previous => Err(ReconstructError::out_of_order(previous, timestamp)),
        _ => Ok(()),
    }
}

/// 全関節位置のEMA平滑化フィルタ。
///
/// alpha = 1.0 で素通し、小さいほど遅れが大きい。
pub struct SkeletonSmoother {
    alpha: f32,
    prev: Option<UpperBodySkeleton>,
    last_time: Option<f64>,
}

impl SkeletonSmoother {
    pub fn new(alpha: f32) -> Result<Self> {
        if alpha.is_nan() || alpha <= 0.0 || alpha > 1.0 {
            return Err(ReconstructError::invalid_parameter("alpha", alpha));
        }
        Ok(Self {
            alpha,
            prev: None,
            last_time: None,
        })
    }

    pub fn from_config(config: &SmoothConfig) -> Result<Self> {
        Self::new(config.position)
    }
}

impl JointFilter for SkeletonSmoother {
    fn apply(&mut self, timestamp: f64, skeleton: &UpperBodySkeleton) -> Result<UpperBodySkeleton> {
        check_order(self.last_time, timestamp)?;
        self.last_time = Some(timestamp);

        let prev = match self.prev {
            Some(prev) => prev,
            None => {
                self.prev = Some(*skeleton);
                return Ok(*skeleton);
            }
        };

        let a = self.alpha;
        let result = skeleton.map_joints(|joint, p| p * a + prev[joint] * (1.0 - a));
        self.prev = Some(result);
        Ok(result)
    }

    fn reset(&mut self) {
        self.prev = None;
        self.last_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Joint;
    use nalgebra::Vector3;

    fn uniform(v: f32) -> UpperBodySkeleton {
        UpperBodySkeleton::from_joints([Vector3::repeat(v); Joint::COUNT])
    }

    fn approx_eq_skeleton(a: &UpperBodySkeleton, b: &UpperBodySkeleton, eps: f32) -> bool {
        a.iter().all(|(joint, p)| (p - b[joint]).norm() < eps)
    }

    #[test]
    fn test_first_frame_passthrough() {
        let mut s = SkeletonSmoother::new(0.5).unwrap();
        let frame = uniform(1.0);
        assert_eq!(s.apply(0.0, &frame).unwrap(), frame);
    }

    #[test]
    fn test_no_smoothing() {
        let mut s = SkeletonSmoother::new(1.0).unwrap();
        s.apply(0.0, &uniform(0.0)).unwrap();
        let result = s.apply(0.1, &uniform(2.0)).unwrap();
        assert!(approx_eq_skeleton(&result, &uniform(2.0), 1e-6));
    }

    #[test]
    fn test_position_smoothing() {
        let mut s = SkeletonSmoother::new(0.5).unwrap();
        s.apply(0.0, &uniform(0.0)).unwrap();
        let result = s.apply(0.1, &uniform(2.0)).unwrap();
        assert!(approx_eq_skeleton(&result, &uniform(1.0), 1e-6));
        // state follows the smoothed output
        let result = s.apply(0.2, &uniform(2.0)).unwrap();
        assert!(approx_eq_skeleton(&result, &uniform(1.5), 1e-6));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut s = SkeletonSmoother::new(0.5).unwrap();
        s.apply(1.0, &uniform(0.0)).unwrap();
        let err = s.apply(1.0, &uniform(1.0)).unwrap_err();
        assert_eq!(err, ReconstructError::out_of_order(1.0, 1.0));
        assert!(s.apply(0.5, &uniform(1.0)).is_err());
    }

    #[test]
    fn test_non_finite_timestamp_rejected() {
        let mut s = SkeletonSmoother::new(0.5).unwrap();
        // also on the very first frame
        assert!(matches!(
            s.apply(f64::NAN, &uniform(0.0)),
            Err(ReconstructError::InvalidParameter { name: "timestamp", .. })
        ));
        s.apply(0.0, &uniform(0.0)).unwrap();
        assert!(s.apply(f64::INFINITY, &uniform(1.0)).is_err());
        let next = s.apply(0.1, &uniform(1.0)).unwrap();
        assert!(next.is_finite());
    }

    #[test]
    fn test_reset() {
        let mut s = SkeletonSmoother::new(0.1).unwrap();
        s.apply(5.0, &uniform(1.0)).unwrap();
        s.reset();
        // earlier timestamps are fine after a reset; the frame passes through
        let result = s.apply(0.0, &uniform(4.0)).unwrap();
        assert_eq!(result, uniform(4.0));
    }

    #[test]
    fn test_invalid_alpha() {
        for &a in &[0.0_f32, -0.5, 1.5, f32::NAN] {
            assert!(SkeletonSmoother::new(a).is_err());
        }
    }

    #[test]
    fn test_filter_sequence() {
        let mut s = SkeletonSmoother::new(0.5).unwrap();
        let frames = vec![(0.0, uniform(0.0)), (0.1, uniform(2.0)), (0.2, uniform(2.0))];
        let out = filter_sequence(&mut s, &frames).unwrap();
        assert_eq!(out.len(), 3);
        assert!(approx_eq_skeleton(&out[2], &uniform(1.5), 1e-6));

        let mut s = SkeletonSmoother::new(0.5).unwrap();
        let unordered = vec![(0.2, uniform(0.0)), (0.1, uniform(2.0))];
        assert!(filter_sequence(&mut s, &unordered).is_err());
    }

    #[test]
    fn test_filter_from_config() {
        let mut config = Config::default();
        assert!(filter_from_config(&config).unwrap().is_some());

        config.smooth.mode = FilterMode::None;
        assert!(filter_from_config(&config).unwrap().is_none());

        config.smooth.mode = FilterMode::OneEuro;
        let mut filter = filter_from_config(&config).unwrap().unwrap();
        let frame = uniform(3.0);
        assert_eq!(filter.apply(0.0, &frame).unwrap(), frame);

        config.smooth.mode = FilterMode::Ema;
        config.smooth.position = 0.0;
        assert!(filter_from_config(&config).is_err());
    }
}
