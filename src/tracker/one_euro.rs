use nalgebra::Vector3;

use super::smooth::{check_order, JointFilter};
use crate::config::FilterConfig;
use crate::error::{ReconstructError, Result};
use crate::pose::{Joint, UpperBodySkeleton};

/// Low-pass filter component
#[derive(Clone, Copy)]
struct LowPassFilter {
    prev: Option<f32>,
}

impl LowPassFilter {
    fn new() -> Self {
        Self { prev: None }
    }

    fn filter(&mut self, value: f32, alpha: f32) -> f32 {
        let result = match self.prev {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        self.prev = Some(result);
        result
    }
}

/// 指数平滑の係数: カットオフ周波数の時定数 tau に対する dt の割合
fn smoothing_factor(dt: f32, cutoff: f32) -> f32 {
    let tau = 1.0 / (std::f32::consts::TAU * cutoff);
    dt / (dt + tau)
}

#[derive(Clone, Copy)]
struct OneEuroParams {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,
}

/// One Euro filter for a single scalar value
#[derive(Clone, Copy)]
struct ScalarFilter {
    x_filter: LowPassFilter,
    dx_filter: LowPassFilter,
    prev_value: Option<f32>,
}

impl ScalarFilter {
    fn new() -> Self {
        Self {
            x_filter: LowPassFilter::new(),
            dx_filter: LowPassFilter::new(),
            prev_value: None,
        }
    }

    fn filter(&mut self, value: f32, dt: f32, params: &OneEuroParams) -> f32 {
        let dx = match self.prev_value {
            Some(prev) if dt > 0.0 => (value - prev) / dt,
            _ => 0.0,
        };
        self.prev_value = Some(value);

        let edx = self.dx_filter.filter(dx, smoothing_factor(dt, params.d_cutoff));
        let cutoff = params.min_cutoff + params.beta * edx.abs();
        self.x_filter.filter(value, smoothing_factor(dt, cutoff))
    }
}

/// One Euro filter over every joint coordinate.
///
/// dt comes from frame timestamps, so replayed and live streams filter the same.
pub struct SkeletonFilter {
    params: OneEuroParams,
    joints: [[ScalarFilter; 3]; Joint::COUNT],
    last_time: Option<f64>,
}

impl SkeletonFilter {
    pub fn new(min_cutoff: f32, beta: f32, d_cutoff: f32) -> Result<Self> {
        if min_cutoff.is_nan() || min_cutoff <= 0.0 {
            return Err(ReconstructError::invalid_parameter("min_cutoff", min_cutoff));
        }
        if beta.is_nan() || beta < 0.0 {
            return Err(ReconstructError::invalid_parameter("beta", beta));
        }
        if d_cutoff.is_nan() || d_cutoff <= 0.0 {
            return Err(ReconstructError::invalid_parameter("d_cutoff", d_cutoff));
        }
        Ok(Self {
            params: OneEuroParams {
                min_cutoff,
                beta,
                d_cutoff,
            },
            joints: [[ScalarFilter::new(); 3]; Joint::COUNT],
            last_time: None,
        })
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        Self::new(config.min_cutoff, config.beta, config.d_cutoff)
    }
}

impl JointFilter for SkeletonFilter {
    fn apply(&mut self, timestamp: f64, skeleton: &UpperBodySkeleton) -> Result<UpperBodySkeleton> {
        check_order(self.last_time, timestamp)?;
        let dt = match self.last_time {
            Some(prev) => (timestamp - prev) as f32,
            None => 0.0,
        };
        self.last_time = Some(timestamp);

        let params = self.params;
        let joints = &mut self.joints;
        Ok(skeleton.map_joints(|joint, p| {
            let axes = &mut joints[joint as usize];
            Vector3::new(
                axes[0].filter(p.x, dt, &params),
                axes[1].filter(p.y, dt, &params),
                axes[2].filter(p.z, dt, &params),
            )
        }))
    }

    fn reset(&mut self) {
        self.joints = [[ScalarFilter::new(); 3]; Joint::COUNT];
        self.last_time = None;
    }
}
