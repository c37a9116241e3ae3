//! Elbow estimation from shoulder, forearm proxy and wrist
//!
//! The elbow is placed `upper_arm_length` from the shoulder along the ray toward
//! the forearm proxy point. Two plausibility stages follow:
//! - forearm check: |forearm - wrist| compared against the model forearm length (warning only)
//! - flexion clamp (optional): the upper arm is rotated in the shoulder/elbow/wrist
//!   plane until elbow flexion is within the configured maximum

use nalgebra::Vector3;

use super::anthropometry::AnthropometricModel;
use super::angles::elbow_flexion;
use crate::config::{DegeneratePolicy, ReconstructionConfig};
use crate::error::{ReconstructError, Result};
use crate::pose::Side;

/// Shortest vector that still defines a direction (meters)
pub(crate) const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// Non-fatal plausibility findings for one arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmWarning {
    /// |forearm - wrist| deviates from the model forearm length beyond tolerance
    ForearmLengthMismatch {
        side: Side,
        measured: f32,
        expected: f32,
    },
    /// Elbow was moved to bring flexion back to the limit
    FlexionClamped {
        side: Side,
        from_deg: f32,
        to_deg: f32,
    },
    /// Flexion exceeds the limit but no elbow position on the upper-arm sphere satisfies it
    FlexionUnreachable { side: Side, flexion_deg: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArmEstimate {
    pub elbow: Vector3<f32>,
    pub warnings: Vec<ArmWarning>,
}

pub struct ArmSolver {
    upper_arm: f32,
    forearm: f32,
    forearm_tolerance: f32,
    clamp_flexion: bool,
    max_flexion_deg: f32,
    degenerate: DegeneratePolicy,
}

impl ArmSolver {
    pub fn new(model: &AnthropometricModel, config: &ReconstructionConfig) -> Result<Self> {
        if config.forearm_tolerance.is_nan() || config.forearm_tolerance < 0.0 {
            return Err(ReconstructError::invalid_parameter(
                "forearm_tolerance",
                config.forearm_tolerance,
            ));
        }
        let max_flexion = config.max_elbow_flexion_deg;
        if max_flexion.is_nan() || max_flexion <= 0.0 || max_flexion > 180.0 {
            return Err(ReconstructError::invalid_parameter(
                "max_elbow_flexion_deg",
                config.max_elbow_flexion_deg,
            ));
        }
        Ok(Self {
            upper_arm: model.upper_arm_length(),
            forearm: model.forearm_length(),
            forearm_tolerance: config.forearm_tolerance,
            clamp_flexion: config.clamp_elbow_flexion,
            max_flexion_deg: config.max_elbow_flexion_deg,
            degenerate: config.degenerate,
        })
    }

    /// Estimates the elbow of one arm.
    ///
    /// Fails with `DegenerateGeometry` when the forearm point coincides with the
    /// shoulder, unless the fallback policy is active (elbow straight ahead along +Z).
    pub fn solve(
        &self,
        side: Side,
        shoulder: Vector3<f32>,
        forearm: Vector3<f32>,
        wrist: Vector3<f32>,
    ) -> Result<ArmEstimate> {
        let mut warnings = Vec::new();

        let direction = match (forearm - shoulder).try_normalize(MIN_DIRECTION_LENGTH) {
            Some(d) => d,
            None => match self.degenerate {
                DegeneratePolicy::Error => {
                    return Err(ReconstructError::degenerate(format!(
                        "{} forearm point coincides with shoulder",
                        side.label()
                    )));
                }
                DegeneratePolicy::Fallback => Vector3::z(),
            },
        };
        let mut elbow = shoulder + direction * self.upper_arm;

        if let Some(w) = self.check_forearm(side, forearm, wrist) {
            warnings.push(w);
        }

        if self.clamp_flexion {
            let (clamped, warning) = self.clamp_elbow(side, shoulder, elbow, wrist);
            elbow = clamped;
            warnings.extend(warning);
        }

        Ok(ArmEstimate { elbow, warnings })
    }

    fn check_forearm(&self, side: Side, forearm: Vector3<f32>, wrist: Vector3<f32>) -> Option<ArmWarning> {
        let measured = (forearm - wrist).norm();
        let deviation = (measured - self.forearm).abs() / self.forearm;
        if deviation <= self.forearm_tolerance {
            return None;
        }
        tracing::warn!(
            side = side.label(),
            measured,
            expected = self.forearm,
            "forearm segment deviates from model length"
        );
        Some(ArmWarning::ForearmLengthMismatch {
            side,
            measured,
            expected: self.forearm,
        })
    }

    /// Rotates the upper arm about the shoulder, inside the shoulder/elbow/wrist
    /// plane, to the nearest position whose flexion equals the limit.
    ///
    /// With |shoulder - elbow| = L and |shoulder - wrist| = D fixed, the interior
    /// elbow angle E is a function of |elbow - wrist| = EW:
    /// D² = L² + EW² - 2·L·EW·cos(E). Solving for EW at the limit angle gives the
    /// admissible EW interval; the elbow is moved to the closest end of it.
    fn clamp_elbow(
        &self,
        side: Side,
        shoulder: Vector3<f32>,
        elbow: Vector3<f32>,
        wrist: Vector3<f32>,
    ) -> (Vector3<f32>, Option<ArmWarning>) {
        let flexion = match elbow_flexion(shoulder, elbow, wrist) {
            Some(f) if f > self.max_flexion_deg => f,
            _ => return (elbow, None),
        };
        let unreachable = || {
            tracing::warn!(side = side.label(), flexion, "elbow flexion limit unreachable");
            (elbow, Some(ArmWarning::FlexionUnreachable { side, flexion_deg: flexion }))
        };

        let l = self.upper_arm;
        let to_wrist = wrist - shoulder;
        let d = to_wrist.norm();
        let (sin_e, cos_e) = (180.0 - self.max_flexion_deg).to_radians().sin_cos();
        let disc = d * d - l * l * sin_e * sin_e;
        if disc < 0.0 {
            return unreachable();
        }
        let root = disc.sqrt();
        let hi = l * cos_e + root;
        let lo = if d >= l { d - l } else { l * cos_e - root };
        if lo <= 0.0 && d < l {
            return unreachable();
        }

        // In-plane basis: u toward the wrist, p toward the current elbow
        let Some(u) = to_wrist.try_normalize(MIN_DIRECTION_LENGTH) else {
            return unreachable();
        };
        let arm = (elbow - shoulder) / l;
        let Some(p) = (arm - u * arm.dot(&u)).try_normalize(MIN_DIRECTION_LENGTH) else {
            return unreachable();
        };

        let ew = (elbow - wrist).norm().clamp(lo, hi);
        let cos_theta = ((l * l + d * d - ew * ew) / (2.0 * l * d)).clamp(-1.0, 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let clamped = shoulder + (u * cos_theta + p * sin_theta) * l;

        let to_deg = elbow_flexion(shoulder, clamped, wrist).unwrap_or(self.max_flexion_deg);
        tracing::debug!(side = side.label(), from = flexion, to = to_deg, "elbow flexion clamped");
        (
            clamped,
            Some(ArmWarning::FlexionClamped {
                side,
                from_deg: flexion,
                to_deg,
            }),
        )
    }
}
