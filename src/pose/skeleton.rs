use std::collections::BTreeMap;
use std::ops::Index;

use nalgebra::Vector3;

use super::joint::Joint;

/// 1フレーム分の再構成済み上半身。
///
/// Always fully populated: a value only exists once every joint has been
/// computed. Consumers treat it as a read-only snapshot; filters build new values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpperBodySkeleton {
    joints: [Vector3<f32>; Joint::COUNT],
}

impl UpperBodySkeleton {
    pub(crate) fn from_joints(joints: [Vector3<f32>; Joint::COUNT]) -> Self {
        Self { joints }
    }

    pub fn get(&self, joint: Joint) -> Vector3<f32> {
        self.joints[joint as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, Vector3<f32>)> + '_ {
        Joint::ALL.iter().map(move |&j| (j, self.get(j)))
    }

    /// Builds a new skeleton by transforming every joint
    pub fn map_joints<F>(&self, mut f: F) -> Self
    where
        F: FnMut(Joint, Vector3<f32>) -> Vector3<f32>,
    {
        Self {
            joints: std::array::from_fn(|i| f(Joint::ALL[i], self.joints[i])),
        }
    }

    pub fn distance(&self, a: Joint, b: Joint) -> f32 {
        (self.get(a) - self.get(b)).norm()
    }

    /// Joint name -> [x, y, z], for serialization by consumers
    pub fn to_named_map(&self) -> BTreeMap<&'static str, [f32; 3]> {
        self.iter()
            .map(|(joint, p)| (joint.name(), [p.x, p.y, p.z]))
            .collect()
    }

    pub fn is_finite(&self) -> bool {
        self.joints.iter().all(|p| p.iter().all(|c| c.is_finite()))
    }
}

impl Index<Joint> for UpperBodySkeleton {
    type Output = Vector3<f32>;

    fn index(&self, joint: Joint) -> &Self::Output {
        &self.joints[joint as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered() -> UpperBodySkeleton {
        UpperBodySkeleton::from_joints(std::array::from_fn(|i| {
            Vector3::new(i as f32, 0.0, 0.0)
        }))
    }

    #[test]
    fn test_get_and_index_agree() {
        let s = numbered();
        for joint in Joint::ALL {
            assert_eq!(s.get(joint), s[joint]);
            assert_eq!(s[joint].x, joint as usize as f32);
        }
    }

    #[test]
    fn test_named_map_has_every_joint() {
        let map = numbered().to_named_map();
        assert_eq!(map.len(), Joint::COUNT);
        assert_eq!(map["neck"], [1.0, 0.0, 0.0]);
        assert_eq!(map["right_forearm"], [12.0, 0.0, 0.0]);
    }

    #[test]
    fn test_map_joints() {
        let shifted = numbered().map_joints(|_, p| p + Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(shifted[Joint::Head], Vector3::new(0.0, 1.0, 0.0));
        assert!((shifted.distance(Joint::Head, Joint::Neck) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_finite() {
        assert!(numbered().is_finite());
        let bad = numbered().map_joints(|j, p| if j == Joint::Neck { Vector3::repeat(f32::NAN) } else { p });
        assert!(!bad.is_finite());
    }
}
