pub mod angles;
pub mod anthropometry;
pub mod arm;
pub mod body;
pub mod hold;
pub mod lerp;
pub mod one_euro;
pub mod smooth;

pub use angles::SkeletonAngles;
pub use anthropometry::AnthropometricModel;
pub use arm::{ArmEstimate, ArmSolver, ArmWarning};
pub use body::{SequenceReconstruction, SkeletonReconstructor};
pub use hold::LastValidHold;
pub use lerp::HeadTrack;
pub use one_euro::SkeletonFilter;
pub use smooth::{filter_from_config, filter_sequence, JointFilter, SkeletonSmoother};
