pub mod frame;
pub mod joint;
pub mod skeleton;

pub use frame::{ArmSample, FrameInput, HeadPose, LengthMismatch, PoseSample, SequenceInputs};
pub use joint::{Joint, Side};
pub use skeleton::UpperBodySkeleton;
