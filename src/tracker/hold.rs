use super::body::SkeletonReconstructor;
use crate::error::Result;
use crate::pose::{ArmSample, FrameInput, Side, UpperBodySkeleton};

/// 再構成できなかったフレームをまたいでライブストリームを継続させる。
///
/// フレーム単位のエラー (`DegenerateGeometry`) は直前の有効な骨格で置き換え、
/// それ以外のエラーはそのまま返す。片手だけ見失ったフレームは、その手の
/// 直前の有効な入力で補ってから再構成する (`resolve_frame`)。
pub struct LastValidHold {
    last: Option<UpperBodySkeleton>,
    held: usize,
    /// Last tracked arm per side, indexed by `side_index`
    arms: [Option<ArmSample>; 2],
    arms_held: usize,
}

impl LastValidHold {
    pub fn new() -> Self {
        Self {
            last: None,
            held: 0,
            arms: [None; 2],
            arms_held: 0,
        }
    }

    /// Skeleton to emit for this frame; `None` while nothing valid has been seen yet
    pub fn resolve(&mut self, result: Result<UpperBodySkeleton>) -> Result<Option<UpperBodySkeleton>> {
        match result {
            Ok(skeleton) => {
                self.last = Some(skeleton);
                Ok(Some(skeleton))
            }
            Err(e) if e.is_frame_local() => {
                self.held += 1;
                tracing::debug!(held = self.held, has_previous = self.last.is_some(), "frame skipped: {}", e);
                Ok(self.last)
            }
            Err(e) => Err(e),
        }
    }

    /// 見失った手を、その側で最後に追跡できていた手首・前腕点で置き換える。
    /// まだ一度も追跡できていない側はそのまま残す
    pub fn fill_arms(&mut self, frame: &FrameInput) -> FrameInput {
        let mut filled = *frame;
        for side in Side::BOTH {
            let slot = &mut self.arms[side_index(side)];
            let arm = filled.arm_mut(side);
            if arm.is_tracked() {
                *slot = Some(*arm);
            } else if let Some(previous) = *slot {
                *arm = previous;
                self.arms_held += 1;
                tracing::debug!(side = side.label(), arms_held = self.arms_held, "arm lost, holding last tracked");
            }
        }
        filled
    }

    /// Fills lost arms, reconstructs, and holds the whole skeleton if that still fails
    pub fn resolve_frame(
        &mut self,
        reconstructor: &SkeletonReconstructor,
        frame: &FrameInput,
    ) -> Result<Option<UpperBodySkeleton>> {
        let filled = self.fill_arms(frame);
        self.resolve(reconstructor.reconstruct_frame(&filled))
    }

    pub fn resolve_all<I>(&mut self, results: I) -> Result<Vec<Option<UpperBodySkeleton>>>
    where
        I: IntoIterator<Item = Result<UpperBodySkeleton>>,
    {
        results.into_iter().map(|r| self.resolve(r)).collect()
    }

    pub fn last(&self) -> Option<&UpperBodySkeleton> {
        self.last.as_ref()
    }

    /// Frames replaced since construction or the last reset
    pub fn held_frames(&self) -> usize {
        self.held
    }

    /// Arm inputs substituted by `fill_arms`, counted per side
    pub fn held_arms(&self) -> usize {
        self.arms_held
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

impl Default for LastValidHold {
    fn default() -> Self {
        Self::new()
    }
}
