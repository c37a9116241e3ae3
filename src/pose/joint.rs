/// フレームごとに出力する上半身の関節
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum Joint {
    Head = 0,
    Neck = 1,
    UpperSpine = 2,
    MidSpine = 3,
    LowerSpine = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftForearm = 11,
    RightForearm = 12,
}

impl Joint {
    pub const COUNT: usize = 13;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Head,
        Joint::Neck,
        Joint::UpperSpine,
        Joint::MidSpine,
        Joint::LowerSpine,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftForearm,
        Joint::RightForearm,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Neck => "neck",
            Self::UpperSpine => "upper_spine",
            Self::MidSpine => "mid_spine",
            Self::LowerSpine => "lower_spine",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftForearm => "left_forearm",
            Self::RightForearm => "right_forearm",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|j| j.name() == name)
    }

    /// 推定ではなくトラッキング入力をそのまま使う関節
    pub fn is_tracked(self) -> bool {
        matches!(
            self,
            Self::Head | Self::LeftWrist | Self::RightWrist | Self::LeftForearm | Self::RightForearm
        )
    }
}

/// Body side. Left is toward -right-vector, right toward +right-vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Sign applied to the body right-vector for lateral offsets
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn shoulder(self) -> Joint {
        match self {
            Self::Left => Joint::LeftShoulder,
            Self::Right => Joint::RightShoulder,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            Self::Left => Joint::LeftElbow,
            Self::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(self) -> Joint {
        match self {
            Self::Left => Joint::LeftWrist,
            Self::Right => Joint::RightWrist,
        }
    }

    pub fn forearm(self) -> Joint {
        match self {
            Self::Left => Joint::LeftForearm,
            Self::Right => Joint::RightForearm,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}
