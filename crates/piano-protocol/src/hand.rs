//! 灵巧手手指定义
//!
//! 手指向量是"当前指令位置"：每个有名字的手指占一个槽位，
//! 其余槽位（拇指、拇指旋转等）在弹琴时保持预设值不变。

use crate::codec::encode_finger_frame;
use crate::{BusFrame, FINGER_COMMAND_PREFIX, ProtocolError};
use std::fmt;
use std::str::FromStr;

/// 弹琴用到的四根手指
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FingerName {
    /// 食指
    Index,
    /// 中指
    Middle,
    /// 无名指
    Ring,
    /// 小指
    Pinky,
}

impl FingerName {
    pub const ALL: [FingerName; 4] = [
        FingerName::Index,
        FingerName::Middle,
        FingerName::Ring,
        FingerName::Pinky,
    ];

    /// 手指在手指向量中的槽位
    pub fn slot(self) -> usize {
        match self {
            FingerName::Index => 2,
            FingerName::Middle => 3,
            FingerName::Ring => 4,
            FingerName::Pinky => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FingerName::Index => "index",
            FingerName::Middle => "middle",
            FingerName::Ring => "ring",
            FingerName::Pinky => "pinky",
        }
    }
}

impl FromStr for FingerName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(FingerName::Index),
            "middle" => Ok(FingerName::Middle),
            "ring" => Ok(FingerName::Ring),
            "pinky" => Ok(FingerName::Pinky),
            other => Err(ProtocolError::UnknownFinger(other.to_string())),
        }
    }
}

impl fmt::Display for FingerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 灵巧手型号
///
/// 不同型号的手指向量长度和静止预设不同，手指槽位一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HandModel {
    /// L10：6 个槽位
    #[default]
    L10,
    /// O7：7 个槽位
    O7,
}

impl HandModel {
    /// 手指向量长度
    pub fn slot_count(self) -> usize {
        self.rest_preset().len()
    }

    /// 弹琴时的静止预设
    pub fn rest_preset(self) -> &'static [u8] {
        match self {
            HandModel::L10 => &[0, 0, 225, 225, 225, 225],
            HandModel::O7 => &[0, 255, 235, 235, 235, 235, 100],
        }
    }
}

/// 手指指令帧
///
/// 载荷为 `0x01` 前缀 + 完整手指向量。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerCommand<'a> {
    /// 该手绑定的帧 ID
    pub hand_id: u32,
    /// 当前手指向量快照
    pub vector: &'a [u8],
}

impl<'a> FingerCommand<'a> {
    pub fn new(hand_id: u32, vector: &'a [u8]) -> Self {
        Self { hand_id, vector }
    }

    /// 转换为总线帧
    pub fn to_frame(&self) -> Result<BusFrame, ProtocolError> {
        let data = encode_finger_frame(FINGER_COMMAND_PREFIX, self.vector)?;
        BusFrame::try_new(self.hand_id, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finger_slots() {
        assert_eq!(FingerName::Index.slot(), 2);
        assert_eq!(FingerName::Middle.slot(), 3);
        assert_eq!(FingerName::Ring.slot(), 4);
        assert_eq!(FingerName::Pinky.slot(), 5);
    }

    #[test]
    fn test_finger_from_str() {
        for finger in FingerName::ALL {
            assert_eq!(finger.as_str().parse::<FingerName>().unwrap(), finger);
        }
        assert_eq!(
            "thumb".parse::<FingerName>().unwrap_err(),
            ProtocolError::UnknownFinger("thumb".to_string())
        );
    }

    #[test]
    fn test_every_slot_fits_every_model() {
        for model in [HandModel::L10, HandModel::O7] {
            for finger in FingerName::ALL {
                assert!(finger.slot() < model.slot_count());
            }
        }
    }

    #[test]
    fn test_finger_command_frame() {
        let vector = [0, 0, 153, 225, 225, 225];
        let frame = FingerCommand::new(0x28, &vector).to_frame().unwrap();
        assert_eq!(frame.id, 0x28);
        assert_eq!(frame.data_slice(), &[0x01, 0, 0, 153, 225, 225, 225]);
    }
}
