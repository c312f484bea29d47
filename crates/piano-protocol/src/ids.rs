//! 帧 ID 常量定义
//!
//! 机械臂控制帧沿用 Piper 协议的 0x15x / 0x47x 段；
//! 灵巧手手指指令的 ID 由每只手单独绑定（见 [`crate::hand`]）。

// ============================================================================
// 机械臂控制帧 ID 常量
// ============================================================================

/// 运动控制指令（控制模式 + MOVE 模式 + 速度）
pub const ID_MOTION_CONTROL: u32 = 0x151;

/// 末端位姿控制指令
pub const ID_END_POSE_CONTROL_1: u32 = 0x152;
pub const ID_END_POSE_CONTROL_2: u32 = 0x153;
pub const ID_END_POSE_CONTROL_3: u32 = 0x154;

/// 关节控制指令
pub const ID_JOINT_CONTROL_12: u32 = 0x155;
pub const ID_JOINT_CONTROL_34: u32 = 0x156;
pub const ID_JOINT_CONTROL_56: u32 = 0x157;

/// 电机使能/失能设置指令
pub const ID_MOTOR_ENABLE: u32 = 0x471;

// ============================================================================
// 灵巧手默认帧 ID
// ============================================================================

/// 左手手指指令默认 ID
pub const DEFAULT_LEFT_HAND_ID: u32 = 0x28;

/// 右手手指指令默认 ID
pub const DEFAULT_RIGHT_HAND_ID: u32 = 0x27;

// ============================================================================
// ID 分类
// ============================================================================

/// 帧类型分类（用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// 关节载荷帧（0x155~0x157）
    JointPayload,
    /// 位姿载荷帧（0x152~0x154）
    PosePayload,
    /// 运动控制帧（0x151）
    MotionControl,
    /// 使能/失能帧（0x471）
    MotorEnable,
    /// 其他（手指指令或透传帧）
    Other,
}

impl FrameKind {
    /// 根据帧 ID 判断类型
    pub fn from_id(id: u32) -> Self {
        match id {
            ID_JOINT_CONTROL_12..=ID_JOINT_CONTROL_56 => FrameKind::JointPayload,
            ID_END_POSE_CONTROL_1..=ID_END_POSE_CONTROL_3 => FrameKind::PosePayload,
            ID_MOTION_CONTROL => FrameKind::MotionControl,
            ID_MOTOR_ENABLE => FrameKind::MotorEnable,
            _ => FrameKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_kind_ranges() {
        assert_eq!(FrameKind::from_id(0x155), FrameKind::JointPayload);
        assert_eq!(FrameKind::from_id(0x157), FrameKind::JointPayload);
        assert_eq!(FrameKind::from_id(0x152), FrameKind::PosePayload);
        assert_eq!(FrameKind::from_id(0x154), FrameKind::PosePayload);
        assert_eq!(FrameKind::from_id(0x151), FrameKind::MotionControl);
        assert_eq!(FrameKind::from_id(0x471), FrameKind::MotorEnable);
        assert_eq!(FrameKind::from_id(0x28), FrameKind::Other);
        assert_eq!(FrameKind::from_id(0x150), FrameKind::Other);
    }
}
