//! 机械臂控制帧结构体定义
//!
//! 一次完整的关节或位姿运动由 **三个载荷帧 + 一个运动控制帧** 组成，
//! 顺序固定，必须在同一通道上连续发送，见 [`MoveSequence`]。

use crate::codec::{encode_control, encode_pair};
use crate::{BusFrame, ids::*};
use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// 运动控制指令 (0x151)
// ============================================================================

/// 控制模式（运动控制指令 Byte 0）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ControlMode {
    /// 待机模式
    Standby = 0x00,
    /// CAN 指令控制模式
    #[default]
    CanControl = 0x01,
}

/// MOVE 模式（运动控制指令 Byte 1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MoveMode {
    /// 点位模式（末端位姿，0x152~0x154）
    #[default]
    MoveP = 0x00,
    /// 关节模式（关节角度，0x155~0x157）
    MoveJ = 0x01,
}

/// 运动控制指令 (0x151)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionControlCommand {
    pub control_mode: ControlMode, // Byte 0
    pub move_mode: MoveMode,       // Byte 1
    pub speed_percent: u8,         // Byte 2 (0-100)
                                   // Byte 3-7: 保留
}

impl MotionControlCommand {
    /// 关节空间运动
    pub fn joint(speed_percent: u8) -> Self {
        Self {
            control_mode: ControlMode::CanControl,
            move_mode: MoveMode::MoveJ,
            speed_percent,
        }
    }

    /// 位姿空间运动
    pub fn pose(speed_percent: u8) -> Self {
        Self {
            control_mode: ControlMode::CanControl,
            move_mode: MoveMode::MoveP,
            speed_percent,
        }
    }

    /// 转换为总线帧
    pub fn to_frame(self) -> BusFrame {
        let data = encode_control(
            self.control_mode.into(),
            self.move_mode.into(),
            self.speed_percent,
        );
        BusFrame::from_array(ID_MOTION_CONTROL, data)
    }
}

// ============================================================================
// 关节目标 (0x155~0x157)
// ============================================================================

/// 六关节目标角度
///
/// 单位：0.001°（原始值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JointTarget(pub [i32; 6]);

impl JointTarget {
    /// 全零位（回零）
    pub const ZERO: JointTarget = JointTarget([0; 6]);

    /// 三个关节载荷帧：J1-J2, J3-J4, J5-J6
    pub fn payload_frames(&self) -> [BusFrame; 3] {
        let j = &self.0;
        [
            BusFrame::from_array(ID_JOINT_CONTROL_12, encode_pair(j[0], j[1])),
            BusFrame::from_array(ID_JOINT_CONTROL_34, encode_pair(j[2], j[3])),
            BusFrame::from_array(ID_JOINT_CONTROL_56, encode_pair(j[4], j[5])),
        ]
    }

    /// 构建完整运动序列（不做范围校验，见 [`crate::limits`]）
    pub fn move_sequence(&self, speed_percent: u8) -> MoveSequence {
        let [a, b, c] = self.payload_frames();
        MoveSequence::new(
            [a, b, c, MotionControlCommand::joint(speed_percent).to_frame()],
            MoveMode::MoveJ,
        )
    }
}

// ============================================================================
// 末端位姿目标 (0x152~0x154)
// ============================================================================

/// 末端位姿目标 `[x, y, z, rx, ry, rz]`
///
/// - X/Y/Z 单位：0.001mm（原始值）
/// - RX/RY/RZ 单位：0.001°（原始值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoseTarget(pub [i32; 6]);

impl PoseTarget {
    /// 三个位姿载荷帧：X-Y, Z-RX, RY-RZ
    pub fn payload_frames(&self) -> [BusFrame; 3] {
        let p = &self.0;
        [
            BusFrame::from_array(ID_END_POSE_CONTROL_1, encode_pair(p[0], p[1])),
            BusFrame::from_array(ID_END_POSE_CONTROL_2, encode_pair(p[2], p[3])),
            BusFrame::from_array(ID_END_POSE_CONTROL_3, encode_pair(p[4], p[5])),
        ]
    }

    /// 构建完整运动序列
    pub fn move_sequence(&self, speed_percent: u8) -> MoveSequence {
        let [a, b, c] = self.payload_frames();
        MoveSequence::new(
            [a, b, c, MotionControlCommand::pose(speed_percent).to_frame()],
            MoveMode::MoveP,
        )
    }
}

// ============================================================================
// 运动序列
// ============================================================================

/// 一次完整运动：三个载荷帧 + 一个运动控制帧
///
/// 帧顺序是硬件约定，构造后不可修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSequence {
    frames: [BusFrame; 4],
    mode: MoveMode,
}

impl MoveSequence {
    fn new(frames: [BusFrame; 4], mode: MoveMode) -> Self {
        Self { frames, mode }
    }

    /// 按发送顺序排列的帧
    pub fn frames(&self) -> &[BusFrame; 4] {
        &self.frames
    }

    /// 运动模式
    pub fn mode(&self) -> MoveMode {
        self.mode
    }

    /// 帧数量（恒为 4）
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 恒为 false，配合 `len` 满足 clippy
    pub fn is_empty(&self) -> bool {
        false
    }
}

// ============================================================================
// 电机使能指令 (0x471)
// ============================================================================

/// 电机使能/失能设置指令 (0x471)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorEnableCommand {
    pub joint_index: u8, // Byte 0: 1-6 代表关节驱动器序号，7 代表全部关节电机
    pub enable: bool,    // Byte 1: true = 使能 (0x02), false = 失能 (0x01)
}

impl MotorEnableCommand {
    /// 使能全部关节电机
    pub fn enable_all() -> Self {
        Self {
            joint_index: 7,
            enable: true,
        }
    }

    /// 失能全部关节电机
    pub fn disable_all() -> Self {
        Self {
            joint_index: 7,
            enable: false,
        }
    }

    /// 转换为总线帧
    pub fn to_frame(self) -> BusFrame {
        let mut data = [0u8; 8];
        data[0] = self.joint_index;
        data[1] = if self.enable { 0x02 } else { 0x01 };
        // Byte 2-7: 保留，已初始化为 0

        BusFrame::from_array(ID_MOTOR_ENABLE, data)
    }
}
