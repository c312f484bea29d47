//! 硬件相关常量定义
//!
//! 集中定义所有硬件相关的常量，避免在代码中散落"魔法数"。

/// 位姿定点比例尺
///
/// 位姿向量以 mm / ° 为单位保存，发帧时乘以该值得到 0.001mm / 0.001° 原始值。
pub const POSE_FIXED_POINT_SCALE: i32 = 1000;

/// 乐谱位移单位到设备单位（mm）的默认比例
///
/// 乐谱里的 `move` 以"琴键"为单位，一个单位约 21mm。
pub const DEFAULT_UNIT_SCALE: i32 = 21;

/// 手指按下的默认字节值（所有手指共用，⌊255 × 0.6⌋）
pub const DEFAULT_PRESSED_VALUE: u8 = 153;

/// 速度百分比上限
pub const MAX_SPEED_PERCENT: u8 = 100;

/// 弹琴时位姿运动使用的速度
pub const DEFAULT_POSE_SPEED: u8 = 100;

/// 手指指令帧前缀字节
pub const FINGER_COMMAND_PREFIX: u8 = 0x01;

/// 左臂弹琴基准位姿 `[x, y, z, rx, ry, rz]`（mm / °）
pub const LEFT_ARM_BASELINE: [i32; 6] = [400, 0, 251, 0, 80, 0];

/// 右臂弹琴基准位姿 `[x, y, z, rx, ry, rz]`（mm / °）
pub const RIGHT_ARM_BASELINE: [i32; 6] = [400, 0, 240, 0, 85, 0];
