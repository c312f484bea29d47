//! 单次机械臂指令
//!
//! 与演奏共用 [`Transmitter`]，因此不会与同一通道上的运动序列交错。
//! 所有指令先校验再发送，校验失败时不发出任何帧。

use crate::error::EngineError;
use crate::transmit::Transmitter;
use piano_protocol::{JointLimits, JointTarget, MAX_SPEED_PERCENT, MotorEnableCommand, PoseTarget, limits};
use std::sync::Arc;
use tracing::info;

/// 单次指令执行器
pub struct ArmCommander {
    transmitter: Arc<Transmitter>,
    limits: JointLimits,
}

impl ArmCommander {
    pub fn new(transmitter: Arc<Transmitter>) -> Self {
        Self {
            transmitter,
            limits: JointLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// 关节运动（单位 0.001°）
    pub fn send_joint(&self, channel: &str, joints: [i32; 6], speed: i64) -> Result<(), EngineError> {
        let sequence = self.limits.joint_move(&JointTarget(joints), speed)?;
        self.transmitter.send_move(channel, &sequence)?;
        info!(channel, ?joints, speed, "joint move sent");
        Ok(())
    }

    /// 位姿运动（单位 0.001mm / 0.001°）
    pub fn send_pose(&self, channel: &str, pose: [i32; 6], speed: i64) -> Result<(), EngineError> {
        let sequence = limits::pose_move(&PoseTarget(pose), speed)?;
        self.transmitter.send_move(channel, &sequence)?;
        info!(channel, ?pose, speed, "pose move sent");
        Ok(())
    }

    /// 使能全部关节电机
    pub fn enable_all(&self, channel: &str) -> Result<(), EngineError> {
        self.transmitter
            .send_frame(channel, MotorEnableCommand::enable_all().to_frame())?;
        info!(channel, "motors enabled");
        Ok(())
    }

    /// 失能全部关节电机
    pub fn disable_all(&self, channel: &str) -> Result<(), EngineError> {
        self.transmitter
            .send_frame(channel, MotorEnableCommand::disable_all().to_frame())?;
        info!(channel, "motors disabled");
        Ok(())
    }

    /// 全部关节回零（全速）
    pub fn home(&self, channel: &str) -> Result<(), EngineError> {
        self.send_joint(channel, JointTarget::ZERO.0, i64::from(MAX_SPEED_PERCENT))
    }
}
