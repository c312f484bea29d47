//! 范围校验
//!
//! 校验是"全量 + 前置"的：先收集所有越界项，再统一返回一个
//! [`ValidationError`]；只要有一项越界就不会构建任何帧。

use crate::constants::{MAX_SPEED_PERCENT, POSE_FIXED_POINT_SCALE};
use crate::control::{JointTarget, MoveSequence, PoseTarget};
use std::fmt;
use thiserror::Error;

const POSE_AXES: [&str; 6] = ["x", "y", "z", "rx", "ry", "rz"];

/// 单项越界
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("joint J{joint} value {value} out of range [{min}, {max}]")]
    JointOutOfRange {
        joint: usize,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("speed {0} out of range [0, 100]")]
    SpeedOutOfRange(i64),

    #[error("pose axis {axis} value {value} overflows the fixed-point range")]
    PoseOverflow { axis: &'static str, value: i32 },
}

/// 聚合后的校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl ValidationError {
    fn check(violations: Vec<Violation>) -> Result<(), ValidationError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}

/// 关节角度限位表（单位 0.001°，上下限不对称）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointLimits {
    pub min: [i32; 6],
    pub max: [i32; 6],
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            min: [-154_000, 0, -175_000, -102_000, -75_000, -120_000],
            max: [154_000, 195_000, 0, 102_000, 75_000, 120_000],
        }
    }
}

impl JointLimits {
    /// 收集所有越界关节
    pub fn violations(&self, target: &JointTarget) -> Vec<Violation> {
        target
            .0
            .iter()
            .enumerate()
            .filter(|&(i, &value)| value < self.min[i] || value > self.max[i])
            .map(|(i, &value)| Violation::JointOutOfRange {
                joint: i + 1,
                value,
                min: self.min[i],
                max: self.max[i],
            })
            .collect()
    }

    /// 校验关节目标与速度，通过后构建运动序列
    pub fn joint_move(
        &self,
        target: &JointTarget,
        speed: i64,
    ) -> Result<MoveSequence, ValidationError> {
        let mut violations = self.violations(target);
        let speed = check_speed(speed, &mut violations);
        ValidationError::check(violations)?;
        Ok(target.move_sequence(speed))
    }
}

/// 校验速度与位姿（已是 0.001 定点值），通过后构建运动序列
pub fn pose_move(target: &PoseTarget, speed: i64) -> Result<MoveSequence, ValidationError> {
    let mut violations = Vec::new();
    let speed = check_speed(speed, &mut violations);
    ValidationError::check(violations)?;
    Ok(target.move_sequence(speed))
}

/// 把 mm / ° 单位的位姿换算成 0.001 定点值
pub fn scale_pose(pose: &[i32; 6]) -> Result<PoseTarget, ValidationError> {
    let mut scaled = [0i32; 6];
    let mut violations = Vec::new();
    for (i, &value) in pose.iter().enumerate() {
        match value.checked_mul(POSE_FIXED_POINT_SCALE) {
            Some(v) => scaled[i] = v,
            None => violations.push(Violation::PoseOverflow {
                axis: POSE_AXES[i],
                value,
            }),
        }
    }
    ValidationError::check(violations)?;
    Ok(PoseTarget(scaled))
}

fn check_speed(speed: i64, violations: &mut Vec<Violation>) -> u8 {
    if (0..=MAX_SPEED_PERCENT as i64).contains(&speed) {
        speed as u8
    } else {
        violations.push(Violation::SpeedOutOfRange(speed));
        0
    }
}
