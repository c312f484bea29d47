//! # Piano Protocol
//!
//! 双臂 + 灵巧手弹琴平台的总线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: 帧 ID 常量定义
//! - `constants`: 协议常量和默认预设值
//! - `codec`: 载荷编码（整数对、运动控制、手指帧）
//! - `control`: 机械臂控制帧构建（关节/位姿/使能）
//! - `hand`: 灵巧手手指槽位与手指指令帧
//! - `limits`: 关节角度与速度范围校验
//!
//! ## 字节序
//!
//! 机械臂协议使用 Motorola (MSB) 高位在前（大端字节序）。

pub mod codec;
pub mod constants;
pub mod control;
pub mod hand;
pub mod ids;
pub mod limits;

// 重新导出常用类型
pub use codec::*;
pub use constants::*;
pub use control::*;
pub use hand::*;
pub use ids::*;
pub use limits::{JointLimits, ValidationError, Violation};

use thiserror::Error;

/// 单个 CAN 2.0 载荷的最大长度
pub const MAX_FRAME_LEN: usize = 8;

/// 发往总线网关的一帧数据
///
/// 与具体通道（接口名）解耦：通道在发送时由调用方指定，
/// 同一个帧可以发往左臂或右臂。
///
/// # 设计特性
///
/// - **Copy trait**：帧很小，按值传递即可
/// - **固定 8 字节**：避免堆分配，未使用部分为 0
///
/// ```rust
/// use piano_protocol::BusFrame;
///
/// let frame = BusFrame::try_new(0x28, &[0x01, 0, 0, 225]).unwrap();
/// assert_eq!(frame.id(), 0x28);
/// assert_eq!(frame.data_slice(), &[0x01, 0, 0, 225]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusFrame {
    /// 帧 ID
    pub id: u32,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 有效数据长度 (0-8)
    pub len: u8,
}

impl BusFrame {
    /// 由完整的 8 字节载荷创建帧
    pub fn from_array(id: u32, data: [u8; 8]) -> Self {
        Self {
            id,
            data,
            len: MAX_FRAME_LEN as u8,
        }
    }

    /// 由任意长度载荷创建帧，超过 8 字节返回错误
    pub fn try_new(id: u32, data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() > MAX_FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: MAX_FRAME_LEN,
                actual: data.len(),
            });
        }

        let mut fixed = [0u8; 8];
        fixed[..data.len()].copy_from_slice(data);
        Ok(Self {
            id,
            data: fixed,
            len: data.len() as u8,
        })
    }

    /// 获取数据切片（只包含有效数据）
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// 获取帧 ID
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected at most {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unknown finger name: {0}")]
    UnknownFinger(String),

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: i64 },
}

/// 大端字节序转 i32
pub fn bytes_to_i32_be(bytes: [u8; 4]) -> i32 {
    i32::from_be_bytes(bytes)
}

/// i32 转大端字节序
pub fn i32_to_bytes_be(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_i32_be() {
        assert_eq!(bytes_to_i32_be([0x12, 0x34, 0x56, 0x78]), 0x12345678);
        assert_eq!(bytes_to_i32_be([0xFF, 0xFF, 0xFF, 0xFF]), -1);
    }

    #[test]
    fn test_i32_to_bytes_be_negative() {
        assert_eq!(i32_to_bytes_be(-1), [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(i32_to_bytes_be(i32::MIN), [0x80, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_frame_try_new_short_payload() {
        let frame = BusFrame::try_new(0x27, &[1, 2, 3]).unwrap();
        assert_eq!(frame.len, 3);
        assert_eq!(frame.data, [1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(frame.data_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_frame_try_new_rejects_oversized_payload() {
        let err = BusFrame::try_new(0x27, &[0u8; 9]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidLength {
                expected: 8,
                actual: 9
            }
        );
    }

    #[test]
    fn test_frame_from_array_is_full_length() {
        let frame = BusFrame::from_array(0x151, [1, 1, 100, 0, 0, 0, 0, 0]);
        assert_eq!(frame.data_slice().len(), 8);
    }
}
