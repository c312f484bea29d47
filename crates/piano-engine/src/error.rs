//! 引擎层错误类型定义

use crate::config::ConfigError;
use crate::playback::PlaybackState;
use crate::score::ScoreError;
use piano_gateway::GatewayError;
use piano_protocol::{ProtocolError, ValidationError};
use thiserror::Error;

/// 引擎层错误类型
///
/// 发送失败分两种：
/// - [`EngineError::Transmission`]：指令的第一帧就失败，执行器状态未改变
/// - [`EngineError::PartialCommand`]：部分帧已送达，执行器可能处于中间状态，需要重新回零
#[derive(Error, Debug)]
pub enum EngineError {
    /// 范围校验失败（未发送任何帧）
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 协议编码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 指令未送达
    #[error("Transmission failed on {channel} (frame 0x{frame_id:03X}): {source}")]
    Transmission {
        channel: String,
        frame_id: u32,
        source: GatewayError,
    },

    /// 多帧指令只送达了一部分
    #[error(
        "Partial command on {channel}: {sent}/{total} frames sent, actuator must be re-homed: {source}"
    )]
    PartialCommand {
        channel: String,
        sent: usize,
        total: usize,
        source: GatewayError,
    },

    /// 乐谱不合法
    #[error("Invalid score: {0}")]
    InvalidScore(#[from] ScoreError),

    /// 当前状态下不允许该操作
    #[error("Cannot {action} while playback is {state}")]
    InvalidTransition {
        action: &'static str,
        state: PlaybackState,
    },

    /// 已有演奏会话在进行
    #[error("A playback session is already active")]
    SessionActive,

    /// 演奏线程创建失败
    #[error("Failed to spawn playback worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// 演奏线程 panic
    #[error("Playback worker panicked")]
    WorkerPanicked,

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// 执行器是否可能处于中间状态
    pub fn requires_rehome(&self) -> bool {
        matches!(self, EngineError::PartialCommand { .. })
    }
}
