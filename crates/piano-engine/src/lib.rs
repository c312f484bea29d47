//! # Piano Engine
//!
//! 弹琴编排引擎：把乐谱翻译成手指与手臂的总线帧，按相对时序并发发送。
//!
//! ## 模块
//!
//! - `clock`: 可注入时钟（真实 / 虚拟）与分叉汇合
//! - `transmit`: 按通道串行化的帧发送
//! - `score`: 乐谱模型与提交时校验
//! - `state`: 会话内的执行器状态与预设
//! - `sequencer`: 按音符驱动手指与手臂
//! - `playback`: 暂停 / 恢复 / 终止状态机
//! - `commands`: 单次机械臂指令
//! - `config`: TOML 配置
//!
//! ## 示例
//!
//! ```rust,no_run
//! use piano_engine::{Engine, EngineConfig, ScoreRequest, SystemClock};
//! use piano_gateway::HttpGateway;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::default();
//! let gateway = HttpGateway::new(&config.gateway_config())?;
//! let engine = Engine::new(&config, Arc::new(gateway), Arc::new(SystemClock::new()));
//!
//! let json = std::fs::read_to_string("score.json")?;
//! let request = ScoreRequest::from_json(&json)?.into_playback(config.hand_ids)?;
//! engine.controller().start(request)?;
//! let report = engine.controller().wait()?;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod commands;
pub mod config;
mod error;
pub mod playback;
pub mod score;
pub mod sequencer;
pub mod state;
pub mod transmit;

pub use clock::{Clock, SimClock, SystemClock, TaskGuard, fork_join};
pub use commands::ArmCommander;
pub use config::{ConfigError, EngineConfig, GatewaySettings};
pub use error::EngineError;
pub use playback::{Checkpoint, PlaybackController, PlaybackGate, PlaybackReport, PlaybackState};
pub use score::{
    Bindings, HandIds, Interfaces, PlaybackRequest, Score, ScoreError, ScoreRequest, Side,
};
pub use sequencer::{PlaySettings, SequenceOutcome, Sequencer};
pub use state::{ActuatorStateStore, Presets};
pub use transmit::{FrameBuffer, Transmitter};

use piano_gateway::Gateway;
use std::sync::Arc;

/// 引擎入口：共享一个发送器的播放控制器与单次指令执行器
pub struct Engine {
    controller: PlaybackController,
    commander: ArmCommander,
}

impl Engine {
    pub fn new(config: &EngineConfig, gateway: Arc<dyn Gateway>, clock: Arc<dyn Clock>) -> Self {
        let transmitter = Arc::new(Transmitter::new(gateway));
        let settings = PlaySettings {
            settle: config.settle(),
            pose_speed: config.pose_speed,
        };
        let sequencer = Arc::new(Sequencer::new(transmitter.clone(), clock, settings));
        Self {
            controller: PlaybackController::new(sequencer, config.presets()),
            commander: ArmCommander::new(transmitter),
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn commander(&self) -> &ArmCommander {
        &self.commander
    }
}
