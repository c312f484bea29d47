//! 按通道串行化的帧发送
//!
//! 每个通道一把锁：一次多帧指令（运动序列）在持锁期间连续发送，
//! 不会与同一通道上的其他指令交错；不同通道之间互不阻塞。

use crate::error::EngineError;
use parking_lot::Mutex;
use piano_gateway::Gateway;
use piano_protocol::{BusFrame, FrameKind, MoveSequence};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

/// 帧缓冲区类型
///
/// 栈上预留 4 个位置，覆盖一次完整运动序列（3 载荷帧 + 1 控制帧）。
pub type FrameBuffer = SmallVec<[BusFrame; 4]>;

/// 按通道串行化的发送器
pub struct Transmitter {
    gateway: Arc<dyn Gateway>,
    channels: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Transmitter {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channel_lock(&self, channel: &str) -> Arc<Mutex<()>> {
        let mut channels = self.channels.lock();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 独占一个通道执行 `f`
    ///
    /// 用于"修改状态 + 发送快照"必须原子完成的场景（手指指令）。
    pub fn with_channel<R>(&self, channel: &str, f: impl FnOnce(&ChannelSender<'_>) -> R) -> R {
        let lock = self.channel_lock(channel);
        let _guard = lock.lock();
        f(&ChannelSender {
            transmitter: self,
            channel,
        })
    }

    /// 在通道上连续发送一组帧
    pub fn send_package(
        &self,
        channel: &str,
        frames: impl IntoIterator<Item = BusFrame>,
    ) -> Result<(), EngineError> {
        let buffer: FrameBuffer = frames.into_iter().collect();
        self.with_channel(channel, |sender| sender.send(&buffer))
    }

    /// 发送单帧
    pub fn send_frame(&self, channel: &str, frame: BusFrame) -> Result<(), EngineError> {
        self.send_package(channel, [frame])
    }

    /// 发送一次完整运动序列
    pub fn send_move(&self, channel: &str, sequence: &MoveSequence) -> Result<(), EngineError> {
        self.send_package(channel, sequence.frames().iter().copied())
    }

    fn emit(&self, channel: &str, frames: &[BusFrame]) -> Result<(), EngineError> {
        let total = frames.len();
        for (sent, frame) in frames.iter().enumerate() {
            trace!(
                channel,
                id = format_args!("0x{:03X}", frame.id),
                kind = ?FrameKind::from_id(frame.id),
                data = %hex::encode(frame.data_slice()),
                "send frame"
            );

            if let Err(source) = self.gateway.send(channel, frame) {
                warn!(
                    channel,
                    id = format_args!("0x{:03X}", frame.id),
                    sent,
                    total,
                    "frame send failed: {}",
                    source
                );
                return Err(if sent == 0 {
                    EngineError::Transmission {
                        channel: channel.to_string(),
                        frame_id: frame.id,
                        source,
                    }
                } else {
                    EngineError::PartialCommand {
                        channel: channel.to_string(),
                        sent,
                        total,
                        source,
                    }
                });
            }
        }
        Ok(())
    }
}

/// 持有通道锁期间的发送句柄
pub struct ChannelSender<'a> {
    transmitter: &'a Transmitter,
    channel: &'a str,
}

impl ChannelSender<'_> {
    pub fn channel(&self) -> &str {
        self.channel
    }

    /// 发送一组帧（调用方已持有通道锁）
    pub fn send(&self, frames: &[BusFrame]) -> Result<(), EngineError> {
        self.transmitter.emit(self.channel, frames)
    }
}
