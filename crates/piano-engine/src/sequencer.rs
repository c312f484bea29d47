//! 编排器：按乐谱驱动手指与手臂
//!
//! 每个音符：
//!
//! 1. 检查播放闸门（暂停则阻塞，终止则返回 [`SequenceOutcome::Aborted`]）
//! 2. 左右两侧并行执行；两侧都结束后才进入下一个音符
//! 3. 每侧内每根手指并行：按下 → 保持 → 复位；全部复位后才移动手臂
//! 4. 手臂按 `move × scale` 平移 x/y，发送一次位姿运动，然后等待稳定时间
//!
//! 音符时长 = 最长按键保持 + 稳定时间。
//!
//! 失败处理：手指帧失败会被记录，但仍尝试发送复位帧；出现失败的一侧跳过手臂运动；
//! 音符汇合后以第一个错误结束演奏。

use crate::clock::{Clock, TaskGuard, fork_join};
use crate::error::EngineError;
use crate::playback::{Checkpoint, PlaybackGate};
use crate::score::{Bindings, FingerPress, PlaybackRequest, Side, SideAction};
use crate::state::ActuatorStateStore;
use crate::transmit::Transmitter;
use piano_protocol::{FingerCommand, limits};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 演奏参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaySettings {
    /// 手臂运动后的稳定时间
    pub settle: Duration,
    /// 位姿运动速度百分比
    pub pose_speed: u8,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(150),
            pose_speed: piano_protocol::DEFAULT_POSE_SPEED,
        }
    }
}

/// 演奏结果（不含错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// 全部音符演奏完毕
    Finished { notes: usize },
    /// 在音符边界被终止，`completed` 为已完成的音符数
    Aborted { completed: usize },
}

/// 编排器
pub struct Sequencer {
    transmitter: Arc<Transmitter>,
    clock: Arc<dyn Clock>,
    settings: PlaySettings,
}

impl Sequencer {
    pub fn new(transmitter: Arc<Transmitter>, clock: Arc<dyn Clock>, settings: PlaySettings) -> Self {
        Self {
            transmitter,
            clock,
            settings,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// 演奏一首乐谱（阻塞直到结束、终止或出错）
    pub fn run(
        &self,
        request: &PlaybackRequest,
        store: &ActuatorStateStore,
        gate: &PlaybackGate,
    ) -> Result<SequenceOutcome, EngineError> {
        let clock = self.clock.as_ref();
        let _task = TaskGuard::register(clock);
        let score = &request.score;
        let bindings = &request.bindings;

        info!(
            notes = score.notes.len(),
            prelude = score.needs_prelude(),
            "playback started"
        );

        if score.needs_prelude() {
            for side in Side::BOTH {
                self.move_arm(side, bindings, store.arm_pose(side))?;
            }
            debug!("moved to default position");
        }

        for (k, note) in score.notes.iter().enumerate() {
            if gate.checkpoint() == Checkpoint::Abort {
                info!(completed = k, "playback killed");
                return Ok(SequenceOutcome::Aborted { completed: k });
            }

            debug!(note = k, index = note.index, "playing note");
            let results = fork_join(clock, Side::BOTH.to_vec(), |side| {
                self.play_side(side, note.action(side), bindings, store)
            });
            if let Some(err) = results.into_iter().find_map(Result::err) {
                warn!(note = k, index = note.index, "playback failed: {}", err);
                return Err(err);
            }
        }

        info!(notes = score.notes.len(), "playback finished");
        Ok(SequenceOutcome::Finished {
            notes: score.notes.len(),
        })
    }

    fn play_side(
        &self,
        side: Side,
        action: &SideAction,
        bindings: &Bindings,
        store: &ActuatorStateStore,
    ) -> Result<(), EngineError> {
        let results = fork_join(self.clock.as_ref(), action.presses.clone(), |press| {
            self.play_finger(side, press, bindings, store)
        });
        if let Some(err) = results.into_iter().find_map(Result::err) {
            warn!(%side, "finger failure, skipping arm move: {}", err);
            return Err(err);
        }

        let pose = store.shift_arm(side, action.shift)?;
        self.move_arm(side, bindings, pose)?;
        self.clock.sleep(self.settings.settle);
        Ok(())
    }

    fn play_finger(
        &self,
        side: Side,
        press: FingerPress,
        bindings: &Bindings,
        store: &ActuatorStateStore,
    ) -> Result<(), EngineError> {
        let pressed = self.send_finger(side, press, true, bindings, store);
        self.clock.sleep(press.hold);
        let restored = self.send_finger(side, press, false, bindings, store);
        pressed.and(restored)
    }

    /// 修改手指槽位并发送完整向量，通道锁 → 手指向量锁
    fn send_finger(
        &self,
        side: Side,
        press: FingerPress,
        pressed: bool,
        bindings: &Bindings,
        store: &ActuatorStateStore,
    ) -> Result<(), EngineError> {
        let hand = bindings.hand(side);
        self.transmitter.with_channel(&hand.channel, |sender| {
            store.write_finger(side, press.finger, pressed, |vector| {
                let frame = FingerCommand::new(hand.hand_id, vector).to_frame()?;
                sender.send(&[frame])
            })
        })
    }

    fn move_arm(
        &self,
        side: Side,
        bindings: &Bindings,
        pose: [i32; 6],
    ) -> Result<(), EngineError> {
        let target = limits::scale_pose(&pose)?;
        let sequence = limits::pose_move(&target, i64::from(self.settings.pose_speed))?;
        self.transmitter.send_move(bindings.arm(side), &sequence)
    }
}
