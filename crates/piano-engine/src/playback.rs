//! 播放控制器
//!
//! 状态机：
//!
//! ```text
//!          start            stop
//!   Idle ─────────▶ Running ─────▶ Paused
//!    ▲               │  ▲  resume   │
//!    │               │  └───────────┘
//!    │          kill │              │ kill
//!    │               ▼              ▼
//!    └─────────── Killed ◀──────────┘
//!   (worker exit: *→Idle)
//! ```
//!
//! 闸门只在音符边界检查：`kill` 不会打断正在进行的音符，当前音符汇合后才生效。
//! 同一时刻最多一个会话；会话进行中再次 `start` 会被拒绝，需要 `restart`。

use crate::clock::Clock;
use crate::error::EngineError;
use crate::score::PlaybackRequest;
use crate::sequencer::{SequenceOutcome, Sequencer};
use crate::state::{ActuatorStateStore, Presets};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Running,
    Paused,
    Killed,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Running => "running",
            PlaybackState::Paused => "paused",
            PlaybackState::Killed => "killed",
        })
    }
}

/// 音符边界检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Proceed,
    Abort,
}

#[derive(Debug, Default)]
struct GateState {
    state: PlaybackState,
    /// 演奏线程正阻塞在暂停点
    parked: bool,
}

/// 播放闸门
///
/// 由控制器写、演奏线程在音符边界读。暂停时演奏线程在条件变量上等待，不忙等。
#[derive(Debug, Default)]
pub struct PlaybackGate {
    inner: Mutex<GateState>,
    changed: Condvar,
}

impl PlaybackGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处于 `Running` 的闸门（直接驱动 [`Sequencer`] 时使用）
    pub fn running() -> Self {
        let gate = Self::new();
        gate.inner.lock().state = PlaybackState::Running;
        gate
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state
    }

    fn transition(
        &self,
        action: &'static str,
        from: &[PlaybackState],
        to: PlaybackState,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if !from.contains(&inner.state) {
            return Err(EngineError::InvalidTransition {
                action,
                state: inner.state,
            });
        }
        debug!(from = %inner.state, to = %to, "{}", action);
        inner.state = to;
        self.changed.notify_all();
        Ok(())
    }

    /// Running → Paused
    pub fn stop(&self) -> Result<(), EngineError> {
        self.transition("stop", &[PlaybackState::Running], PlaybackState::Paused)
    }

    /// Paused → Running
    pub fn resume(&self) -> Result<(), EngineError> {
        self.transition("resume", &[PlaybackState::Paused], PlaybackState::Running)
    }

    /// Running | Paused → Killed
    pub fn kill(&self) -> Result<(), EngineError> {
        self.transition(
            "kill",
            &[PlaybackState::Running, PlaybackState::Paused],
            PlaybackState::Killed,
        )
    }

    fn begin(&self) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.state != PlaybackState::Idle {
            return Err(EngineError::SessionActive);
        }
        inner.state = PlaybackState::Running;
        inner.parked = false;
        self.changed.notify_all();
        Ok(())
    }

    fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.state = PlaybackState::Idle;
        inner.parked = false;
        self.changed.notify_all();
    }

    /// 音符边界检查：暂停时阻塞直到恢复或终止
    pub fn checkpoint(&self) -> Checkpoint {
        let mut inner = self.inner.lock();
        loop {
            match inner.state {
                PlaybackState::Running => return Checkpoint::Proceed,
                PlaybackState::Killed | PlaybackState::Idle => return Checkpoint::Abort,
                PlaybackState::Paused => {
                    if !inner.parked {
                        inner.parked = true;
                        self.changed.notify_all();
                    }
                    self.changed.wait(&mut inner);
                    inner.parked = false;
                },
            }
        }
    }

    /// 等待演奏线程停在暂停点，超时返回 false
    pub fn wait_parked(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while !inner.parked {
            if self.changed.wait_until(&mut inner, deadline).timed_out() {
                return inner.parked;
            }
        }
        true
    }

    /// 等待回到 `Idle`，超时返回 false
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while inner.state != PlaybackState::Idle {
            if self.changed.wait_until(&mut inner, deadline).timed_out() {
                return inner.state == PlaybackState::Idle;
            }
        }
        true
    }
}

/// 演奏线程退出时把闸门置回 `Idle`（panic 时同样生效）
struct IdleOnExit(Arc<PlaybackGate>);

impl Drop for IdleOnExit {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// 一次会话的结果
#[derive(Debug)]
pub struct PlaybackReport {
    pub outcome: Result<SequenceOutcome, EngineError>,
    /// 按会话时钟计的耗时
    pub elapsed: Duration,
}

impl PlaybackReport {
    pub fn into_result(self) -> Result<SequenceOutcome, EngineError> {
        self.outcome
    }
}

/// 播放控制器
pub struct PlaybackController {
    sequencer: Arc<Sequencer>,
    presets: Presets,
    gate: Arc<PlaybackGate>,
    worker: Mutex<Option<JoinHandle<PlaybackReport>>>,
}

impl PlaybackController {
    pub fn new(sequencer: Arc<Sequencer>, presets: Presets) -> Self {
        Self {
            sequencer,
            presets,
            gate: Arc::new(PlaybackGate::new()),
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.gate.state()
    }

    pub fn gate(&self) -> &Arc<PlaybackGate> {
        &self.gate
    }

    /// Idle → Running，启动演奏线程
    ///
    /// 会话进行中返回 [`EngineError::SessionActive`]；
    /// 任一音符后的位姿无法编码时返回 [`EngineError::Validation`]，不发送任何帧。
    /// 上一个会话若已结束但未被 `wait`，其结果被丢弃。
    pub fn start(&self, request: PlaybackRequest) -> Result<(), EngineError> {
        let mut worker = self.worker.lock();
        let store = ActuatorStateStore::new(
            self.presets.clone(),
            request.score.default_position.as_ref(),
        )?;
        store.check_route(&request.score)?;

        self.gate.begin()?;
        if worker.take().is_some() {
            debug!("discarding report of previous session");
        }

        let sequencer = self.sequencer.clone();
        let gate = self.gate.clone();
        let spawned = std::thread::Builder::new()
            .name("piano-playback".into())
            .spawn(move || {
                let _idle = IdleOnExit(gate.clone());
                let clock: &dyn Clock = sequencer.clock().as_ref();
                let started = clock.now();
                let outcome = sequencer.run(&request, &store, &gate);
                if let Err(e) = &outcome {
                    error!("playback ended with error: {}", e);
                }
                PlaybackReport {
                    outcome,
                    elapsed: clock.now().saturating_sub(started),
                }
            });

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!("playback session started");
                Ok(())
            },
            Err(e) => {
                self.gate.finish();
                Err(EngineError::Spawn(e))
            },
        }
    }

    /// Running → Paused（在下一个音符边界生效）
    pub fn stop(&self) -> Result<(), EngineError> {
        self.gate.stop()
    }

    /// Paused → Running
    pub fn resume(&self) -> Result<(), EngineError> {
        self.gate.resume()
    }

    /// Running | Paused → Killed（当前音符完成后结束会话）
    pub fn kill(&self) -> Result<(), EngineError> {
        self.gate.kill()
    }

    /// 等待演奏线程结束并取回结果
    pub fn wait(&self) -> Result<PlaybackReport, EngineError> {
        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            return Err(EngineError::InvalidTransition {
                action: "wait",
                state: self.state(),
            });
        };
        handle.join().map_err(|_| EngineError::WorkerPanicked)
    }

    /// 终止当前会话（如有），等待其结束后开始新会话
    ///
    /// 返回被终止会话的结果。
    pub fn restart(&self, request: PlaybackRequest) -> Result<Option<PlaybackReport>, EngineError> {
        match self.kill() {
            Ok(()) | Err(EngineError::InvalidTransition { .. }) => {},
            Err(e) => return Err(e),
        }
        let previous = match self.wait() {
            Ok(report) => Some(report),
            Err(EngineError::InvalidTransition { .. }) => None,
            Err(e) => return Err(e),
        };
        self.start(request)?;
        Ok(previous)
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if self.gate.kill().is_ok() {
            info!("killing playback session on shutdown");
        }
        if let Some(handle) = self.worker.get_mut().take()
            && handle.join().is_err()
        {
            error!("playback worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_gate_transitions() {
        let gate = PlaybackGate::new();
        assert_eq!(gate.state(), PlaybackState::Idle);
        assert!(matches!(
            gate.stop(),
            Err(EngineError::InvalidTransition { action: "stop", .. })
        ));

        gate.begin().unwrap();
        assert!(matches!(gate.begin(), Err(EngineError::SessionActive)));
        assert!(gate.resume().is_err());
        gate.stop().unwrap();
        assert_eq!(gate.state(), PlaybackState::Paused);
        gate.resume().unwrap();
        gate.kill().unwrap();
        assert!(gate.kill().is_err());
        assert_eq!(gate.checkpoint(), Checkpoint::Abort);
        gate.finish();
        assert_eq!(gate.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_checkpoint_blocks_while_paused() {
        let gate = Arc::new(PlaybackGate::running());
        gate.stop().unwrap();

        let worker = {
            let gate = gate.clone();
            thread::spawn(move || gate.checkpoint())
        };
        assert!(gate.wait_parked(Duration::from_secs(5)));
        gate.resume().unwrap();
        assert_eq!(worker.join().unwrap(), Checkpoint::Proceed);
    }

    #[test]
    fn test_kill_releases_paused_checkpoint() {
        let gate = Arc::new(PlaybackGate::running());
        gate.stop().unwrap();

        let worker = {
            let gate = gate.clone();
            thread::spawn(move || gate.checkpoint())
        };
        assert!(gate.wait_parked(Duration::from_secs(5)));
        gate.kill().unwrap();
        assert_eq!(worker.join().unwrap(), Checkpoint::Abort);
    }

    #[test]
    fn test_wait_parked_times_out() {
        let gate = PlaybackGate::running();
        assert!(!gate.wait_parked(Duration::from_millis(10)));
    }
}
