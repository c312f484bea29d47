//! 集成测试共用的装置：虚拟时钟 + 记录型网关 + 引擎

#![allow(dead_code)]

use piano_engine::{
    Clock, Engine, EngineConfig, HandIds, PlaybackGate, PlaybackRequest, ScoreRequest, SimClock,
};
use piano_gateway::{RecordingGateway, SentFrame};
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub const LEFT_HAND: &str = "can0";
pub const RIGHT_HAND: &str = "can1";
pub const LEFT_ARM: &str = "can2";
pub const RIGHT_ARM: &str = "can3";

/// 在网关钩子里拿到播放闸门（引擎晚于网关创建）
pub type GateSlot = Arc<OnceLock<Arc<PlaybackGate>>>;

pub struct Rig {
    pub clock: Arc<SimClock>,
    pub gateway: Arc<RecordingGateway>,
    pub engine: Engine,
    pub gate: GateSlot,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_gateway(|g, _| g)
    }

    /// `customize` 可以给网关加失败规则或钩子，钩子里可通过 [`GateSlot`] 控制播放
    pub fn with_gateway(
        customize: impl FnOnce(RecordingGateway, GateSlot) -> RecordingGateway,
    ) -> Self {
        let clock = Arc::new(SimClock::new());
        let gate: GateSlot = Arc::new(OnceLock::new());

        let time = clock.clone();
        let gateway = RecordingGateway::new().with_time_source(move || time.now());
        let gateway = Arc::new(customize(gateway, gate.clone()));

        let engine = Engine::new(&EngineConfig::default(), gateway.clone(), clock.clone());
        let _ = gate.set(engine.controller().gate().clone());

        Self {
            clock,
            gateway,
            engine,
            gate,
        }
    }

    pub fn frames_on(&self, channel: &str) -> Vec<SentFrame> {
        self.gateway.sent_on(channel)
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// 单侧动作 JSON
pub fn side(fingers: &[&str], time: &[f64], shift: (i32, i32)) -> Value {
    json!({
        "fingers": fingers,
        "move": {"x": shift.0, "y": shift.1},
        "time": time,
    })
}

pub fn rest() -> Value {
    side(&[], &[], (0, 0))
}

pub fn note(index: i64, left: Value, right: Value) -> Value {
    json!({"index": index, "left": left, "right": right})
}

pub fn score_json(music: Vec<Value>, default_position: Option<Value>) -> Value {
    let mut music_data = json!({"music": music});
    if let Some(position) = default_position {
        music_data["defaultPosition"] = position;
    }
    json!({
        "interfaces": {
            "leftHand": LEFT_HAND,
            "rightHand": RIGHT_HAND,
            "leftArm": LEFT_ARM,
            "rightArm": RIGHT_ARM,
        },
        "musicData": music_data,
    })
}

pub fn request(music: Vec<Value>) -> PlaybackRequest {
    request_from(score_json(music, None))
}

pub fn request_from(value: Value) -> PlaybackRequest {
    ScoreRequest::from_json(&value.to_string())
        .unwrap()
        .into_playback(HandIds::default())
        .unwrap()
}

/// `count` 个音符，每个音符左手食指按 `hold_ms`
pub fn index_notes(count: usize, hold_ms: u64) -> Vec<Value> {
    (0..count)
        .map(|i| {
            note(
                i as i64,
                side(&["index"], &[hold_ms as f64 / 1000.0], (0, 0)),
                rest(),
            )
        })
        .collect()
}
