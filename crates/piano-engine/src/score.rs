//! 乐谱模型与提交时校验
//!
//! JSON 结构：
//!
//! ```json
//! {
//!   "interfaces": {"leftHand": "can0", "rightHand": "can1", "leftArm": "can2", "rightArm": "can3"},
//!   "handIds": {"left": 40, "right": 39},
//!   "musicData": {
//!     "defaultPosition": {"left": {"move": 2}, "right": {"move": -1}},
//!     "music": [
//!       {"index": 0,
//!        "left":  {"fingers": ["index", "middle"], "move": {"x": 0, "y": 0}, "time": [0.2, 0.1]},
//!        "right": {"fingers": [], "move": {"x": 1, "y": 0}, "time": []}}
//!     ]
//!   }
//! }
//! ```
//!
//! 校验在任何帧发出之前完成，校验通过后的 [`Score`] 不可变。

use piano_protocol::{DEFAULT_LEFT_HAND_ID, DEFAULT_RIGHT_HAND_ID, FingerName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 左右侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

/// 乐谱错误
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("malformed score JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("note #{note} {side}: {fingers} fingers but {times} hold times")]
    LengthMismatch {
        note: usize,
        side: Side,
        fingers: usize,
        times: usize,
    },

    #[error("note #{note} {side}: unknown finger {name:?}")]
    UnknownFinger { note: usize, side: Side, name: String },

    #[error("note #{note} {side}: finger {finger} appears more than once")]
    DuplicateFinger {
        note: usize,
        side: Side,
        finger: FingerName,
    },

    #[error("note #{note} {side}: invalid hold time {value}")]
    InvalidHold { note: usize, side: Side, value: f64 },

    #[error("interface for {0} is empty")]
    MissingInterface(&'static str),
}

// ============================================================================
// 提交格式（JSON）
// ============================================================================

/// 执行器到通道的绑定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interfaces {
    pub left_hand: String,
    pub right_hand: String,
    pub left_arm: String,
    pub right_arm: String,
}

/// 左右手的帧 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandIds {
    pub left: u32,
    pub right: u32,
}

impl Default for HandIds {
    fn default() -> Self {
        Self {
            left: DEFAULT_LEFT_HAND_ID,
            right: DEFAULT_RIGHT_HAND_ID,
        }
    }
}

/// 手臂位移（乐谱单位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Shift {
    pub x: i32,
    pub y: i32,
}

/// 单侧动作
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandAction {
    pub fingers: Vec<String>,
    #[serde(rename = "move")]
    pub shift: Shift,
    /// 每根手指的按键保持时间（秒）
    #[serde(alias = "holdTime")]
    pub time: Vec<f64>,
}

/// 一个音符（节拍）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    /// 节拍序号，只用于日志
    pub index: i64,
    pub left: HandAction,
    pub right: HandAction,
}

/// 单臂预设位置
///
/// 只有 `move` 生效（沿 z 轴抬升/下降若干单位），`x`/`y`/`z` 仅保留兼容。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(rename = "move")]
    pub steps: i32,
}

/// 双臂预设位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultPosition {
    pub left: ArmPosition,
    pub right: ArmPosition,
}

impl DefaultPosition {
    /// 全零等同于未提供
    pub fn is_zero(&self) -> bool {
        *self == DefaultPosition::default()
    }

    pub fn arm(&self, side: Side) -> &ArmPosition {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicData {
    #[serde(default, alias = "default_position")]
    pub default_position: Option<DefaultPosition>,
    #[serde(default)]
    pub music: Vec<Note>,
}

/// 演奏请求（提交格式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub interfaces: Interfaces,
    #[serde(default)]
    pub hand_ids: Option<HandIds>,
    pub music_data: MusicData,
}

impl ScoreRequest {
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 校验并转换为可执行的演奏请求
    ///
    /// `default_ids` 在请求未携带 `handIds` 时使用。
    pub fn into_playback(self, default_ids: HandIds) -> Result<PlaybackRequest, ScoreError> {
        let ids = self.hand_ids.unwrap_or(default_ids);
        let bindings = Bindings::new(self.interfaces, ids)?;
        let score = Score::validate(self.music_data)?;
        Ok(PlaybackRequest {
            bindings,
            score: Arc::new(score),
        })
    }
}

// ============================================================================
// 校验后的模型
// ============================================================================

/// 一只手的绑定：通道 + 帧 ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandBinding {
    pub channel: String,
    pub hand_id: u32,
}

/// 四个执行器的绑定，演奏开始时确定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    hands: [HandBinding; 2],
    arms: [String; 2],
}

impl Bindings {
    pub fn new(interfaces: Interfaces, ids: HandIds) -> Result<Self, ScoreError> {
        let named = [
            ("leftHand", &interfaces.left_hand),
            ("rightHand", &interfaces.right_hand),
            ("leftArm", &interfaces.left_arm),
            ("rightArm", &interfaces.right_arm),
        ];
        if let Some(&(name, _)) = named.iter().find(|(_, channel)| channel.trim().is_empty()) {
            return Err(ScoreError::MissingInterface(name));
        }

        Ok(Self {
            hands: [
                HandBinding {
                    channel: interfaces.left_hand,
                    hand_id: ids.left,
                },
                HandBinding {
                    channel: interfaces.right_hand,
                    hand_id: ids.right,
                },
            ],
            arms: [interfaces.left_arm, interfaces.right_arm],
        })
    }

    pub fn hand(&self, side: Side) -> &HandBinding {
        &self.hands[side.index()]
    }

    pub fn arm(&self, side: Side) -> &str {
        &self.arms[side.index()]
    }
}

/// 一次按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerPress {
    pub finger: FingerName,
    pub hold: Duration,
}

/// 校验后的单侧动作
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SideAction {
    pub presses: Vec<FingerPress>,
    pub shift: Shift,
}

impl SideAction {
    /// 本侧最长的按键保持时间
    pub fn longest_hold(&self) -> Duration {
        self.presses
            .iter()
            .map(|p| p.hold)
            .max()
            .unwrap_or_default()
    }

    fn validate(action: HandAction, note: usize, side: Side) -> Result<Self, ScoreError> {
        if action.fingers.len() != action.time.len() {
            return Err(ScoreError::LengthMismatch {
                note,
                side,
                fingers: action.fingers.len(),
                times: action.time.len(),
            });
        }

        let mut presses: Vec<FingerPress> = Vec::with_capacity(action.fingers.len());
        for (name, &seconds) in action.fingers.iter().zip(&action.time) {
            let finger: FingerName = name.parse().map_err(|_| ScoreError::UnknownFinger {
                note,
                side,
                name: name.clone(),
            })?;
            if presses.iter().any(|p| p.finger == finger) {
                return Err(ScoreError::DuplicateFinger { note, side, finger });
            }
            let invalid = || ScoreError::InvalidHold {
                note,
                side,
                value: seconds,
            };
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(invalid());
            }
            let hold = Duration::try_from_secs_f64(seconds).map_err(|_| invalid())?;
            presses.push(FingerPress { finger, hold });
        }

        Ok(Self {
            presses,
            shift: action.shift,
        })
    }
}

/// 校验后的音符
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidatedNote {
    pub index: i64,
    pub left: SideAction,
    pub right: SideAction,
}

impl ValidatedNote {
    pub fn action(&self, side: Side) -> &SideAction {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// 校验后的乐谱（不可变）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Score {
    pub default_position: Option<DefaultPosition>,
    pub notes: Vec<ValidatedNote>,
}

impl Score {
    pub fn validate(data: MusicData) -> Result<Self, ScoreError> {
        let notes = data
            .music
            .into_iter()
            .enumerate()
            .map(|(i, note)| {
                Ok(ValidatedNote {
                    index: note.index,
                    left: SideAction::validate(note.left, i, Side::Left)?,
                    right: SideAction::validate(note.right, i, Side::Right)?,
                })
            })
            .collect::<Result<Vec<_>, ScoreError>>()?;

        Ok(Self {
            default_position: data.default_position,
            notes,
        })
    }

    /// 是否需要先移动到预设位置
    pub fn needs_prelude(&self) -> bool {
        self.default_position.is_some_and(|p| !p.is_zero())
    }

    /// 不计网络耗时的理论演奏时长（溢出时取 `Duration::MAX`）
    pub fn nominal_duration(&self, settle: Duration) -> Duration {
        self.notes.iter().fold(Duration::ZERO, |total, n| {
            n.left
                .longest_hold()
                .max(n.right.longest_hold())
                .saturating_add(settle)
                .saturating_add(total)
        })
    }
}

/// 可执行的演奏请求
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub bindings: Bindings,
    pub score: Arc<Score>,
}
