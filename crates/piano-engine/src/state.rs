//! 执行器状态
//!
//! 每个演奏会话持有一份独立的 [`ActuatorStateStore`]：
//! 两只手的手指向量 + 两条手臂的位姿向量。开始时从 [`Presets`] 复制，
//! 之后只做增量修改，预设本身永远不会被会话改写。

use crate::error::EngineError;
use crate::score::{DefaultPosition, Score, Shift, Side};
use parking_lot::Mutex;
use piano_protocol::{
    DEFAULT_PRESSED_VALUE, DEFAULT_UNIT_SCALE, FingerName, HandModel, LEFT_ARM_BASELINE,
    ProtocolError, RIGHT_ARM_BASELINE, ValidationError, Violation, limits,
};

const AXES: [&str; 6] = ["x", "y", "z", "rx", "ry", "rz"];

/// 演奏预设
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presets {
    /// 静止时的手指向量（两只手共用）
    pub hand_rest: Vec<u8>,
    /// 基准位姿 `[左臂, 右臂]`（mm / °）
    pub arm_baseline: [[i32; 6]; 2],
    /// 按下时写入的字节
    pub pressed: u8,
    /// 乐谱单位到 mm 的比例
    pub unit_scale: i32,
}

impl Presets {
    pub fn for_model(model: HandModel) -> Self {
        Self {
            hand_rest: model.rest_preset().to_vec(),
            arm_baseline: [LEFT_ARM_BASELINE, RIGHT_ARM_BASELINE],
            pressed: DEFAULT_PRESSED_VALUE,
            unit_scale: DEFAULT_UNIT_SCALE,
        }
    }
}

impl Default for Presets {
    fn default() -> Self {
        Self::for_model(HandModel::default())
    }
}

/// 会话内的执行器状态
#[derive(Debug)]
pub struct ActuatorStateStore {
    presets: Presets,
    hands: [Mutex<Vec<u8>>; 2],
    arms: [Mutex<[i32; 6]>; 2],
}

impl ActuatorStateStore {
    /// 由预设创建；提供预设位置时两臂的 z 先偏移 `move × scale`
    pub fn new(
        presets: Presets,
        default_position: Option<&DefaultPosition>,
    ) -> Result<Self, ValidationError> {
        let mut arms = presets.arm_baseline;
        if let Some(position) = default_position {
            for side in Side::BOTH {
                let pose = &mut arms[side.index()];
                pose[2] = offset(pose[2], position.arm(side).steps, presets.unit_scale, 2)?;
            }
        }

        Ok(Self {
            hands: [
                Mutex::new(presets.hand_rest.clone()),
                Mutex::new(presets.hand_rest.clone()),
            ],
            arms: [Mutex::new(arms[0]), Mutex::new(arms[1])],
            presets,
        })
    }

    pub fn presets(&self) -> &Presets {
        &self.presets
    }

    /// 手指向量快照
    pub fn hand_vector(&self, side: Side) -> Vec<u8> {
        self.hands[side.index()].lock().clone()
    }

    /// 位姿向量快照（mm / °）
    pub fn arm_pose(&self, side: Side) -> [i32; 6] {
        *self.arms[side.index()].lock()
    }

    /// 写入一个手指槽位，并在持锁期间用新向量调用 `emit`
    ///
    /// `pressed` 为 false 时写回预设值。
    pub fn write_finger<R>(
        &self,
        side: Side,
        finger: FingerName,
        pressed: bool,
        emit: impl FnOnce(&[u8]) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let slot = finger.slot();
        let value = if pressed {
            self.presets.pressed
        } else {
            self.presets
                .hand_rest
                .get(slot)
                .copied()
                .ok_or_else(|| slot_error(slot))?
        };

        let mut vector = self.hands[side.index()].lock();
        *vector.get_mut(slot).ok_or_else(|| slot_error(slot))? = value;
        emit(&vector)
    }

    /// 累加一次 x/y 位移，返回新位姿
    ///
    /// 溢出时位姿保持不变。
    pub fn shift_arm(&self, side: Side, shift: Shift) -> Result<[i32; 6], ValidationError> {
        let mut pose = self.arms[side.index()].lock();
        let next = shifted(*pose, shift, self.presets.unit_scale)?;
        *pose = next;
        Ok(next)
    }

    /// 按乐谱预演两臂位姿，任一中间位姿无法编码时返回错误
    ///
    /// 只读当前位姿，不修改状态；开始演奏前调用，保证越界时一帧都不发。
    pub fn check_route(&self, score: &Score) -> Result<(), ValidationError> {
        for side in Side::BOTH {
            let mut pose = self.arm_pose(side);
            if score.needs_prelude() {
                limits::scale_pose(&pose)?;
            }
            for note in &score.notes {
                pose = shifted(pose, note.action(side).shift, self.presets.unit_scale)?;
                limits::scale_pose(&pose)?;
            }
        }
        Ok(())
    }
}

fn shifted(pose: [i32; 6], shift: Shift, scale: i32) -> Result<[i32; 6], ValidationError> {
    let x = offset(pose[0], shift.x, scale, 0);
    let y = offset(pose[1], shift.y, scale, 1);
    match (x, y) {
        (Ok(x), Ok(y)) => {
            let mut next = pose;
            next[0] = x;
            next[1] = y;
            Ok(next)
        },
        (x, y) => {
            let violations = [x.err(), y.err()]
                .into_iter()
                .flatten()
                .flat_map(|e| e.violations)
                .collect();
            Err(ValidationError { violations })
        },
    }
}

fn offset(value: i32, steps: i32, scale: i32, axis: usize) -> Result<i32, ValidationError> {
    steps
        .checked_mul(scale)
        .and_then(|delta| value.checked_add(delta))
        .ok_or_else(|| ValidationError {
            violations: vec![Violation::PoseOverflow {
                axis: AXES[axis],
                value: steps,
            }],
        })
}

fn slot_error(slot: usize) -> EngineError {
    ProtocolError::InvalidValue {
        field: "finger slot".to_string(),
        value: slot as i64,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{ArmPosition, SideAction, ValidatedNote};

    #[test]
    fn test_new_copies_presets() {
        let store = ActuatorStateStore::new(Presets::default(), None).unwrap();
        assert_eq!(store.hand_vector(Side::Left), vec![0, 0, 225, 225, 225, 225]);
        assert_eq!(store.arm_pose(Side::Left), [400, 0, 251, 0, 80, 0]);
        assert_eq!(store.arm_pose(Side::Right), [400, 0, 240, 0, 85, 0]);
    }

    #[test]
    fn test_default_position_offsets_z() {
        let position = DefaultPosition {
            left: ArmPosition {
                steps: 2,
                x: 99,
                ..Default::default()
            },
            right: ArmPosition {
                steps: -1,
                ..Default::default()
            },
        };
        let store = ActuatorStateStore::new(Presets::default(), Some(&position)).unwrap();
        assert_eq!(store.arm_pose(Side::Left), [400, 0, 251 + 42, 0, 80, 0]);
        assert_eq!(store.arm_pose(Side::Right), [400, 0, 240 - 21, 0, 85, 0]);
    }

    #[test]
    fn test_press_and_restore() {
        let store = ActuatorStateStore::new(Presets::default(), None).unwrap();
        let pressed = store
            .write_finger(Side::Right, FingerName::Ring, true, |v| Ok(v.to_vec()))
            .unwrap();
        assert_eq!(pressed, vec![0, 0, 225, 225, 153, 225]);
        assert_eq!(store.hand_vector(Side::Left), vec![0, 0, 225, 225, 225, 225]);

        let restored = store
            .write_finger(Side::Right, FingerName::Ring, false, |v| Ok(v.to_vec()))
            .unwrap();
        assert_eq!(restored, vec![0, 0, 225, 225, 225, 225]);
    }

    #[test]
    fn test_o7_rest_values_restored() {
        let store = ActuatorStateStore::new(Presets::for_model(HandModel::O7), None).unwrap();
        store
            .write_finger(Side::Left, FingerName::Index, true, |_| Ok(()))
            .unwrap();
        let v = store
            .write_finger(Side::Left, FingerName::Index, false, |v| Ok(v.to_vec()))
            .unwrap();
        assert_eq!(v, vec![0, 255, 235, 235, 235, 235, 100]);
    }

    #[test]
    fn test_short_rest_vector_is_an_error() {
        let presets = Presets {
            hand_rest: vec![0, 0, 225],
            ..Presets::default()
        };
        let store = ActuatorStateStore::new(presets, None).unwrap();
        let err = store
            .write_finger(Side::Left, FingerName::Pinky, true, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
    }

    #[test]
    fn test_shift_accumulates() {
        let store = ActuatorStateStore::new(Presets::default(), None).unwrap();
        store.shift_arm(Side::Left, Shift { x: 1, y: -2 }).unwrap();
        let pose = store.shift_arm(Side::Left, Shift { x: 1, y: 0 }).unwrap();
        assert_eq!(pose, [442, -42, 251, 0, 80, 0]);
        assert_eq!(store.arm_pose(Side::Right), [400, 0, 240, 0, 85, 0]);
    }

    #[test]
    fn test_shift_overflow_leaves_pose_unchanged() {
        let store = ActuatorStateStore::new(Presets::default(), None).unwrap();
        let err = store
            .shift_arm(
                Side::Left,
                Shift {
                    x: i32::MAX,
                    y: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(store.arm_pose(Side::Left), [400, 0, 251, 0, 80, 0]);
    }

    #[test]
    fn test_check_route_finds_late_overflow() {
        let store = ActuatorStateStore::new(Presets::default(), None).unwrap();
        let mut score = Score::default();
        score.notes.push(ValidatedNote::default());
        score.notes.push(ValidatedNote {
            left: SideAction {
                shift: Shift { x: 200_000, y: 0 },
                ..Default::default()
            },
            ..Default::default()
        });

        let err = store.check_route(&score).unwrap_err();
        assert!(matches!(
            err.violations[0],
            Violation::PoseOverflow { axis: "x", .. }
        ));
        // 预演不改变会话状态
        assert_eq!(store.arm_pose(Side::Left), [400, 0, 251, 0, 80, 0]);

        score.notes.pop();
        store.check_route(&score).unwrap();
    }
}
