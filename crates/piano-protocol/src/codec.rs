//! 载荷编码
//!
//! 只做字节布局，不做任何单位换算：调用方负责把物理量换成 0.001 定点值。

use crate::{MAX_FRAME_LEN, ProtocolError, bytes_to_i32_be, i32_to_bytes_be};

/// 把两个 i32 编码为 8 字节（大端，`a` 在前）
pub fn encode_pair(a: i32, b: i32) -> [u8; 8] {
    let mut data = [0u8; 8];
    data[0..4].copy_from_slice(&i32_to_bytes_be(a));
    data[4..8].copy_from_slice(&i32_to_bytes_be(b));
    data
}

/// [`encode_pair`] 的逆运算（引擎只发不收，仅用于测试和诊断）
pub fn decode_pair(data: [u8; 8]) -> (i32, i32) {
    let a = bytes_to_i32_be([data[0], data[1], data[2], data[3]]);
    let b = bytes_to_i32_be([data[4], data[5], data[6], data[7]]);
    (a, b)
}

/// 运动控制载荷：`[mode, sub_mode, speed, 0, 0, 0, 0, 0]`
pub fn encode_control(mode: u8, sub_mode: u8, speed: u8) -> [u8; 8] {
    let mut data = [0u8; 8];
    data[0] = mode;
    data[1] = sub_mode;
    data[2] = speed;
    // Byte 3-7: 保留，已初始化为 0
    data
}

/// 手指帧载荷：前缀字节 + 当前手指向量
///
/// 结果必须能放进一个 8 字节载荷。
pub fn encode_finger_frame(prefix: u8, vector: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = vector.len() + 1;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::InvalidLength {
            expected: MAX_FRAME_LEN,
            actual: len,
        });
    }

    let mut data = Vec::with_capacity(len);
    data.push(prefix);
    data.extend_from_slice(vector);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_pair_layout() {
        let data = encode_pair(0x01020304, -2);
        assert_eq!(data, [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn test_encode_pair_pose_values() {
        // 400mm → 400000（0x00061A80）
        let data = encode_pair(400_000, 0);
        assert_eq!(data, [0x00, 0x06, 0x1A, 0x80, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_control_layout() {
        assert_eq!(encode_control(0x01, 0x01, 100), [0x01, 0x01, 100, 0, 0, 0, 0, 0]);
        assert_eq!(encode_control(0x01, 0x00, 0), [0x01, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_finger_frame_l10() {
        let data = encode_finger_frame(0x01, &[0, 0, 153, 225, 225, 225]).unwrap();
        assert_eq!(data, vec![0x01, 0, 0, 153, 225, 225, 225]);
    }

    #[test]
    fn test_encode_finger_frame_o7_fills_whole_payload() {
        let data = encode_finger_frame(0x01, &[0, 255, 235, 235, 235, 235, 100]).unwrap();
        assert_eq!(data.len(), 8);
    }

    #[test]
    fn test_encode_finger_frame_too_long() {
        let err = encode_finger_frame(0x01, &[0u8; 8]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidLength {
                expected: 8,
                actual: 9
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_encode_pair_is_reversible(a in any::<i32>(), b in any::<i32>()) {
            prop_assert_eq!(decode_pair(encode_pair(a, b)), (a, b));
        }

        #[test]
        fn prop_encode_pair_is_injective(
            a in any::<i32>(), b in any::<i32>(),
            c in any::<i32>(), d in any::<i32>(),
        ) {
            prop_assume!((a, b) != (c, d));
            prop_assert_ne!(encode_pair(a, b), encode_pair(c, d));
        }
    }
}
