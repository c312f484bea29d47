//! # Piano Gateway
//!
//! 总线网关客户端抽象：把一帧数据交给外部网关服务，同步返回成功或失败。
//!
//! - 一帧一次调用，不做重试（重试策略属于具体实现）
//! - 通道（`interface`）是逻辑总线接口名，如 `can0`

use piano_protocol::BusFrame;
use serde::Serialize;
use thiserror::Error;

pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use http::{HttpGateway, HttpGatewayConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::{RecordingGateway, SentFrame};

/// 网关层统一错误类型
#[derive(Error, Debug)]
pub enum GatewayError {
    /// HTTP 传输错误（连接失败、超时等）
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// 网关返回非成功状态码
    #[error("gateway returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// 网关拒绝该帧（记录型网关注入的失败也走这里）
    #[error("gateway rejected frame: {0}")]
    Rejected(String),
}

/// 网关请求体：`{"interface": "...", "id": 0x151, "data": [..]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayMessage<'a> {
    pub interface: &'a str,
    pub id: u32,
    pub data: &'a [u8],
}

impl<'a> GatewayMessage<'a> {
    pub fn new(channel: &'a str, frame: &'a BusFrame) -> Self {
        Self {
            interface: channel,
            id: frame.id,
            data: frame.data_slice(),
        }
    }
}

/// 总线网关
///
/// 引擎会从多个线程并发调用 `send`，实现必须是 `Send + Sync`。
/// 同一通道上的帧顺序由调用方保证。
pub trait Gateway: Send + Sync {
    fn send(&self, channel: &str, frame: &BusFrame) -> Result<(), GatewayError>;
}

impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    fn send(&self, channel: &str, frame: &BusFrame) -> Result<(), GatewayError> {
        (**self).send(channel, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_message_json_shape() {
        let frame = BusFrame::from_array(0x151, [1, 0, 100, 0, 0, 0, 0, 0]);
        let msg = GatewayMessage::new("can2", &frame);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "interface": "can2",
                "id": 337,
                "data": [1, 0, 100, 0, 0, 0, 0, 0]
            })
        );
    }

    #[test]
    fn test_gateway_message_uses_valid_payload_only() {
        let frame = BusFrame::try_new(0x28, &[1, 0, 0, 225, 225, 225, 225]).unwrap();
        let msg = GatewayMessage::new("can0", &frame);
        assert_eq!(msg.data.len(), 7);
    }

    #[test]
    fn test_status_error_display() {
        let err = GatewayError::Status {
            status: 500,
            body: "bus off".to_string(),
        };
        assert_eq!(err.to_string(), "gateway returned status 500: bus off");
    }
}
