//! HTTP 网关客户端
//!
//! 每帧一个 `POST <base_url>/api/can` 请求，JSON 请求体见 [`GatewayMessage`]。
//! 只有 2xx 视为成功，其余状态码连同响应体一起作为错误返回。

use crate::{Gateway, GatewayError, GatewayMessage};
use piano_protocol::BusFrame;
use std::time::Duration;
use tracing::{trace, warn};

/// 默认网关地址
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:5260";

/// HTTP 网关配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpGatewayConfig {
    /// 网关服务根地址
    pub base_url: String,
    /// 单帧请求超时
    pub timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout: Duration::from_millis(1000),
        }
    }
}

impl HttpGatewayConfig {
    /// 帧转发端点
    pub fn endpoint(&self) -> String {
        format!("{}/api/can", self.base_url.trim_end_matches('/'))
    }
}

/// 基于 reqwest 阻塞客户端的网关实现
///
/// **注意**：阻塞客户端不能在异步运行时的工作线程中创建或销毁。
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(config: &HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Gateway for HttpGateway {
    fn send(&self, channel: &str, frame: &BusFrame) -> Result<(), GatewayError> {
        let message = GatewayMessage::new(channel, frame);
        trace!(
            channel,
            id = format_args!("0x{:03X}", frame.id),
            data = %hex::encode(frame.data_slice()),
            "forwarding frame"
        );

        let response = self.client.post(&self.endpoint).json(&message).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        warn!(channel, status = status.as_u16(), %body, "gateway rejected frame");
        Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let config = HttpGatewayConfig::default();
        assert_eq!(config.endpoint(), "http://localhost:5260/api/can");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = HttpGatewayConfig {
            base_url: "http://10.0.0.2:5260/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "http://10.0.0.2:5260/api/can");
    }
}
