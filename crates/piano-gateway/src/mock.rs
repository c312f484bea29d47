//! 记录型网关（测试用）
//!
//! 把每一帧连同通道、发送时刻记录下来，并支持按条件注入失败、
//! 在发送时回调（例如在第 N 帧时触发暂停/终止）。

use crate::{Gateway, GatewayError};
use parking_lot::Mutex;
use piano_protocol::BusFrame;
use std::sync::Arc;
use std::time::Duration;

type TimeSource = Arc<dyn Fn() -> Duration + Send + Sync>;
type FailRule = Box<dyn Fn(&str, &BusFrame, usize) -> bool + Send + Sync>;
type SendHook = Box<dyn Fn(&str, &BusFrame, usize) + Send + Sync>;

/// 一条发送记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub channel: String,
    pub frame: BusFrame,
    /// 由注入的时间源给出的发送时刻
    pub at: Duration,
}

/// 记录型网关
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<SentFrame>>,
    attempts: Mutex<usize>,
    time_source: Option<TimeSource>,
    fail_rule: Option<FailRule>,
    hook: Option<SendHook>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用外部时间源记录发送时刻（例如模拟时钟）
    pub fn with_time_source(mut self, source: impl Fn() -> Duration + Send + Sync + 'static) -> Self {
        self.time_source = Some(Arc::new(source));
        self
    }

    /// 当 `rule(channel, frame, attempt)` 返回 true 时该帧发送失败
    ///
    /// `attempt` 是从 0 开始的全局调用序号（含失败的调用）。
    pub fn fail_when(
        mut self,
        rule: impl Fn(&str, &BusFrame, usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_rule = Some(Box::new(rule));
        self
    }

    /// 每次成功记录后回调
    pub fn on_send(mut self, hook: impl Fn(&str, &BusFrame, usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// 所有成功发送的帧（按发送顺序）
    pub fn sent(&self) -> Vec<SentFrame> {
        self.sent.lock().clone()
    }

    /// 指定通道上成功发送的帧
    pub fn sent_on(&self, channel: &str) -> Vec<SentFrame> {
        self.sent
            .lock()
            .iter()
            .filter(|s| s.channel == channel)
            .cloned()
            .collect()
    }

    /// 调用次数（含失败）
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Gateway for RecordingGateway {
    fn send(&self, channel: &str, frame: &BusFrame) -> Result<(), GatewayError> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let n = *attempts;
            *attempts += 1;
            n
        };

        if let Some(rule) = &self.fail_rule
            && rule(channel, frame, attempt)
        {
            return Err(GatewayError::Rejected(format!(
                "injected failure on {} id=0x{:03X}",
                channel, frame.id
            )));
        }

        let at = self.time_source.as_ref().map(|t| t()).unwrap_or_default();
        let index = {
            let mut sent = self.sent.lock();
            sent.push(SentFrame {
                channel: channel.to_string(),
                frame: *frame,
                at,
            });
            sent.len() - 1
        };

        if let Some(hook) = &self.hook {
            hook(channel, frame, index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let gateway = RecordingGateway::new();
        let a = BusFrame::from_array(0x152, [0; 8]);
        let b = BusFrame::from_array(0x151, [1, 0, 100, 0, 0, 0, 0, 0]);
        gateway.send("can2", &a).unwrap();
        gateway.send("can3", &b).unwrap();

        let sent = gateway.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].frame, a);
        assert_eq!(gateway.sent_on("can3")[0].frame, b);
    }

    #[test]
    fn test_injected_failure_is_not_recorded() {
        let gateway = RecordingGateway::new().fail_when(|_, frame, _| frame.id == 0x153);
        let ok = BusFrame::from_array(0x152, [0; 8]);
        let bad = BusFrame::from_array(0x153, [0; 8]);
        assert!(gateway.send("can2", &ok).is_ok());
        assert!(matches!(
            gateway.send("can2", &bad),
            Err(GatewayError::Rejected(_))
        ));
        assert_eq!(gateway.sent().len(), 1);
        assert_eq!(gateway.attempts(), 2);
    }

    #[test]
    fn test_time_source_and_hook() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let hits_clone = hits.clone();
        let gateway = RecordingGateway::new()
            .with_time_source(|| Duration::from_millis(42))
            .on_send(move |channel, _, index| hits_clone.lock().push((channel.to_string(), index)));

        gateway
            .send("can0", &BusFrame::from_array(0x28, [0; 8]))
            .unwrap();
        assert_eq!(gateway.sent()[0].at, Duration::from_millis(42));
        assert_eq!(*hits.lock(), vec![("can0".to_string(), 0)]);
    }
}
