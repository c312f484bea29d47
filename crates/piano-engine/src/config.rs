//! 引擎配置
//!
//! TOML 格式，所有字段可省略：
//!
//! ```toml
//! hand_model = "l10"
//! pressed_value = 153
//! unit_scale = 21
//! settle_ms = 150
//! pose_speed = 100
//! left_arm_baseline = [400, 0, 251, 0, 80, 0]
//! right_arm_baseline = [400, 0, 240, 0, 85, 0]
//! # hand_rest = [0, 0, 225, 225, 225, 225]
//!
//! [hand_ids]
//! left = 0x28
//! right = 0x27
//!
//! [gateway]
//! base_url = "http://localhost:5260"
//! timeout_ms = 1000
//! ```

use crate::score::HandIds;
use crate::state::Presets;
use piano_gateway::HttpGatewayConfig;
use piano_gateway::http::DEFAULT_GATEWAY_URL;
use piano_protocol::{
    DEFAULT_POSE_SPEED, DEFAULT_PRESSED_VALUE, DEFAULT_UNIT_SCALE, FingerName, HandModel,
    LEFT_ARM_BASELINE, MAX_FRAME_LEN, MAX_SPEED_PERCENT, RIGHT_ARM_BASELINE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 网关配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout_ms: 1000,
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub hand_model: HandModel,
    /// 覆盖型号自带的静止手指向量
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_rest: Option<Vec<u8>>,
    pub left_arm_baseline: [i32; 6],
    pub right_arm_baseline: [i32; 6],
    pub pressed_value: u8,
    pub unit_scale: i32,
    pub settle_ms: u64,
    pub pose_speed: u8,
    pub hand_ids: HandIds,
    pub gateway: GatewaySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hand_model: HandModel::default(),
            hand_rest: None,
            left_arm_baseline: LEFT_ARM_BASELINE,
            right_arm_baseline: RIGHT_ARM_BASELINE,
            pressed_value: DEFAULT_PRESSED_VALUE,
            unit_scale: DEFAULT_UNIT_SCALE,
            settle_ms: 150,
            pose_speed: DEFAULT_POSE_SPEED,
            hand_ids: HandIds::default(),
            gateway: GatewaySettings::default(),
        }
    }
}

impl EngineConfig {
    /// 从 TOML 文本解析并校验
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载并校验
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 校验预设与参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rest = self.hand_rest();
        let expected = self.hand_model.slot_count();
        if rest.len() != expected {
            return Err(ConfigError::Invalid(format!(
                "hand_rest has {} values, model {:?} expects {}",
                rest.len(),
                self.hand_model,
                expected
            )));
        }
        if rest.len() + 1 > MAX_FRAME_LEN {
            return Err(ConfigError::Invalid(format!(
                "hand_rest has {} values, a finger frame carries at most {}",
                rest.len(),
                MAX_FRAME_LEN - 1
            )));
        }
        if let Some(finger) = FingerName::ALL.iter().find(|f| f.slot() >= rest.len()) {
            return Err(ConfigError::Invalid(format!(
                "hand_rest has no slot for finger {}",
                finger
            )));
        }
        if self.pose_speed > MAX_SPEED_PERCENT {
            return Err(ConfigError::Invalid(format!(
                "pose_speed {} out of range [0, {}]",
                self.pose_speed, MAX_SPEED_PERCENT
            )));
        }
        if self.unit_scale <= 0 {
            return Err(ConfigError::Invalid(format!(
                "unit_scale must be positive, got {}",
                self.unit_scale
            )));
        }
        if self.gateway.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.base_url is empty".to_string()));
        }
        Ok(())
    }

    /// 生效的静止手指向量
    pub fn hand_rest(&self) -> Vec<u8> {
        self.hand_rest
            .clone()
            .unwrap_or_else(|| self.hand_model.rest_preset().to_vec())
    }

    pub fn presets(&self) -> Presets {
        Presets {
            hand_rest: self.hand_rest(),
            arm_baseline: [self.left_arm_baseline, self.right_arm_baseline],
            pressed: self.pressed_value,
            unit_scale: self.unit_scale,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.gateway.base_url.clone(),
            timeout: Duration::from_millis(self.gateway.timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.settle(), Duration::from_millis(150));
        assert_eq!(config.presets(), Presets::default());
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            hand_model = "o7"
            settle_ms = 200
            left_arm_baseline = [410, 5, 260, 0, 80, 0]

            [hand_ids]
            left = 0x30
            right = 0x31

            [gateway]
            base_url = "http://10.0.0.2:5260"
            "#,
        )
        .unwrap();
        assert_eq!(config.hand_model, HandModel::O7);
        assert_eq!(config.hand_rest(), vec![0, 255, 235, 235, 235, 235, 100]);
        assert_eq!(config.presets().arm_baseline[0], [410, 5, 260, 0, 80, 0]);
        assert_eq!(config.hand_ids.left, 0x30);
        assert_eq!(
            config.gateway_config().endpoint(),
            "http://10.0.0.2:5260/api/can"
        );
        assert_eq!(config.gateway.timeout_ms, 1000);
    }

    #[test]
    fn test_rest_length_must_match_model() {
        let err = EngineConfig::from_toml_str("hand_rest = [0, 0, 225, 225, 225]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_arm_baseline_needs_six_values() {
        let err = EngineConfig::from_toml_str("left_arm_baseline = [400, 0, 251]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_pose_speed_range() {
        let err = EngineConfig::from_toml_str("pose_speed = 101").unwrap_err();
        assert!(err.to_string().contains("pose_speed"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(EngineConfig::from_toml_str("settle = 1").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
