//! 配置文件定位与加载

use anyhow::{Context, Result};
use piano_engine::{Engine, EngineConfig, SystemClock};
use piano_gateway::HttpGateway;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// 默认配置文件路径：`<config_dir>/piano/config.toml`
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("piano");
    path.push("config.toml");
    Ok(path)
}

/// 生效的配置文件路径
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_file(),
    }
}

/// 加载配置
///
/// 显式指定的文件必须存在；默认位置没有文件时使用内置默认值。
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = config_file(explicit)?;
    if explicit.is_none() && !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(EngineConfig::default());
    }

    let config = EngineConfig::load(&path)
        .with_context(|| format!("加载配置文件失败: {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// 按配置连接网关并创建引擎
pub fn connect(config: &EngineConfig) -> Result<Engine> {
    let gateway = HttpGateway::new(&config.gateway_config()).context("创建网关客户端失败")?;
    debug!(endpoint = gateway.endpoint(), "gateway client ready");
    Ok(Engine::new(
        config,
        Arc::new(gateway),
        Arc::new(SystemClock::new()),
    ))
}
