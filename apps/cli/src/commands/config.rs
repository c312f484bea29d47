//! 配置管理命令

use crate::settings::{config_file, load_config};
use anyhow::{Context, Result};
use clap::Subcommand;
use piano_engine::EngineConfig;
use std::fs;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置（TOML）
    Show,

    /// 检查配置文件
    Check,

    /// 显示配置文件路径
    Path,

    /// 写入默认配置文件
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => Self::show_(config_path),

            ConfigCommand::Check => Self::check_(config_path),

            ConfigCommand::Path => {
                println!("{}", config_file(config_path)?.display());
                Ok(())
            },

            ConfigCommand::Init { force } => Self::init_(config_path, force),
        }
    }

    fn show_(config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        print!("{}", config.to_toml_string()?);
        Ok(())
    }

    fn check_(config_path: Option<&Path>) -> Result<()> {
        let path = config_file(config_path)?;
        if config_path.is_none() && !path.exists() {
            println!("ℹ️  未找到配置文件，使用默认配置: {}", path.display());
            return Ok(());
        }

        let config = load_config(config_path)?;
        println!("✅ 配置有效: {}", path.display());
        println!("  手型号: {:?}", config.hand_model);
        println!("  静止手指向量: {:?}", config.hand_rest());
        println!(
            "  手帧 ID: 左 0x{:02X} / 右 0x{:02X}",
            config.hand_ids.left, config.hand_ids.right
        );
        println!("  网关: {}", config.gateway_config().endpoint());
        Ok(())
    }

    fn init_(config_path: Option<&Path>, force: bool) -> Result<()> {
        let path = config_file(config_path)?;
        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }

        let content = format!(
            "# Piano CLI Configuration\n\n{}",
            EngineConfig::default().to_toml_string()?
        );
        fs::write(&path, content).context("写入配置文件失败")?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }
}
