//! # Piano CLI
//!
//! 双臂 + 灵巧手弹琴平台的命令行工具。
//!
//! ```bash
//! # 校验乐谱（不连接网关）
//! piano-cli validate song.json
//!
//! # 演奏；输入 stop / resume / kill 控制播放，Ctrl+C 等同 kill
//! piano-cli play song.json
//!
//! # 单次机械臂指令
//! piano-cli enable --channel can2
//! piano-cli joint --channel can2 --values 0,10000,-20000,0,0,0 --speed 30
//! piano-cli home --channel can2
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod settings;
mod validation;

use commands::{ArmCommand, ChannelArgs, ConfigCommand, PlayCommand, ValidateCommand};

/// Piano CLI - 弹琴平台命令行工具
#[derive(Parser, Debug)]
#[command(name = "piano-cli")]
#[command(about = "Play piano scores on the dual-arm / dual-hand platform", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（默认 <config_dir>/piano/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 演奏乐谱
    Play {
        #[command(flatten)]
        args: PlayCommand,
    },

    /// 离线校验乐谱
    Validate {
        #[command(flatten)]
        args: ValidateCommand,
    },

    /// 关节运动（0.001°）
    Joint {
        #[command(flatten)]
        args: ArmCommand,
    },

    /// 末端位姿运动（0.001mm / 0.001°）
    Pose {
        #[command(flatten)]
        args: ArmCommand,
    },

    /// 使能全部关节电机
    Enable {
        #[command(flatten)]
        args: ChannelArgs,
    },

    /// 失能全部关节电机
    Disable {
        #[command(flatten)]
        args: ChannelArgs,
    },

    /// 全部关节回零
    Home {
        #[command(flatten)]
        args: ChannelArgs,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("piano_cli=info,piano_engine=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Play { args } => args.execute(config_path),

        Commands::Validate { args } => args.execute(config_path),

        Commands::Joint { args } => args.joint(config_path),

        Commands::Pose { args } => args.pose(config_path),

        Commands::Enable { args } => args.enable(config_path),

        Commands::Disable { args } => args.disable(config_path),

        Commands::Home { args } => args.home(config_path),

        Commands::Config(cmd) => cmd.execute(config_path),
    }
}
