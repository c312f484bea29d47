//! 单次机械臂指令
//!
//! 失能和回零会让机械臂明显动作，默认需要确认。

use crate::settings::{connect, load_config};
use crate::validation::parse_six;
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// 运动指令参数
#[derive(Args, Debug)]
pub struct ArmCommand {
    /// 机械臂所在的总线接口（如 can2）
    #[arg(short, long)]
    pub channel: String,

    /// 6 个目标值，逗号分隔
    /// 关节：0.001°；位姿：x,y,z 为 0.001mm，rx,ry,rz 为 0.001°
    #[arg(short, long, allow_hyphen_values = true)]
    pub values: String,

    /// 速度百分比（0-100）
    #[arg(short, long, default_value_t = 50)]
    pub speed: i64,
}

impl ArmCommand {
    pub fn joint(self, config_path: Option<&Path>) -> Result<()> {
        let joints = parse_six(&self.values, "关节角度")?;
        let engine = connect(&load_config(config_path)?)?;
        engine
            .commander()
            .send_joint(&self.channel, joints, self.speed)?;
        println!("✅ 关节运动已发送: {}", self.channel);
        Ok(())
    }

    pub fn pose(self, config_path: Option<&Path>) -> Result<()> {
        let pose = parse_six(&self.values, "位姿")?;
        let engine = connect(&load_config(config_path)?)?;
        engine
            .commander()
            .send_pose(&self.channel, pose, self.speed)?;
        println!("✅ 位姿运动已发送: {}", self.channel);
        Ok(())
    }
}

/// 只需要通道的指令参数
#[derive(Args, Debug)]
pub struct ChannelArgs {
    /// 机械臂所在的总线接口（如 can2）
    #[arg(short, long)]
    pub channel: String,

    /// 跳过确认提示
    #[arg(long)]
    pub force: bool,
}

impl ChannelArgs {
    fn confirm(&self, message: &str) -> Result<bool> {
        if self.force {
            return Ok(true);
        }
        inquire::Confirm::new(message)
            .with_default(false) // 默认为 No
            .prompt()
            .map_err(|e| anyhow::anyhow!("用户交互失败: {}", e))
    }

    pub fn enable(self, config_path: Option<&Path>) -> Result<()> {
        let engine = connect(&load_config(config_path)?)?;
        engine.commander().enable_all(&self.channel)?;
        println!("✅ 已使能: {}", self.channel);
        Ok(())
    }

    pub fn disable(self, config_path: Option<&Path>) -> Result<()> {
        if !self.confirm("失能后机械臂会失去保持力矩，确定继续吗？")? {
            println!("已取消");
            return Ok(());
        }
        let engine = connect(&load_config(config_path)?)?;
        engine.commander().disable_all(&self.channel)?;
        println!("✅ 已失能: {}", self.channel);
        Ok(())
    }

    pub fn home(self, config_path: Option<&Path>) -> Result<()> {
        if !self.confirm("机械臂将全速回到零位，确定继续吗？")? {
            println!("已取消");
            return Ok(());
        }
        let engine = connect(&load_config(config_path)?)?;
        engine.commander().home(&self.channel)?;
        println!("✅ 回零指令已发送: {}", self.channel);
        Ok(())
    }
}
