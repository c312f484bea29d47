//! 乐谱离线校验

use crate::settings::load_config;
use anyhow::{Context, Result};
use clap::Args;
use piano_engine::{ScoreRequest, Side};
use std::path::{Path, PathBuf};

/// 校验命令参数
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// 乐谱文件（JSON）
    pub score: PathBuf,
}

impl ValidateCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        let text = std::fs::read_to_string(&self.score)
            .with_context(|| format!("读取乐谱失败: {}", self.score.display()))?;
        let request = ScoreRequest::from_json(&text)?
            .into_playback(config.hand_ids)
            .with_context(|| format!("乐谱无效: {}", self.score.display()))?;

        let score = &request.score;
        let presses: usize = score
            .notes
            .iter()
            .map(|n| n.left.presses.len() + n.right.presses.len())
            .sum();

        println!("✅ 乐谱有效: {}", self.score.display());
        println!("  音符: {}", score.notes.len());
        println!("  按键: {}", presses);
        println!("  预设位置: {}", if score.needs_prelude() { "是" } else { "否" });
        println!(
            "  理论时长: {:.2?}",
            score.nominal_duration(config.settle())
        );
        for side in Side::BOTH {
            let hand = request.bindings.hand(side);
            println!(
                "  {}: 手 {} (0x{:02X})，臂 {}",
                side,
                hand.channel,
                hand.hand_id,
                request.bindings.arm(side)
            );
        }
        Ok(())
    }
}
