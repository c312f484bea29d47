//! 演奏命令
//!
//! 专用输入线程读取 `stop` / `resume` / `kill`，经通道交给主线程；
//! Ctrl+C 也经同一通道转成 `kill`。主线程在会话回到 Idle 后取回结果。

use crate::settings::{connect, load_config};
use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use piano_engine::{
    EngineError, PlaybackController, PlaybackState, ScoreRequest, SequenceOutcome,
};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::warn;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 演奏命令参数
#[derive(Args, Debug)]
pub struct PlayCommand {
    /// 乐谱文件（JSON）
    pub score: PathBuf,

    /// 不读取标准输入（只能用 Ctrl+C 终止）
    #[arg(long)]
    pub no_input: bool,
}

/// 控制指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Stop,
    Resume,
    Kill,
    Status,
    Help,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "stop" | "pause" => Some(Control::Stop),
            "resume" | "continue" => Some(Control::Resume),
            "kill" | "quit" | "exit" => Some(Control::Kill),
            "status" => Some(Control::Status),
            "help" | "?" => Some(Control::Help),
            _ => None,
        }
    }
}

impl PlayCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        let text = std::fs::read_to_string(&self.score)
            .with_context(|| format!("读取乐谱失败: {}", self.score.display()))?;
        let request = ScoreRequest::from_json(&text)?.into_playback(config.hand_ids)?;
        let notes = request.score.notes.len();

        let engine = connect(&config)?;
        let controller = engine.controller();

        let (control_tx, control_rx) = bounded::<Control>(16);
        let interrupt_tx = control_tx.clone();
        ctrlc::set_handler(move || {
            let _ = interrupt_tx.try_send(Control::Kill);
        })
        .context("设置 Ctrl+C 处理失败")?;
        if !self.no_input {
            spawn_input_thread(control_tx);
        }

        controller.start(request)?;
        println!("🎹 开始演奏 {} 个音符，输入 help 查看控制指令", notes);

        loop {
            match control_rx.recv_timeout(POLL_INTERVAL) {
                Ok(control) => apply(controller, control),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {},
            }
            if controller.state() == PlaybackState::Idle {
                break;
            }
        }

        let report = controller.wait()?;
        match report.outcome {
            Ok(SequenceOutcome::Finished { notes }) => {
                println!("✅ 演奏完成: {} 个音符，用时 {:.2?}", notes, report.elapsed);
                Ok(())
            },
            Ok(SequenceOutcome::Aborted { completed }) => {
                println!("⏹ 演奏已终止: 完成 {}/{} 个音符", completed, notes);
                Ok(())
            },
            Err(e) => {
                if e.requires_rehome() {
                    eprintln!("⚠️  机械臂可能停在中间位置，请执行 piano-cli home");
                }
                Err(e.into())
            },
        }
    }
}

fn apply(controller: &PlaybackController, control: Control) {
    let result: Result<(), EngineError> = match control {
        Control::Stop => controller.stop().map(|_| println!("⏸ 将在当前音符结束后暂停")),
        Control::Resume => controller.resume().map(|_| println!("▶ 继续演奏")),
        Control::Kill => controller.kill().map(|_| println!("⏹ 将在当前音符结束后终止")),
        Control::Status => {
            println!("状态: {}", controller.state());
            Ok(())
        },
        Control::Help => {
            println!("可用指令: stop | resume | kill | status | help");
            Ok(())
        },
    };
    if let Err(e) = result {
        warn!("{}", e);
    }
}

/// 专用输入线程：每行解析为一个控制指令
fn spawn_input_thread(control_tx: Sender<Control>) {
    thread::spawn(move || {
        let mut rl = match rustyline::DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                warn!("无法初始化输入: {}", e);
                return;
            },
        };

        loop {
            match rl.readline("piano> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);
                    match Control::parse(line) {
                        Some(control) => {
                            if control_tx.send(control).is_err() {
                                break; // 主线程已退出
                            }
                        },
                        None => println!("未知指令: {}（输入 help 查看帮助）", line),
                    }
                },

                Err(rustyline::error::ReadlineError::Interrupted) => {
                    // Ctrl+C：在主线程处理
                    let _ = control_tx.send(Control::Kill);
                },

                Err(rustyline::error::ReadlineError::Eof) => break,

                Err(err) => {
                    warn!("读取输入失败: {:?}", err);
                    break;
                },
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_parse() {
        assert_eq!(Control::parse("stop"), Some(Control::Stop));
        assert_eq!(Control::parse(" resume "), Some(Control::Resume));
        assert_eq!(Control::parse("kill"), Some(Control::Kill));
        assert_eq!(Control::parse("quit"), Some(Control::Kill));
        assert_eq!(Control::parse("status"), Some(Control::Status));
        assert_eq!(Control::parse("play"), None);
    }
}
