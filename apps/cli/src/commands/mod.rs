//! 命令定义和实现

pub mod arm;
pub mod config;
pub mod play;
pub mod validate;

pub use arm::{ArmCommand, ChannelArgs};
pub use config::ConfigCommand;
pub use play::PlayCommand;
pub use validate::ValidateCommand;
