pub mod command;
pub mod error;
pub mod installer;
pub mod lock;
pub mod resolver;
pub mod scanner;
pub mod tool;

pub use command::{InstallLocation, ToolContext};
pub use installer::PluginInstaller;
pub use tool::Plugman;
