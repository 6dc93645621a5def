pub mod config;
pub mod error;
pub mod host;
pub mod launcher;
pub mod lock;
pub mod orchestrator;
pub mod prepare;
pub mod probe;
pub mod project;
pub mod reaper;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::DevConfig;
pub use error::{Result, SetupError};
pub use host::{CommandSpec, ProcessHost, RunStatus, SystemHost};
pub use orchestrator::{run_up, LaunchSummary, UpOptions};
