mod app_config;
mod config;
mod error;
pub mod input;
pub mod queue;
pub mod target;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, TargetError};
pub use input::load_targets;
pub use queue::TargetQueue;
pub use target::{EntityKind, QueuedTarget, Target};
