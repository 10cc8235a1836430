pub mod config;

pub use config::{ProjectConfig, TargetSpec, CONFIG_FILE};
