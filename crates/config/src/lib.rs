//! 发布计划工具的配置
//!
//! 加载顺序见 [`AppConfig::load`]；每个配置段实现 [`ConfigValidator`]。

pub mod models;
pub mod validation;

pub use models::{
    ApiClientConfig, AppConfig, LogConfig, LogLevel, OutputFormat, ScheduleDefaults, StorageConfig,
};
pub use validation::{ConfigValidator, ValidationUtils};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置校验失败: {0}")]
    Validation(String),
}
