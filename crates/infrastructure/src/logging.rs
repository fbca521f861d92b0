use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use release_config::{LogConfig, OutputFormat};

/// 初始化日志系统
///
/// `RUST_LOG` 存在时优先于配置中的级别。日志写到 stderr，stdout 留给命令输出。
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        OutputFormat::Json => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_file(config.include_caller)
                        .with_line_number(config.include_caller),
                )
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        OutputFormat::Pretty => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_file(config.include_caller)
                        .with_line_number(config.include_caller),
                )
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
    }

    debug!(level = %config.level, format = ?config.format, "日志系统已初始化");
    Ok(())
}
