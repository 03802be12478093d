//! 日志基础设施

use std::io;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use super::config::LoggingConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to create log directory: {0}")]
    LogDir(#[from] io::Error),
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

pub struct Logger;

impl Logger {
    /// 初始化日志：控制台输出，配置了 `log_dir` 时再写按天滚动的文件。
    /// `RUST_LOG` 优先于配置的级别。返回的 guard 需要保持到进程退出。
    pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggerError> {
        let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
            _ => EnvFilter::try_new(&config.level)?,
        };

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
        layers.push(fmt::layer().with_writer(io::stdout).with_ansi(true).boxed());

        let guard = match &config.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let (writer, guard) =
                    tracing_appender::non_blocking(rolling::daily(dir, &config.file_prefix));
                layers.push(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(false)
                        .with_thread_names(true)
                        .boxed(),
                );
                Some(guard)
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(layers)
            .with(filter)
            .try_init()?;

        Ok(guard)
    }
}
