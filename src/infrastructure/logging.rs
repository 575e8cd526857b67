//! 日志系统配置模块
//! 支持文本/JSON 两种格式，可选按天轮转的文件日志

use std::path::Path;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;

const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_LOG_FILE: &str = "walletstore.log";

/// 初始化日志系统
///
/// 开启文件日志时返回的 guard 必须一直持有，drop 后缓冲区不再落盘
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    // RUST_LOG 优先于配置
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = config.format == "json";

    if !config.enable_file_logging {
        if json {
            Registry::default()
                .with(filter)
                .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
                .try_init()?;
        } else {
            Registry::default()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(true),
                )
                .try_init()?;
        }
        return Ok(None);
    }

    let (log_dir, file_name) = log_location(config.log_file_path.as_deref());
    std::fs::create_dir_all(log_dir)?;
    let file_appender = rolling::daily(log_dir, file_name);
    let (writer, guard) = non_blocking(file_appender);

    if json {
        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_timer(ChronoUtc::rfc_3339()),
            )
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
            .try_init()?;
    } else {
        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false),
            )
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(true),
            )
            .try_init()?;
    }

    Ok(Some(guard))
}

fn log_location(log_file_path: Option<&str>) -> (&Path, &str) {
    let Some(path) = log_file_path.map(Path::new) else {
        return (Path::new(DEFAULT_LOG_DIR), DEFAULT_LOG_FILE);
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    (dir, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_location() {
        assert_eq!(
            log_location(None),
            (Path::new(DEFAULT_LOG_DIR), DEFAULT_LOG_FILE)
        );
        assert_eq!(
            log_location(Some("/var/log/wallet/store.log")),
            (Path::new("/var/log/wallet"), "store.log")
        );
        assert_eq!(log_location(Some("store.log")), (Path::new("."), "store.log"));
    }
}
