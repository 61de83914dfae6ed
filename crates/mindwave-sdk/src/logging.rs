//! 日志初始化
//!
//! 使用 `tracing-subscriber` 输出日志，`RUST_LOG` 优先于默认指令。
//! 同时安装 `LogTracer`，把依赖库经 `log` 发出的记录转发到 tracing。

use tracing_subscriber::EnvFilter;

/// 初始化全局日志（已初始化时静默忽略）
///
/// `default_directive` 形如 `"mindwave_sdk=info"`，在 `RUST_LOG` 未设置时生效。
pub fn init_logger(default_directive: &str) {
    if let Err(e) = try_init_logger(default_directive) {
        tracing::debug!("Logger already initialized: {}", e);
    }
}

/// 初始化全局日志，重复初始化时返回错误
pub fn try_init_logger(
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };

    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        init_logger("mindwave_sdk=debug");
        init_logger("mindwave_sdk=debug");
        assert!(try_init_logger("mindwave_sdk=debug").is_err());
    }
}
