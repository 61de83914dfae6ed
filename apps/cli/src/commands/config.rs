//! 配置管理命令
//!
//! 用于管理 CLI 配置（默认串口、波特率等）

use crate::config::CliConfig;
use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// 默认串口（如 /dev/rfcomm0, COM6）
        #[arg(short, long)]
        port: Option<String>,

        /// 串口波特率
        #[arg(short, long)]
        baud: Option<u32>,

        /// TCP 地址
        #[arg(long)]
        tcp: Option<String>,

        /// 日志过滤指令
        #[arg(long)]
        log_filter: Option<String>,

        /// 读线程 join 超时（毫秒）
        #[arg(long)]
        join_timeout_ms: Option<u64>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称
        #[arg(default_value = "all")]
        key: String,
    },

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Set {
                port,
                baud,
                tcp,
                log_filter,
                join_timeout_ms,
            } => {
                let mut config = CliConfig::load(path)?;
                if port.is_some() {
                    config.port = port;
                }
                if baud.is_some() {
                    config.baud_rate = baud;
                }
                if tcp.is_some() {
                    config.tcp = tcp;
                }
                if log_filter.is_some() {
                    config.log_filter = log_filter;
                }
                if join_timeout_ms.is_some() {
                    config.join_timeout_ms = join_timeout_ms;
                }
                config.save(path)?;
                println!("✅ 已保存: {}", path.display());
                Ok(())
            },

            ConfigCommand::Get { key } => {
                let config = CliConfig::load(path)?;
                println!("{}", Self::get_value(&config, &key)?);
                Ok(())
            },

            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
        }
    }

    fn get_value(config: &CliConfig, key: &str) -> Result<String> {
        fn show<T: ToString>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "(未设置)".to_string())
        }

        let value = match key {
            "port" => show(&config.port),
            "baud_rate" | "baud" => show(&config.baud_rate),
            "tcp" => show(&config.tcp),
            "log_filter" => config.log_filter().to_string(),
            "join_timeout_ms" => show(&config.join_timeout_ms),
            "all" => format!(
                "port = {}\nbaud_rate = {}\ntcp = {}\nlog_filter = {}\njoin_timeout_ms = {}",
                show(&config.port),
                show(&config.baud_rate),
                show(&config.tcp),
                config.log_filter(),
                show(&config.join_timeout_ms)
            ),
            other => anyhow::bail!("未知配置项: {}", other),
        };
        Ok(value)
    }
}
