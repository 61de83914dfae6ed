//! 命令定义和实现

pub mod config;
pub mod dump;
pub mod export;
pub mod monitor;
pub mod ports;
pub mod record;

pub use config::ConfigCommand;
pub use dump::DumpCommand;
pub use export::ExportCommand;
pub use monitor::MonitorCommand;
pub use record::RecordCommand;

use crate::config::CliConfig;
use anyhow::Result;
use clap::Args;
use mindwave_sdk::{Headset, HeadsetBuilder};
use std::path::PathBuf;
use std::time::Duration;

/// 数据源参数（覆盖配置文件）
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// 串口名称
    #[arg(short, long)]
    pub port: Option<String>,

    /// 串口波特率
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// TCP 地址
    #[arg(long, conflicts_with = "port")]
    pub tcp: Option<String>,

    /// 回放抓包文件而不是连接设备
    #[arg(long, conflicts_with_all = ["port", "tcp"])]
    pub replay: Option<PathBuf>,
}

impl SourceArgs {
    /// 合并命令行参数与配置文件，构建 Headset
    ///
    /// 命令行指定的数据源优先；都未指定时使用配置文件中的串口，再退回 TCP。
    pub fn build_headset(&self, config: &CliConfig) -> Result<Headset> {
        let mut builder = HeadsetBuilder::new();

        if let Some(ms) = config.join_timeout_ms {
            builder = builder.join_timeout(Duration::from_millis(ms));
        }

        builder = if let Some(path) = &self.replay {
            builder.replay(path)
        } else if let Some(addr) = &self.tcp {
            builder.tcp(addr)
        } else if let Some(port) = self.port.as_ref().or(config.port.as_ref()) {
            let baud = self.baud.or(config.baud_rate);
            let builder = builder.serial(port);
            match baud {
                Some(baud) => builder.baud_rate(baud),
                None => builder,
            }
        } else if let Some(addr) = &config.tcp {
            builder.tcp(addr)
        } else {
            anyhow::bail!("未指定数据源：使用 --port / --tcp / --replay，或在配置文件中设置 port");
        };

        Ok(builder.build()?)
    }
}
