//! # MindWave CLI
//!
//! Command-line interface for NeuroSky MindWave headsets.
//!
//! ```bash
//! # 配置默认串口
//! mindwave-cli config set --port /dev/rfcomm0
//!
//! # 实时监控
//! mindwave-cli monitor --blinks
//!
//! # 录制 60 秒并导出 CSV（标准输入中的整数行作为刺激标记）
//! mindwave-cli record --output session.mwr --duration 60 --csv session.csv
//!
//! # 离线解析抓包
//! mindwave-cli dump --input capture.bin --no-raw
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod utils;

use commands::{ConfigCommand, DumpCommand, ExportCommand, MonitorCommand, RecordCommand};
use config::CliConfig;

/// MindWave CLI - 脑电头戴设备命令行工具
#[derive(Parser, Debug)]
#[command(name = "mindwave-cli")]
#[command(about = "Command-line interface for NeuroSky MindWave headsets", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/mindwave/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 列出可用串口
    Ports,

    /// 实时监控读数
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 录制原始 EEG 与刺激标记
    Record {
        #[command(flatten)]
        args: RecordCommand,
    },

    /// 离线解析原始字节抓包
    Dump {
        #[command(flatten)]
        args: DumpCommand,
    },

    /// 把录制文件导出为 CSV
    Export {
        #[command(flatten)]
        args: ExportCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let config = CliConfig::load(&config_path)?;

    // 初始化日志
    mindwave_sdk::init_logger(config.log_filter());

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&config_path),
        Commands::Ports => commands::ports::execute(),
        Commands::Monitor { args } => args.execute(&config),
        Commands::Record { args } => args.execute(&config),
        Commands::Dump { args } => args.execute(),
        Commands::Export { args } => args.execute(),
    }
}
