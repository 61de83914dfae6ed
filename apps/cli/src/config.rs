//! CLI 配置文件
//!
//! 默认路径为 `<config_dir>/mindwave/config.toml`，可用 `--config` 覆盖。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认日志过滤指令
pub const DEFAULT_LOG_FILTER: &str = "mindwave_cli=info,mindwave_driver=info";

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("mindwave");
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 默认串口（如 /dev/rfcomm0、COM6）
    pub port: Option<String>,

    /// 串口波特率
    pub baud_rate: Option<u32>,

    /// TCP 地址（串口转 TCP 网关）
    pub tcp: Option<String>,

    /// 日志过滤指令（`RUST_LOG` 优先）
    pub log_filter: Option<String>,

    /// `stop()` 等待读线程的最长时间（毫秒）
    pub join_timeout_ms: Option<u64>,
}

impl CliConfig {
    /// 加载配置（文件不存在时返回默认配置）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 保存配置（自动创建目录）
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }

        let content = toml::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, format!("# MindWave CLI Configuration\n\n{content}"))
            .context("写入配置文件失败")?;
        Ok(())
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
