//! Builder 模式实现
//!
//! 提供链式构造 `Headset` 实例的便捷方式。

use crate::error::DriverError;
use crate::headset::Headset;
use crate::pipeline::ReaderConfig;
#[cfg(feature = "serial")]
use mindwave_transport::SerialOpener;
use mindwave_transport::{FileOpener, TcpOpener, TransportOpener};
use std::path::PathBuf;
use std::time::Duration;

/// Headset Builder（链式构造）
///
/// 传输选择优先级：`transport()` > `serial()` > `tcp()` > `replay()`。
///
/// # Example
///
/// ```no_run
/// use mindwave_driver::HeadsetBuilder;
/// use std::time::Duration;
///
/// let headset = HeadsetBuilder::new()
///     .serial("/dev/rfcomm0")
///     .baud_rate(57_600)
///     .join_timeout(Duration::from_secs(1))
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct HeadsetBuilder {
    /// 自定义传输
    transport: Option<Box<dyn TransportOpener>>,
    /// 串口名称（如 "/dev/rfcomm0"、"COM6"）
    #[cfg(feature = "serial")]
    serial_port: Option<String>,
    /// 串口波特率（默认 57600）
    #[cfg(feature = "serial")]
    baud_rate: Option<u32>,
    /// TCP 地址（如 "127.0.0.1:13854"）
    tcp_addr: Option<String>,
    /// 抓包文件回放
    replay_path: Option<PathBuf>,
    join_timeout: Option<Duration>,
    sample_rate_hz: Option<u32>,
}

impl HeadsetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用串口
    #[cfg(feature = "serial")]
    pub fn serial(mut self, port: impl Into<String>) -> Self {
        self.serial_port = Some(port.into());
        self
    }

    /// 设置串口波特率（可选，默认 57600）
    #[cfg(feature = "serial")]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    /// 使用 TCP 连接
    pub fn tcp(mut self, addr: impl Into<String>) -> Self {
        self.tcp_addr = Some(addr.into());
        self
    }

    /// 回放抓包文件（每次 start 从头读取）
    pub fn replay(mut self, path: impl Into<PathBuf>) -> Self {
        self.replay_path = Some(path.into());
        self
    }

    /// 使用自定义传输（例如进程内通道）
    pub fn transport(mut self, opener: impl TransportOpener + 'static) -> Self {
        self.transport = Some(Box::new(opener));
        self
    }

    /// `stop()` 等待读线程的最长时间（默认 2 秒）
    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = Some(timeout);
        self
    }

    /// 原始 EEG 采样率（默认 512 Hz）
    pub fn sample_rate_hz(mut self, hz: u32) -> Self {
        self.sample_rate_hz = Some(hz);
        self
    }

    /// 构建 Headset（不会打开传输，`start()` 时才打开）
    ///
    /// # 错误
    /// - `DriverError::NoTransport`: 未指定任何传输
    pub fn build(self) -> Result<Headset, DriverError> {
        let defaults = ReaderConfig::default();
        let config = ReaderConfig {
            join_timeout: self.join_timeout.unwrap_or(defaults.join_timeout),
            sample_rate_hz: self.sample_rate_hz.unwrap_or(defaults.sample_rate_hz),
        };

        let opener = self.select_transport()?;
        Ok(Headset::from_boxed(opener, config))
    }

    fn select_transport(self) -> Result<Box<dyn TransportOpener>, DriverError> {
        if let Some(opener) = self.transport {
            return Ok(opener);
        }

        #[cfg(feature = "serial")]
        {
            if let Some(port) = self.serial_port {
                let mut opener = SerialOpener::new(port);
                if let Some(baud_rate) = self.baud_rate {
                    opener = opener.baud_rate(baud_rate);
                }
                return Ok(Box::new(opener));
            }
        }

        if let Some(addr) = self.tcp_addr {
            return Ok(Box::new(TcpOpener::new(addr)));
        }

        if let Some(path) = self.replay_path {
            return Ok(Box::new(FileOpener::new(path)));
        }

        Err(DriverError::NoTransport)
    }
}
