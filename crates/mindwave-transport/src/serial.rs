//! 串口字节源
//!
//! 设备通过蓝牙串口或 USB 适配器输出 57600 波特率的 ThinkGear 流。
//! 端口超时被当作轮询间隔：`TimedOut` 时检查关闭标志后继续等待，
//! 因此 `close()` 最多延迟一个 `poll_interval` 生效。

use crate::{ByteSource, CloseHandle, TransportError, TransportOpener};
use serialport::SerialPort;
use std::io::{self, Read};
use std::time::Duration;
use tracing::{debug, info};

/// 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 列出系统中可用的串口名称
pub fn list_ports() -> Result<Vec<String>, TransportError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

/// 串口打开器
#[derive(Debug, Clone)]
pub struct SerialOpener {
    port: String,
    baud_rate: u32,
    poll_interval: Duration,
}

impl SerialOpener {
    /// 使用默认波特率（57600）
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl TransportOpener for SerialOpener {
    fn open(&self) -> Result<Box<dyn ByteSource>, TransportError> {
        let port = serialport::new(&self.port, self.baud_rate)
            .timeout(self.poll_interval)
            .open()
            .map_err(|e| TransportError::Open {
                target: self.port.clone(),
                reason: e.to_string(),
            })?;
        info!("Serial port {} opened at {} baud", self.port, self.baud_rate);
        Ok(Box::new(SerialSource::new(port, self.port.clone())))
    }

    fn describe(&self) -> String {
        format!("serial:{}@{}", self.port, self.baud_rate)
    }
}

/// 串口字节源
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    name: String,
    close: CloseHandle,
}

impl SerialSource {
    pub fn new(port: Box<dyn SerialPort>, name: impl Into<String>) -> Self {
        Self {
            port,
            name: name.into(),
            close: CloseHandle::new(),
        }
    }
}

/// 轮询读取直到填满 `buf`
///
/// `TimedOut` 视为轮询间隔；读到 0 字节说明端口已被拔出或关闭。
fn fill_buf<R: Read + ?Sized>(
    port: &mut R,
    buf: &mut [u8],
    close: &CloseHandle,
    name: &str,
) -> Result<(), TransportError> {
    let mut filled = 0;
    while filled < buf.len() {
        if close.is_closed() {
            return Err(TransportError::Closed);
        }
        match port.read(&mut buf[filled..]) {
            Ok(0) => {
                debug!("Serial port {} returned EOF", name);
                return Err(TransportError::Disconnected);
            },
            Ok(n) => filled += n,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                continue;
            },
            Err(e) => {
                debug!("Serial read on {} failed: {}", name, e);
                return Err(TransportError::Io(e));
            },
        }
    }
    Ok(())
}

impl ByteSource for SerialSource {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        fill_buf(&mut *self.port, buf, &self.close, &self.name)
    }

    fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    fn describe(&self) -> String {
        format!("serial:{}", self.name)
    }
}
