//! # MindWave Transport Layer
//!
//! 字节流传输抽象层，为帧同步提供统一的阻塞读取接口。
//!
//! ## 后端
//!
//! - [`serial`]: 串口（`serialport`，默认 57600 波特率），需要 `serial` feature
//! - [`tcp`]: TCP 连接（例如 ThinkGear Connector 的原始流转发）
//! - [`reader`]: 任意 `std::io::Read`（抓包文件回放）
//! - [`channel`]: 进程内通道（测试和模拟器）
//!
//! ## 关闭语义
//!
//! 每个 [`ByteSource`] 提供一个可跨线程使用的 [`CloseHandle`]。
//! 调用 `close()` 后，阻塞中的 `read_exact` 会尽快返回 [`TransportError::Closed`]，
//! 读线程因此可以被 join。

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

pub mod channel;
pub mod reader;
#[cfg(feature = "serial")]
pub mod serial;
pub mod tcp;

pub use channel::{ChannelFeeder, ChannelOpener, ChannelSource, channel};
pub use reader::{FileOpener, ReaderSource};
#[cfg(feature = "serial")]
pub use serial::{SerialOpener, SerialSource, list_ports};
pub use tcp::{TcpOpener, TcpSource};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    /// 对端断开（EOF、发送端全部释放）
    #[error("Transport disconnected")]
    Disconnected,
    /// 本端通过 `CloseHandle` 主动关闭
    #[error("Transport closed")]
    Closed,
    #[error("Failed to open {target}: {reason}")]
    Open { target: String, reason: String },
}

impl TransportError {
    /// 是否为主动关闭导致的错误
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}

/// 跨线程关闭句柄
///
/// 可克隆；多次调用 `close()` 只有第一次会触发关闭动作。
#[derive(Clone, Default)]
pub struct CloseHandle {
    closed: Arc<AtomicBool>,
    on_close: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl CloseHandle {
    /// 仅设置关闭标志的句柄（适用于轮询式后端）
    pub fn new() -> Self {
        Self::default()
    }

    /// 关闭时额外执行 `action`（例如 shutdown socket 以唤醒阻塞的读取）
    pub fn with_action(action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            closed: Arc::new(AtomicBool::new(false)),
            on_close: Some(Arc::new(action)),
        }
    }

    /// 关闭传输
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel)
            && let Some(action) = &self.on_close
        {
            action();
        }
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CloseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseHandle")
            .field("closed", &self.is_closed())
            .field("has_action", &self.on_close.is_some())
            .finish()
    }
}

/// 阻塞式字节源
///
/// 读线程独占 `ByteSource`；其他线程只能通过 [`CloseHandle`] 与其交互。
pub trait ByteSource: Send {
    /// 阻塞直到填满 `buf`
    ///
    /// # 错误
    /// - `TransportError::Closed`: 已通过 `CloseHandle` 关闭
    /// - `TransportError::Disconnected`: 对端断开
    /// - 其他：底层 IO 错误
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;

    /// 读取单个字节
    fn read_byte(&mut self) -> Result<u8, TransportError> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// 获取关闭句柄
    fn close_handle(&self) -> CloseHandle;

    /// 用于日志的描述
    fn describe(&self) -> String {
        "byte source".to_string()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read_exact(buf)
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        (**self).read_byte()
    }

    fn close_handle(&self) -> CloseHandle {
        (**self).close_handle()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// 传输打开器
///
/// 保存连接参数，每次 `start()` 时打开一个新的 [`ByteSource`]。
pub trait TransportOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn ByteSource>, TransportError>;

    fn describe(&self) -> String;
}

impl<F> TransportOpener for F
where
    F: Fn() -> Result<Box<dyn ByteSource>, TransportError> + Send + Sync,
{
    fn open(&self) -> Result<Box<dyn ByteSource>, TransportError> {
        self()
    }

    fn describe(&self) -> String {
        "custom transport".to_string()
    }
}
