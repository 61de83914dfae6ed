//! 驱动层错误类型定义

use mindwave_protocol::ProtocolError;
use mindwave_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误（打开失败，或读线程因传输错误退出）
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议错误（例如未知的字段名称）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 读线程已在运行
    #[error("Reader already running")]
    AlreadyRunning,

    /// 构建时未指定传输
    #[error("No transport configured. Call `serial()`, `tcp()`, `replay()` or `transport()` first")]
    NoTransport,

    /// 读线程错误（创建失败、panic、join 超时）
    #[error("Reader thread error: {0}")]
    ReaderThread(String),
}
