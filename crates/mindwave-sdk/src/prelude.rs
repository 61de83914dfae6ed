//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use mindwave_sdk::prelude::*;
//! ```

// 驱动层
pub use crate::driver::{Headset, HeadsetBuilder, ReaderState, SensorObserver};

// 协议层
pub use crate::protocol::{SensorField, SensorKind};

// 传输层（常用 Trait）
pub use crate::transport::{ByteSource, TransportOpener};

// 录制
pub use crate::export::recording_from_history;
pub use crate::tools::EegRecording;

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::transport::TransportError;
