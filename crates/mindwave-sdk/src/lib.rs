//! MindWave SDK - NeuroSky MindWave 脑电头戴设备 Rust SDK
//!
//! 解析 ThinkGear 串行数据流，提供信号质量、眨眼强度、原始 EEG、
//! 专注度与冥想度的最新值、按字段的观察者回调，以及可导出的原始 EEG 历史。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 帧同步、校验和、负载解码
//! - **传输层** (`transport`): 串口、TCP、文件回放与进程内通道
//! - **驱动层** (`driver`): 读线程管理、状态同步、观察者分发
//! - **工具层** (`tools`): 录制文件格式与 CSV 导出
//!
//! # 快速开始
//!
//! ```no_run
//! use mindwave_sdk::prelude::*;
//!
//! mindwave_sdk::init_logger("mindwave_sdk=info");
//!
//! let headset = HeadsetBuilder::new().serial("/dev/rfcomm0").build().unwrap();
//! headset.set_callback(SensorKind::Attention, |field: SensorField| {
//!     println!("attention: {}", field.value());
//! });
//! headset.start().unwrap();
//! ```

pub use mindwave_driver as driver;
pub use mindwave_protocol as protocol;
pub use mindwave_tools as tools;
pub use mindwave_transport as transport;

pub mod export;
pub mod logging;
pub mod prelude;

// --- 用户以此为界 ---
// 以下是通过 Facade Pattern 提供的公共 API

pub use mindwave_protocol::{ProtocolError, SensorField, SensorKind};
pub use mindwave_transport::{ByteSource, TransportError, TransportOpener};

pub use mindwave_driver::{
    DriverError, Headset, HeadsetBuilder, HistoryExport, MetricsSnapshot, ReaderConfig,
    ReaderState, SensorReadings,
};

pub use mindwave_tools::{EegRecording, RecordingMetadata};

pub use export::recording_from_history;
pub use logging::{init_logger, try_init_logger};
