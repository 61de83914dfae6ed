//! 驱动层模块
//!
//! 本模块提供 MindWave 头戴设备的驱动功能，包括：
//! - 读线程管理（`start` / `stop`，可 join 的生命周期）
//! - 状态同步（ArcSwap 无锁读取最新值，RwLock 保护历史记录）
//! - 帧同步、校验与解码流水线
//! - 观察者回调（每个字段至多一个，替换与分发互斥）
//! - 原子性能指标

mod builder;
mod error;
pub mod framing;
mod headset;
pub mod hooks;
pub mod metrics;
pub mod mode;
pub mod pipeline;
pub mod recording;
pub mod state;

pub use builder::HeadsetBuilder;
pub use error::DriverError;
pub use framing::PacketReader;
pub use headset::Headset;
pub use hooks::{CallbackRegistry, DispatchOutcome, SensorObserver};
pub use metrics::{HeadsetMetrics, MetricsSnapshot};
pub use mode::{AtomicReaderState, ReaderState};
pub use pipeline::{ReaderConfig, process_packet, reader_loop};
pub use recording::{ChannelObserver, SensorUpdate};
pub use state::*;
