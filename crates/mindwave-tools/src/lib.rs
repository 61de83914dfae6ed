//! # MindWave Tools - 共享数据结构
//!
//! **依赖原则**: 只依赖 `mindwave-protocol`，不依赖驱动层（无硬件依赖）
//!
//! ## 包含模块
//!
//! - `recording` - 录制格式定义（原始 EEG 通道 + 刺激通道）
//! - `timestamp` - 时间戳转换

pub mod recording;
pub mod timestamp;

pub use recording::{
    EEG_CHANNEL, EegRecording, MAGIC, RecordingMetadata, STIM_CHANNEL, StimulusEvent,
};
pub use timestamp::unix_micros;
