//! 协议常量定义

/// 同步字节（数据包以两个连续的同步字节开头）
pub const SYNC_BYTE: u8 = 0xAA;

/// 同步标记长度（字节）
pub const SYNC_LEN: usize = 2;

/// 负载最大长度（长度字段为 1 字节无符号数）
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// 原始 EEG 数值字段声明的数据长度
pub const RAW_VALUE_LEN: u8 = 2;

/// 原始 EEG 采样率（Hz）
pub const RAW_SAMPLE_RATE_HZ: u32 = 512;

/// MindWave 串口默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// 信号质量：200 表示传感器未接触皮肤
pub const POOR_SIGNAL_NO_CONTACT: u8 = 200;
