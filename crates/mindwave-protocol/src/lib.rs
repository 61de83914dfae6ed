//! # MindWave Protocol
//!
//! ThinkGear 串行数据流协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量定义
//! - `ids`: 字段码（Field Code）定义
//! - `packet`: 原始数据包与校验和
//! - `framer`: 帧同步状态机（从字节流中切分数据包）
//! - `field`: 传感器字段类型
//! - `decoder`: 负载解码与编码
//!
//! ## 数据流
//!
//! ```text
//! 字节流 ──► Framer ──► RawPacket ──► verify() ──► decode_payload() ──► SensorField
//! ```
//!
//! ## 字节序
//!
//! 原始 EEG 数值（0x80）使用大端字节序（高位在前）。

pub mod constants;
pub mod decoder;
pub mod field;
pub mod framer;
pub mod ids;
pub mod packet;

// 重新导出常用类型
pub use constants::*;
pub use decoder::{DecodedFields, PayloadBuilder, decode_payload};
pub use field::{SensorField, SensorKind};
pub use framer::{Framer, FramerState};
pub use ids::FieldCode;
pub use packet::{RawPacket, checksum, encode_packet};

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 校验和不匹配（数据包被丢弃，不影响后续解析）
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// 负载格式错误：字段声明的数据超出负载边界
    #[error("Malformed payload: field code 0x{code:02X} at offset {offset} runs past payload end")]
    Malformed { code: u8, offset: usize },

    /// 未知的字段名称
    #[error("Unknown sensor field: {0}")]
    UnknownField(String),

    /// 负载超过 LENGTH 字节可表示的范围
    #[error("Payload too long: {len} bytes (max 255)")]
    PayloadTooLong { len: usize },
}

/// 大端字节序转 u16
pub fn bytes_to_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// 原始 EEG 数值的有符号转换
///
/// 设备以无符号 16 位发送，超过 32767 的值按二进制补码解释（减去 65536）。
pub fn raw_to_signed(value: u16) -> i16 {
    if value > i16::MAX as u16 {
        (value as i32 - 65536) as i16
    } else {
        value as i16
    }
}
