//! 字段码定义
//!
//! ThinkGear 负载由若干 `[CODE][VALUE...]` 组成。
//! - `0x00..=0x7F`：单字节码
//! - `0x80..=0xFF`：扩展码，紧跟 1 字节长度

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 已识别的字段码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FieldCode {
    /// 信号质量（0 最好，200 表示未接触）
    PoorSignal = 0x02,
    /// 专注度（eSense，0-100）
    Attention = 0x04,
    /// 冥想度（eSense，0-100）
    Meditation = 0x05,
    /// 眨眼强度
    BlinkStrength = 0x16,
    /// 原始 EEG 数值（1 字节长度 + 2 字节大端数值）
    RawValue = 0x80,
}

impl FieldCode {
    /// 扩展码起始值
    pub const EXTENDED_START: u8 = 0x80;

    /// 判断字段码是否为扩展码（后跟长度字节）
    pub const fn is_extended(code: u8) -> bool {
        code >= Self::EXTENDED_START
    }
}
