//! 传感器字段类型

use crate::ProtocolError;
use crate::ids::FieldCode;
use std::fmt;
use std::str::FromStr;

/// 传感器字段种类（用于回调注册和按名称查询）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    PoorSignal,
    BlinkStrength,
    RawValue,
    Attention,
    Meditation,
}

impl SensorKind {
    /// 字段种类数量
    pub const COUNT: usize = 5;

    /// 所有字段种类（按 `index()` 排列）
    pub const ALL: [SensorKind; Self::COUNT] = [
        SensorKind::PoorSignal,
        SensorKind::BlinkStrength,
        SensorKind::RawValue,
        SensorKind::Attention,
        SensorKind::Meditation,
    ];

    /// 稳定的字段名称
    pub const fn name(self) -> &'static str {
        match self {
            SensorKind::PoorSignal => "poorSignal",
            SensorKind::BlinkStrength => "blinkStrength",
            SensorKind::RawValue => "rawValue",
            SensorKind::Attention => "attention",
            SensorKind::Meditation => "meditation",
        }
    }

    /// 数组下标（用于定长表）
    pub const fn index(self) -> usize {
        match self {
            SensorKind::PoorSignal => 0,
            SensorKind::BlinkStrength => 1,
            SensorKind::RawValue => 2,
            SensorKind::Attention => 3,
            SensorKind::Meditation => 4,
        }
    }

    /// 对应的线上字段码
    pub const fn code(self) -> FieldCode {
        match self {
            SensorKind::PoorSignal => FieldCode::PoorSignal,
            SensorKind::BlinkStrength => FieldCode::BlinkStrength,
            SensorKind::RawValue => FieldCode::RawValue,
            SensorKind::Attention => FieldCode::Attention,
            SensorKind::Meditation => FieldCode::Meditation,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorKind {
    type Err = ProtocolError;

    /// 按名称解析，同时接受 camelCase 与 snake_case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "poorSignal" | "poor_signal" => Ok(SensorKind::PoorSignal),
            "blinkStrength" | "blink_strength" => Ok(SensorKind::BlinkStrength),
            "rawValue" | "raw_value" => Ok(SensorKind::RawValue),
            "attention" => Ok(SensorKind::Attention),
            "meditation" => Ok(SensorKind::Meditation),
            other => Err(ProtocolError::UnknownField(other.to_string())),
        }
    }
}

/// 解码后的单个传感器字段
///
/// 每个数据包可产生零个或多个字段，生命周期仅限一次解码周期。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorField {
    /// 信号质量（0 最好，200 表示未接触，原样透传）
    PoorSignal(u8),
    /// 眨眼强度
    BlinkStrength(u8),
    /// 原始 EEG 数值（有符号 16 位）
    RawValue(i16),
    /// 专注度
    Attention(u8),
    /// 冥想度
    Meditation(u8),
}

impl SensorField {
    /// 字段种类
    pub const fn kind(&self) -> SensorKind {
        match self {
            SensorField::PoorSignal(_) => SensorKind::PoorSignal,
            SensorField::BlinkStrength(_) => SensorKind::BlinkStrength,
            SensorField::RawValue(_) => SensorKind::RawValue,
            SensorField::Attention(_) => SensorKind::Attention,
            SensorField::Meditation(_) => SensorKind::Meditation,
        }
    }

    /// 统一的整数值视图
    pub const fn value(&self) -> i32 {
        match *self {
            SensorField::PoorSignal(v)
            | SensorField::BlinkStrength(v)
            | SensorField::Attention(v)
            | SensorField::Meditation(v) => v as i32,
            SensorField::RawValue(v) => v as i32,
        }
    }
}

impl fmt::Display for SensorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind(), self.value())
    }
}
