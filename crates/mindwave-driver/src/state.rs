//! 传感器状态
//!
//! - 最新值：[`SensorReadings`] 不可变快照，通过 `ArcSwap` 发布，读取无锁
//! - 历史记录：[`HistoryState`] 由 `parking_lot::RwLock` 保护，
//!   "检查 logging 标志 + 追加样本" 在同一把写锁内完成
//!
//! 只有读线程写入最新值快照；控制线程只读取快照、切换 logging、标记刺激。

use crate::hooks::CallbackRegistry;
use arc_swap::ArcSwap;
use mindwave_protocol::{SensorField, SensorKind};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::SystemTime;

/// 各字段的最新值（不可变快照）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorReadings {
    pub poor_signal: u8,
    pub blink_strength: u8,
    pub raw_value: i16,
    pub attention: u8,
    pub meditation: u8,
    /// 累计应用的字段更新次数
    pub updates: u64,
}

impl SensorReadings {
    /// 按字段种类读取
    pub fn get(&self, kind: SensorKind) -> SensorField {
        match kind {
            SensorKind::PoorSignal => SensorField::PoorSignal(self.poor_signal),
            SensorKind::BlinkStrength => SensorField::BlinkStrength(self.blink_strength),
            SensorKind::RawValue => SensorField::RawValue(self.raw_value),
            SensorKind::Attention => SensorField::Attention(self.attention),
            SensorKind::Meditation => SensorField::Meditation(self.meditation),
        }
    }

    /// 覆盖对应字段
    pub fn apply(&mut self, field: SensorField) {
        match field {
            SensorField::PoorSignal(v) => self.poor_signal = v,
            SensorField::BlinkStrength(v) => self.blink_strength = v,
            SensorField::RawValue(v) => self.raw_value = v,
            SensorField::Attention(v) => self.attention = v,
            SensorField::Meditation(v) => self.meditation = v,
        }
        self.updates += 1;
    }
}

/// 外部刺激标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StimulusMark {
    /// 标记时间
    pub timestamp: SystemTime,
    /// 标记时 `raw_history` 的长度，用于与采样点对齐
    pub sample_index: usize,
    pub value: i32,
}

/// 历史记录（仅在 logging 开启时增长）
#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    pub logging_enabled: bool,
    pub logging_started_at: Option<SystemTime>,
    pub logging_stopped_at: Option<SystemTime>,
    pub raw_history: Vec<i16>,
    pub stimulus_log: Vec<StimulusMark>,
}

impl HistoryState {
    /// 切换 logging，返回状态是否发生变化
    ///
    /// 相同值的切换不修改任何时间戳。
    pub fn set_logging(&mut self, enabled: bool, now: SystemTime) -> bool {
        if self.logging_enabled == enabled {
            return false;
        }
        self.logging_enabled = enabled;
        if enabled {
            self.logging_started_at = Some(now);
        } else {
            self.logging_stopped_at = Some(now);
        }
        true
    }

    /// 追加原始样本（logging 关闭时忽略）
    pub fn push_raw(&mut self, value: i16) -> bool {
        if self.logging_enabled {
            self.raw_history.push(value);
        }
        self.logging_enabled
    }

    /// 追加刺激标记（logging 关闭时忽略）
    pub fn push_stimulus(&mut self, value: i32, now: SystemTime) -> bool {
        if self.logging_enabled {
            self.stimulus_log.push(StimulusMark {
                timestamp: now,
                sample_index: self.raw_history.len(),
                value,
            });
        }
        self.logging_enabled
    }

    /// 清空两个缓冲区（不改变 logging 状态与时间戳）
    pub fn clear(&mut self) {
        self.raw_history.clear();
        self.stimulus_log.clear();
    }
}

/// 历史导出（交给外部分析工具的纯数据）
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryExport {
    pub raw_history: Vec<i16>,
    pub stimulus_log: Vec<StimulusMark>,
    pub sample_rate_hz: u32,
    pub logging_started_at: Option<SystemTime>,
    pub logging_stopped_at: Option<SystemTime>,
}

/// 共享上下文（读线程与控制线程之间）
#[derive(Default)]
pub struct HeadsetContext {
    /// 最新值快照（单写者：读线程）
    pub readings: ArcSwap<SensorReadings>,
    /// 历史记录
    pub history: RwLock<HistoryState>,
    /// 观察者注册表
    pub callbacks: CallbackRegistry,
}

impl HeadsetContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用一个解码字段：发布新快照，必要时追加历史
    ///
    /// 只能在读线程调用；观察者分发由调用方在此之后完成。
    pub fn apply_field(&self, field: SensorField) {
        let mut next = **self.readings.load();
        next.apply(field);
        self.readings.store(Arc::new(next));

        if let SensorField::RawValue(value) = field {
            self.history.write().push_raw(value);
        }
    }

    /// 导出历史（克隆）
    pub fn export_history(&self, sample_rate_hz: u32) -> HistoryExport {
        let history = self.history.read();
        HistoryExport {
            raw_history: history.raw_history.clone(),
            stimulus_log: history.stimulus_log.clone(),
            sample_rate_hz,
            logging_started_at: history.logging_started_at,
            logging_stopped_at: history.logging_stopped_at,
        }
    }
}
