//! 时间戳转换

use std::time::{SystemTime, UNIX_EPOCH};

/// `SystemTime` 转 Unix 微秒时间戳（早于 1970 年的时间视为 0）
pub fn unix_micros(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}
