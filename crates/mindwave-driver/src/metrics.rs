//! 读线程性能指标
//!
//! 提供零开销的原子计数器，用于监控数据流的健康状态。
//! 所有计数器都使用原子操作，可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 读线程实时指标
///
/// # 使用示例
///
/// ```rust
/// use mindwave_driver::HeadsetMetrics;
/// use std::sync::Arc;
/// use std::sync::atomic::Ordering;
///
/// let metrics = Arc::new(HeadsetMetrics::default());
///
/// // 在读线程中更新指标
/// metrics.packets_total.fetch_add(1, Ordering::Relaxed);
///
/// // 在主线程中读取快照
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.packets_total, 1);
/// ```
#[derive(Debug, Default)]
pub struct HeadsetMetrics {
    /// 帧同步得到的数据包总数
    pub packets_total: AtomicU64,

    /// 通过校验并成功解码的数据包数
    pub packets_valid: AtomicU64,

    /// 校验和不匹配的数据包数
    pub checksum_mismatches: AtomicU64,

    /// 负载格式错误的数据包数
    pub malformed_packets: AtomicU64,

    /// 寻找同步标记时跳过的字节数
    pub bytes_discarded: AtomicU64,

    /// 已应用的字段数
    pub fields_decoded: AtomicU64,

    /// 观察者 panic 次数
    pub observer_failures: AtomicU64,

    /// 导致读线程退出的传输错误次数
    pub transport_errors: AtomicU64,
}

impl HeadsetMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    ///
    /// 不同计数器之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_total: self.packets_total.load(Ordering::Relaxed),
            packets_valid: self.packets_valid.load(Ordering::Relaxed),
            checksum_mismatches: self.checksum_mismatches.load(Ordering::Relaxed),
            malformed_packets: self.malformed_packets.load(Ordering::Relaxed),
            bytes_discarded: self.bytes_discarded.load(Ordering::Relaxed),
            fields_decoded: self.fields_decoded.load(Ordering::Relaxed),
            observer_failures: self.observer_failures.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.packets_total.store(0, Ordering::Relaxed);
        self.packets_valid.store(0, Ordering::Relaxed);
        self.checksum_mismatches.store(0, Ordering::Relaxed);
        self.malformed_packets.store(0, Ordering::Relaxed);
        self.bytes_discarded.store(0, Ordering::Relaxed);
        self.fields_decoded.store(0, Ordering::Relaxed);
        self.observer_failures.store(0, Ordering::Relaxed);
        self.transport_errors.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_total: u64,
    pub packets_valid: u64,
    pub checksum_mismatches: u64,
    pub malformed_packets: u64,
    pub bytes_discarded: u64,
    pub fields_decoded: u64,
    pub observer_failures: u64,
    pub transport_errors: u64,
}

impl MetricsSnapshot {
    /// 有效数据包比例（百分比）
    ///
    /// `packets_total` 为 0 时返回 0.0。
    pub fn valid_packet_rate(&self) -> f64 {
        if self.packets_total == 0 {
            return 0.0;
        }
        (self.packets_valid as f64 / self.packets_total as f64) * 100.0
    }

    /// 被拒绝的数据包数（校验失败 + 格式错误）
    pub fn rejected_packets(&self) -> u64 {
        self.checksum_mismatches + self.malformed_packets
    }
}
