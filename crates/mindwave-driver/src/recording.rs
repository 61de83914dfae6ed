//! 基于通道的观察者
//!
//! 观察者在读线程上同步执行。[`ChannelObserver`] 只做一次 `try_send`，
//! 把更新转发给其他线程处理；通道满时丢弃并计数，不会阻塞读线程。
//!
//! # 使用示例
//!
//! ```rust
//! use mindwave_driver::hooks::{CallbackRegistry, SensorObserver};
//! use mindwave_driver::recording::ChannelObserver;
//! use mindwave_protocol::{SensorField, SensorKind};
//! use std::sync::Arc;
//!
//! let (observer, rx) = ChannelObserver::new(1024);
//! let observer = Arc::new(observer);
//!
//! let registry = CallbackRegistry::new();
//! registry.set(SensorKind::RawValue, observer.clone());
//! registry.set(SensorKind::PoorSignal, observer.clone());
//!
//! registry.dispatch(SensorField::RawValue(12));
//! assert_eq!(rx.try_recv().unwrap().field, SensorField::RawValue(12));
//! ```

use crate::hooks::SensorObserver;
use crossbeam_channel::{Receiver, Sender, bounded};
use mindwave_protocol::SensorField;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// 转发到通道的字段更新
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorUpdate {
    pub field: SensorField,
    /// 分发时刻
    pub received_at: Instant,
}

/// 通道观察者（有界队列，满时丢弃）
pub struct ChannelObserver {
    tx: Sender<SensorUpdate>,
    delivered: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl ChannelObserver {
    /// 创建观察者与接收端
    ///
    /// 512 Hz 原始数据下，`capacity = 512` 约可缓冲 1 秒。
    #[must_use]
    pub fn new(capacity: usize) -> (Self, Receiver<SensorUpdate>) {
        let (tx, rx) = bounded(capacity);
        let observer = Self {
            tx,
            delivered: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (observer, rx)
    }

    /// 成功转发的更新数
    pub fn delivered(&self) -> &Arc<AtomicU64> {
        &self.delivered
    }

    /// 因队列满或接收端关闭而丢弃的更新数
    pub fn dropped(&self) -> &Arc<AtomicU64> {
        &self.dropped
    }
}

impl SensorObserver for ChannelObserver {
    fn on_update(&self, field: SensorField) {
        let update = SensorUpdate {
            field,
            received_at: Instant::now(),
        };
        if self.tx.try_send(update).is_ok() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwards_updates_in_order() {
        let (observer, rx) = ChannelObserver::new(8);
        observer.on_update(SensorField::RawValue(1));
        observer.on_update(SensorField::RawValue(2));

        let fields: Vec<_> = rx.try_iter().map(|u| u.field).collect();
        assert_eq!(fields, vec![SensorField::RawValue(1), SensorField::RawValue(2)]);
        assert_eq!(observer.delivered().load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_drops_when_full() {
        let (observer, rx) = ChannelObserver::new(2);
        for i in 0..5 {
            observer.on_update(SensorField::RawValue(i));
        }
        assert_eq!(observer.delivered().load(Ordering::Relaxed), 2);
        assert_eq!(observer.dropped().load(Ordering::Relaxed), 3);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn test_drops_after_receiver_gone() {
        let (observer, rx) = ChannelObserver::new(2);
        drop(rx);
        observer.on_update(SensorField::Attention(50));
        assert_eq!(observer.dropped().load(Ordering::Relaxed), 1);
    }
}
