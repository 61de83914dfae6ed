//! 观察者回调（Callback Registry）
//!
//! 每个 [`SensorKind`] 至多注册一个观察者，重复注册会替换旧观察者。
//!
//! # 并发约定
//!
//! - 注册/替换在写锁内交换 `Arc`
//! - 分发时只在读锁内克隆 `Arc`，回调在锁外执行
//! - 因此替换与分发互斥：每次更新只会调用旧观察者或新观察者之一，且恰好一次；
//!   回调内部再次注册观察者也不会死锁
//!
//! 观察者在读线程上同步执行，应尽快返回。需要较重处理时，
//! 使用 [`ChannelObserver`](crate::recording::ChannelObserver) 转发到其他线程。
//!
//! # 使用示例
//!
//! ```rust
//! use mindwave_driver::hooks::{CallbackRegistry, DispatchOutcome};
//! use mindwave_protocol::{SensorField, SensorKind};
//! use std::sync::Arc;
//!
//! let registry = CallbackRegistry::new();
//! registry.set(
//!     SensorKind::BlinkStrength,
//!     Arc::new(|field: SensorField| println!("blink: {field}")),
//! );
//!
//! let outcome = registry.dispatch(SensorField::BlinkStrength(90));
//! assert_eq!(outcome, DispatchOutcome::Delivered);
//! ```

use mindwave_protocol::{SensorField, SensorKind};
use parking_lot::RwLock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::error;

/// 传感器观察者
///
/// 闭包 `Fn(SensorField)` 自动实现此 trait。
pub trait SensorObserver: Send + Sync {
    /// 字段更新后调用（读线程上，状态已写入）
    fn on_update(&self, field: SensorField);
}

impl<F> SensorObserver for F
where
    F: Fn(SensorField) + Send + Sync,
{
    fn on_update(&self, field: SensorField) {
        self(field)
    }
}

/// 单次分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 该字段未注册观察者
    NoObserver,
    /// 观察者正常返回
    Delivered,
    /// 观察者 panic（已捕获，状态不回滚）
    Panicked,
}

type ObserverSlot = Option<Arc<dyn SensorObserver>>;

/// 观察者注册表
#[derive(Default)]
pub struct CallbackRegistry {
    slots: RwLock<[ObserverSlot; SensorKind::COUNT]>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册观察者，返回被替换的旧观察者
    pub fn set(
        &self,
        kind: SensorKind,
        observer: Arc<dyn SensorObserver>,
    ) -> Option<Arc<dyn SensorObserver>> {
        self.slots.write()[kind.index()].replace(observer)
    }

    /// 移除观察者
    pub fn clear(&self, kind: SensorKind) -> Option<Arc<dyn SensorObserver>> {
        self.slots.write()[kind.index()].take()
    }

    /// 移除所有观察者
    pub fn clear_all(&self) {
        let mut slots = self.slots.write();
        for slot in slots.iter_mut() {
            *slot = None;
        }
    }

    /// 当前观察者
    pub fn get(&self, kind: SensorKind) -> Option<Arc<dyn SensorObserver>> {
        self.slots.read()[kind.index()].clone()
    }

    pub fn is_registered(&self, kind: SensorKind) -> bool {
        self.slots.read()[kind.index()].is_some()
    }

    /// 分发字段更新
    ///
    /// 观察者 panic 会被捕获并记录日志，不会传播到读线程。
    pub fn dispatch(&self, field: SensorField) -> DispatchOutcome {
        let kind = field.kind();
        let Some(observer) = self.get(kind) else {
            return DispatchOutcome::NoObserver;
        };

        match catch_unwind(AssertUnwindSafe(|| observer.on_update(field))) {
            Ok(()) => DispatchOutcome::Delivered,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!("Observer for {} panicked: {}", kind, message);
                DispatchOutcome::Panicked
            },
        }
    }
}
