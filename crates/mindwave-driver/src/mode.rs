//! 读线程状态
//!
//! `Stopped → Running → Stopping → Stopped`；传输错误使读线程直接回到 `Stopped`。

use std::sync::atomic::{AtomicU8, Ordering};

/// 读线程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ReaderState {
    /// 未运行（默认）
    #[default]
    Stopped = 0,
    /// 读线程运行中
    Running = 1,
    /// 已请求停止，等待读线程退出
    Stopping = 2,
}

impl ReaderState {
    /// 从 u8 转换，无效值视为 `Stopped`
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

/// 读线程状态（原子版本，用于线程间共享）
#[derive(Debug, Default)]
pub struct AtomicReaderState {
    inner: AtomicU8,
}

impl AtomicReaderState {
    pub fn new(state: ReaderState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> ReaderState {
        ReaderState::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, state: ReaderState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }

    /// 比较并交换
    ///
    /// 成功返回 `Ok(旧状态)`，失败返回 `Err(当前状态)`。
    pub fn compare_exchange(
        &self,
        current: ReaderState,
        new: ReaderState,
        success: Ordering,
        failure: Ordering,
    ) -> Result<ReaderState, ReaderState> {
        self.inner
            .compare_exchange(current.as_u8(), new.as_u8(), success, failure)
            .map(ReaderState::from_u8)
            .map_err(ReaderState::from_u8)
    }
}
