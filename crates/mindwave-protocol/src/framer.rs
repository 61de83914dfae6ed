//! 帧同步状态机
//!
//! 从无结构的字节流中定位数据包边界，每完成一个包产出一个 [`RawPacket`]。
//!
//! # 状态转换
//!
//! ```text
//! SeekSync ──(AA AA)──► ReadLength ──(L)──► ReadPayload ──(L 字节)──► ReadChecksum ──► SeekSync
//!                                    └──(L = 0)──────────────────────────┘
//! ```
//!
//! - `SeekSync` 使用大小为 2 的滑动窗口：单个 `0xAA` 后跟非同步字节时不前进，
//!   因此可以从任意前导垃圾数据中自动重新同步
//! - 越过 `SeekSync` 后，长度与负载字节数按原样信任，不回溯
//! - 传输中断时调用 [`Framer::reset`]，下次从 `SeekSync` 重新开始
//!
//! 状态机本身不做 IO，由调用方逐字节喂入（见 `mindwave-driver` 的 `PacketReader`）。

use crate::constants::SYNC_BYTE;
use crate::packet::RawPacket;

/// 帧同步状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// 寻找同步标记；`saw_sync` 表示上一个字节是同步字节
    SeekSync { saw_sync: bool },
    /// 读取长度字节
    ReadLength,
    /// 读取负载，`remaining` 为剩余字节数
    ReadPayload { remaining: usize },
    /// 读取校验和字节
    ReadChecksum,
}

impl Default for FramerState {
    fn default() -> Self {
        FramerState::SeekSync { saw_sync: false }
    }
}

/// 帧同步器
///
/// # Example
///
/// ```
/// use mindwave_protocol::{Framer, RawPacket};
///
/// let mut framer = Framer::new();
/// let stream = [0x00, 0x13, 0xAA, 0xAA, 0x02, 0x02, 0xC8, 0x35];
///
/// let packets = framer.feed(&stream);
/// assert_eq!(packets, vec![RawPacket::new(vec![0x02, 0xC8], 0x35)]);
/// ```
#[derive(Debug, Default)]
pub struct Framer {
    state: FramerState,
    payload: Vec<u8>,
    /// 寻找同步期间丢弃的字节数（自上次 `take_discarded` 起）
    discarded: u64,
}

impl Framer {
    /// 创建新的帧同步器（初始状态 `SeekSync`）
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前状态
    pub fn state(&self) -> FramerState {
        self.state
    }

    /// 回到 `SeekSync`，丢弃未完成的负载
    pub fn reset(&mut self) {
        self.state = FramerState::default();
        self.payload.clear();
    }

    /// 不跨越状态边界时可以一次读取的字节数
    ///
    /// 负载阶段返回剩余负载长度，其余阶段返回 1。
    /// 按此数量读取可以保证只有最后一个字节可能完成数据包。
    pub fn bytes_needed(&self) -> usize {
        match self.state {
            FramerState::ReadPayload { remaining } => remaining.max(1),
            _ => 1,
        }
    }

    /// 取出并清零丢弃字节计数
    pub fn take_discarded(&mut self) -> u64 {
        std::mem::take(&mut self.discarded)
    }

    /// 喂入一个字节，完成数据包时返回 `Some`
    pub fn push(&mut self, byte: u8) -> Option<RawPacket> {
        match self.state {
            FramerState::SeekSync { saw_sync } => {
                if byte == SYNC_BYTE {
                    if saw_sync {
                        self.state = FramerState::ReadLength;
                    } else {
                        self.state = FramerState::SeekSync { saw_sync: true };
                    }
                } else {
                    // 单个同步字节后跟非同步字节：窗口滑动，两个字节都不构成同步
                    self.discarded += if saw_sync { 2 } else { 1 };
                    self.state = FramerState::SeekSync { saw_sync: false };
                }
                None
            },
            FramerState::ReadLength => {
                let len = byte as usize;
                self.payload.clear();
                self.payload.reserve(len);
                self.state = if len == 0 {
                    FramerState::ReadChecksum
                } else {
                    FramerState::ReadPayload { remaining: len }
                };
                None
            },
            FramerState::ReadPayload { remaining } => {
                self.payload.push(byte);
                self.state = if remaining > 1 {
                    FramerState::ReadPayload {
                        remaining: remaining - 1,
                    }
                } else {
                    FramerState::ReadChecksum
                };
                None
            },
            FramerState::ReadChecksum => {
                self.state = FramerState::default();
                let payload = std::mem::take(&mut self.payload);
                Some(RawPacket::new(payload, byte))
            },
        }
    }

    /// 批量喂入字节，返回期间完成的所有数据包
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<RawPacket> {
        bytes.iter().filter_map(|b| self.push(*b)).collect()
    }
}
