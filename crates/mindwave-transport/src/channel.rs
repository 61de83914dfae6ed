//! 进程内通道传输
//!
//! [`ChannelFeeder`] 在任意线程推送字节块，[`ChannelOpener`] 每次打开时
//! 克隆接收端。读取使用 `recv_timeout` 轮询关闭标志；
//! 所有 `ChannelFeeder` 释放后读取返回 [`TransportError::Disconnected`]。

use crate::{ByteSource, CloseHandle, TransportError, TransportOpener};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded, unbounded};
use std::time::Duration;

/// 默认轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 创建通道传输
///
/// `capacity` 为 `None` 时使用无界通道。
pub fn channel(capacity: Option<usize>) -> (ChannelFeeder, ChannelOpener) {
    let (tx, rx) = match capacity {
        Some(cap) => bounded(cap),
        None => unbounded(),
    };
    (
        ChannelFeeder { tx },
        ChannelOpener {
            rx,
            poll_interval: POLL_INTERVAL,
        },
    )
}

/// 发送端
#[derive(Debug, Clone)]
pub struct ChannelFeeder {
    tx: Sender<Vec<u8>>,
}

impl ChannelFeeder {
    /// 推送字节块（有界通道满时阻塞）
    pub fn send(&self, bytes: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.tx
            .send(bytes.into())
            .map_err(|_| TransportError::Disconnected)
    }

    /// 非阻塞推送，通道满时返回 `false`
    pub fn try_send(&self, bytes: impl Into<Vec<u8>>) -> Result<bool, TransportError> {
        match self.tx.try_send(bytes.into()) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(TransportError::Disconnected),
        }
    }

    /// 尚未被读取的字节块数量
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// 接收端打开器
#[derive(Debug, Clone)]
pub struct ChannelOpener {
    rx: Receiver<Vec<u8>>,
    poll_interval: Duration,
}

impl ChannelOpener {
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl TransportOpener for ChannelOpener {
    fn open(&self) -> Result<Box<dyn ByteSource>, TransportError> {
        Ok(Box::new(ChannelSource {
            rx: self.rx.clone(),
            buffer: Vec::new(),
            pos: 0,
            poll_interval: self.poll_interval,
            close: CloseHandle::new(),
        }))
    }

    fn describe(&self) -> String {
        "channel".to_string()
    }
}

/// 通道字节源
pub struct ChannelSource {
    rx: Receiver<Vec<u8>>,
    buffer: Vec<u8>,
    pos: usize,
    poll_interval: Duration,
    close: CloseHandle,
}

impl ByteSource for ChannelSource {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.close.is_closed() {
                return Err(TransportError::Closed);
            }
            if self.pos < self.buffer.len() {
                let n = (buf.len() - filled).min(self.buffer.len() - self.pos);
                buf[filled..filled + n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
                self.pos += n;
                filled += n;
                continue;
            }
            match self.rx.recv_timeout(self.poll_interval) {
                Ok(chunk) => {
                    self.buffer = chunk;
                    self.pos = 0;
                },
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Disconnected),
            }
        }
        Ok(())
    }

    fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    fn describe(&self) -> String {
        "channel".to_string()
    }
}
