//! 读线程主循环
//!
//! 负责后台读线程的数据包接收、校验、解码和状态更新逻辑。
//!
//! # 错误策略
//!
//! - 校验和不匹配、负载格式错误：单包丢弃，计数后继续
//! - 观察者 panic：已在分发时隔离，计数后继续
//! - 传输错误：若已请求停止则正常退出，否则记录并以错误退出

use crate::framing::PacketReader;
use crate::hooks::DispatchOutcome;
use crate::metrics::HeadsetMetrics;
use crate::state::HeadsetContext;
use mindwave_protocol::constants::RAW_SAMPLE_RATE_HZ;
use mindwave_protocol::{ProtocolError, RawPacket, decode_payload};
use mindwave_transport::{ByteSource, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 读线程配置
///
/// # Example
///
/// ```
/// use mindwave_driver::ReaderConfig;
/// use std::time::Duration;
///
/// let config = ReaderConfig::default();
/// assert_eq!(config.join_timeout, Duration::from_secs(2));
/// assert_eq!(config.sample_rate_hz, 512);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// `stop()` 等待读线程退出的最长时间
    pub join_timeout: Duration,
    /// 原始 EEG 采样率（写入历史导出）
    pub sample_rate_hz: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(2),
            sample_rate_hz: RAW_SAMPLE_RATE_HZ,
        }
    }
}

/// 处理一个数据包：校验 → 解码 → 逐字段更新状态并分发
///
/// 返回应用的字段数。校验或解码失败时不修改任何状态。
pub fn process_packet(
    packet: &RawPacket,
    ctx: &HeadsetContext,
    metrics: &HeadsetMetrics,
) -> Result<usize, ProtocolError> {
    metrics.packets_total.fetch_add(1, Ordering::Relaxed);

    if let Err(e) = packet.verify() {
        metrics.checksum_mismatches.fetch_add(1, Ordering::Relaxed);
        return Err(e);
    }

    let fields = match decode_payload(&packet.payload) {
        Ok(fields) => fields,
        Err(e) => {
            metrics.malformed_packets.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        },
    };
    metrics.packets_valid.fetch_add(1, Ordering::Relaxed);

    for field in &fields {
        ctx.apply_field(*field);
        metrics.fields_decoded.fetch_add(1, Ordering::Relaxed);

        if ctx.callbacks.dispatch(*field) == DispatchOutcome::Panicked {
            metrics.observer_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    Ok(fields.len())
}

/// 读线程主循环
///
/// `is_running` 被清除后，下一次传输错误（通常是 `close()` 引发的 `Closed`）
/// 被视为正常退出。
pub fn reader_loop<S: ByteSource>(
    mut reader: PacketReader<S>,
    ctx: Arc<HeadsetContext>,
    is_running: Arc<AtomicBool>,
    metrics: Arc<HeadsetMetrics>,
) -> Result<(), TransportError> {
    info!("Reader thread started on {}", reader.describe());

    loop {
        // Acquire: 看到 false 时必须同时看到 stop() 之前的写入
        if !is_running.load(Ordering::Acquire) {
            trace!("Reader thread: is_running flag is false, exiting");
            return Ok(());
        }

        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(e) => {
                if !is_running.load(Ordering::Acquire) {
                    trace!("Reader thread: transport ended during stop ({})", e);
                    return Ok(());
                }
                error!("Reader thread: transport error: {}", e);
                metrics.transport_errors.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            },
        };

        // 阻塞读取期间被请求停止：丢弃这个包，不再改动共享状态
        if !is_running.load(Ordering::Acquire) {
            trace!("Reader thread: stop requested during read, dropping packet");
            return Ok(());
        }

        let discarded = reader.take_discarded();
        if discarded > 0 {
            metrics.bytes_discarded.fetch_add(discarded, Ordering::Relaxed);
            trace!("Skipped {} bytes while seeking sync", discarded);
        }

        match process_packet(&packet, &ctx, &metrics) {
            Ok(_) => {},
            Err(e @ ProtocolError::ChecksumMismatch { .. }) => {
                debug!("Dropping packet (len={}): {}", packet.len(), e);
            },
            Err(e) => {
                warn!("Dropping packet (len={}): {}", packet.len(), e);
            },
        }
    }
}
