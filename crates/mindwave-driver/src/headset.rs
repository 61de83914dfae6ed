//! Headset API 模块
//!
//! 提供对外的 `Headset` 结构体，封装读线程和状态同步细节。

use crate::error::DriverError;
use crate::framing::PacketReader;
use crate::hooks::SensorObserver;
use crate::metrics::{HeadsetMetrics, MetricsSnapshot};
use crate::mode::{AtomicReaderState, ReaderState};
use crate::pipeline::{ReaderConfig, reader_loop};
use crate::state::{HeadsetContext, HistoryExport, SensorReadings};
use arc_swap::ArcSwap;
use mindwave_protocol::{SensorField, SensorKind};
use mindwave_transport::{CloseHandle, TransportError, TransportOpener};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// join 轮询间隔
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// join 失败原因
enum JoinFailure<T> {
    /// 超时，句柄原样交还以便之后再次 join
    Timeout(JoinHandle<T>),
    Panicked,
}

/// Extension trait for timeout-capable thread joins
trait JoinTimeout<T>: Sized {
    fn join_timeout(self, timeout: Duration) -> Result<T, JoinFailure<T>>;
}

impl<T> JoinTimeout<T> for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> Result<T, JoinFailure<T>> {
        let deadline = Instant::now() + timeout;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                return Err(JoinFailure::Timeout(self));
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        self.join().map_err(|_| JoinFailure::Panicked)
    }
}

/// 一次 `start()` 创建的读线程
///
/// 运行标志和状态归这一次运行独有，旧线程只能修改自己的。
struct ReaderWorker {
    handle: JoinHandle<Result<(), TransportError>>,
    close: CloseHandle,
    running: Arc<AtomicBool>,
    state: Arc<AtomicReaderState>,
}

impl ReaderWorker {
    fn on_current_thread(&self) -> bool {
        self.handle.thread().id() == thread::current().id()
    }

    /// 请求停止：清除运行标志并关闭传输
    fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
        // 读线程可能已因传输错误退出并置为 Stopped
        let _ = self.state.compare_exchange(
            ReaderState::Running,
            ReaderState::Stopping,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.close.close();
    }
}

/// MindWave 头戴设备（对外 API）
///
/// 读线程由 `start()` 创建，由 `stop()` 或 `Drop` 关闭并 join。
/// 所有方法都只需要 `&self`，可以通过 `Arc<Headset>` 在多个线程间共享。
///
/// # Example
///
/// ```no_run
/// use mindwave_driver::HeadsetBuilder;
/// use mindwave_protocol::{SensorField, SensorKind};
///
/// let headset = HeadsetBuilder::new().serial("/dev/rfcomm0").build().unwrap();
/// headset.set_callback(SensorKind::BlinkStrength, |field: SensorField| {
///     println!("blink: {}", field.value());
/// });
/// headset.start().unwrap();
///
/// println!("signal quality: {}", headset.poor_signal());
/// headset.stop().unwrap();
/// ```
pub struct Headset {
    /// 传输打开器（每次 start 打开新连接）
    opener: Box<dyn TransportOpener>,
    /// 共享状态上下文
    ctx: Arc<HeadsetContext>,
    /// 性能指标
    metrics: Arc<HeadsetMetrics>,
    config: ReaderConfig,
    /// 当前运行的生命周期状态（每次 start 替换）
    state: ArcSwap<AtomicReaderState>,
    /// 读线程（锁只在取出/放回时持有，不跨 join）
    worker: Mutex<Option<ReaderWorker>>,
}

impl Headset {
    /// 使用给定传输和配置创建（不会立即打开传输）
    pub fn new(opener: impl TransportOpener + 'static, config: ReaderConfig) -> Self {
        Self::from_boxed(Box::new(opener), config)
    }

    pub(crate) fn from_boxed(opener: Box<dyn TransportOpener>, config: ReaderConfig) -> Self {
        Self {
            opener,
            ctx: Arc::new(HeadsetContext::new()),
            metrics: Arc::new(HeadsetMetrics::new()),
            config,
            state: ArcSwap::from_pointee(AtomicReaderState::new(ReaderState::Stopped)),
            worker: Mutex::new(None),
        }
    }

    /// 打开传输并启动读线程
    ///
    /// # 错误
    /// - `DriverError::AlreadyRunning`: 读线程已在运行
    /// - `DriverError::ReaderThread`: 上一个读线程仍未退出，或线程创建失败
    /// - `DriverError::Transport`: 传输打开失败
    pub fn start(&self) -> Result<(), DriverError> {
        let mut worker = self.worker.lock();

        match self.reader_state() {
            ReaderState::Running => return Err(DriverError::AlreadyRunning),
            ReaderState::Stopping => {
                return Err(DriverError::ReaderThread(
                    "previous reader is still shutting down".to_string(),
                ));
            },
            ReaderState::Stopped => {},
        }

        // Stopped 之后旧线程只剩返回，join 很快完成
        if let Some(previous) = worker.take() {
            if previous.on_current_thread() {
                *worker = Some(previous);
                return Err(DriverError::ReaderThread(
                    "cannot restart from the reader thread".to_string(),
                ));
            }
            let ReaderWorker {
                handle,
                close,
                running,
                state,
            } = previous;
            match handle.join_timeout(self.config.join_timeout) {
                Ok(Ok(())) => {},
                Ok(Err(e)) => debug!("Previous reader exited with: {}", e),
                Err(JoinFailure::Timeout(handle)) => {
                    warn!("Previous reader thread could not be joined");
                    *worker = Some(ReaderWorker {
                        handle,
                        close,
                        running,
                        state,
                    });
                    return Err(DriverError::ReaderThread(
                        "previous reader is still shutting down".to_string(),
                    ));
                },
                Err(JoinFailure::Panicked) => warn!("Previous reader thread panicked"),
            }
        }

        let source = self.opener.open()?;
        let close = source.close_handle();
        info!("Transport opened: {}", self.opener.describe());

        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(AtomicReaderState::new(ReaderState::Running));

        let reader = PacketReader::new(source);
        let ctx = self.ctx.clone();
        let metrics = self.metrics.clone();
        let thread_running = running.clone();
        let thread_state = state.clone();

        let spawned = thread::Builder::new()
            .name("mindwave-reader".to_string())
            .spawn(move || {
                let result = reader_loop(reader, ctx, thread_running.clone(), metrics);
                thread_running.store(false, Ordering::Release);
                thread_state.set(ReaderState::Stopped, Ordering::Release);
                result
            });

        match spawned {
            Ok(handle) => {
                self.state.store(state.clone());
                *worker = Some(ReaderWorker {
                    handle,
                    close,
                    running,
                    state,
                });
                Ok(())
            },
            Err(e) => {
                close.close();
                Err(DriverError::ReaderThread(format!("failed to spawn reader: {e}")))
            },
        }
    }

    /// 停止读线程并等待其退出
    ///
    /// 未运行时为空操作。如果读线程此前因传输错误退出，返回该错误。
    ///
    /// 在观察者回调内部（读线程上）调用时只发出停止请求，不会 join 自身。
    /// join 超时时读线程保持 `Stopping`，之后的 `stop()` 会再次尝试 join，
    /// `start()` 在它退出前拒绝启动新的读线程。
    pub fn stop(&self) -> Result<(), DriverError> {
        let worker = {
            let mut slot = self.worker.lock();
            let Some(worker) = slot.as_ref() else {
                return Ok(());
            };
            worker.request_stop();

            if worker.on_current_thread() {
                debug!("stop() called from the reader thread, skipping join");
                return Ok(());
            }
            slot.take()
        };
        let Some(ReaderWorker {
            handle,
            close,
            running,
            state,
        }) = worker
        else {
            return Ok(());
        };

        let result = match handle.join_timeout(self.config.join_timeout) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DriverError::Transport(e)),
            Err(JoinFailure::Timeout(handle)) => {
                warn!(
                    "Reader thread failed to shut down within {:?}",
                    self.config.join_timeout
                );
                let mut slot = self.worker.lock();
                if slot.is_none() {
                    *slot = Some(ReaderWorker {
                        handle,
                        close,
                        running,
                        state,
                    });
                }
                return Err(DriverError::ReaderThread("join timed out".to_string()));
            },
            Err(JoinFailure::Panicked) => {
                error!("Reader thread panicked");
                Err(DriverError::ReaderThread("reader thread panicked".to_string()))
            },
        };

        state.set(ReaderState::Stopped, Ordering::Release);
        info!("Reader stopped");
        result
    }

    /// 读线程是否在运行
    pub fn is_running(&self) -> bool {
        self.reader_state().is_running()
    }

    /// 当前生命周期状态
    pub fn reader_state(&self) -> ReaderState {
        self.state.load().get(Ordering::Acquire)
    }

    /// 最新值快照（无锁）
    pub fn readings(&self) -> SensorReadings {
        **self.ctx.readings.load()
    }

    pub fn latest(&self, kind: SensorKind) -> SensorField {
        self.ctx.readings.load().get(kind)
    }

    /// 按名称读取（`poorSignal`、`rawValue` 等，也接受 snake_case）
    pub fn latest_by_name(&self, name: &str) -> Result<SensorField, DriverError> {
        Ok(self.latest(name.parse()?))
    }

    pub fn poor_signal(&self) -> u8 {
        self.ctx.readings.load().poor_signal
    }

    pub fn blink_strength(&self) -> u8 {
        self.ctx.readings.load().blink_strength
    }

    pub fn raw_value(&self) -> i16 {
        self.ctx.readings.load().raw_value
    }

    pub fn attention(&self) -> u8 {
        self.ctx.readings.load().attention
    }

    pub fn meditation(&self) -> u8 {
        self.ctx.readings.load().meditation
    }

    /// 注册观察者（替换已有观察者并返回它）
    pub fn set_callback(
        &self,
        kind: SensorKind,
        observer: impl SensorObserver + 'static,
    ) -> Option<Arc<dyn SensorObserver>> {
        self.ctx.callbacks.set(kind, Arc::new(observer))
    }

    /// 注册共享观察者（同一个观察者可用于多个字段）
    pub fn set_shared_callback(
        &self,
        kind: SensorKind,
        observer: Arc<dyn SensorObserver>,
    ) -> Option<Arc<dyn SensorObserver>> {
        self.ctx.callbacks.set(kind, observer)
    }

    /// 按字段名称注册观察者
    pub fn set_callback_by_name(
        &self,
        name: &str,
        observer: impl SensorObserver + 'static,
    ) -> Result<Option<Arc<dyn SensorObserver>>, DriverError> {
        let kind: SensorKind = name.parse()?;
        Ok(self.set_callback(kind, observer))
    }

    pub fn clear_callback(&self, kind: SensorKind) -> Option<Arc<dyn SensorObserver>> {
        self.ctx.callbacks.clear(kind)
    }

    /// 开启或关闭历史记录
    ///
    /// 关闭 → 开启记录开始时间，开启 → 关闭记录结束时间；相同值为空操作。
    pub fn set_logging(&self, enabled: bool) {
        if self.ctx.history.write().set_logging(enabled, SystemTime::now()) {
            info!("Logging {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn is_logging(&self) -> bool {
        self.ctx.history.read().logging_enabled
    }

    /// 记录外部刺激标记
    ///
    /// 仅在 logging 开启时记录；返回是否被记录。
    pub fn record_stimulus(&self, value: i32) -> bool {
        self.ctx.history.write().push_stimulus(value, SystemTime::now())
    }

    /// 导出历史记录（克隆，不清空）
    pub fn export_history(&self) -> HistoryExport {
        self.ctx.export_history(self.config.sample_rate_hz)
    }

    /// 清空原始样本与刺激标记
    pub fn clear_history(&self) {
        self.ctx.history.write().clear();
    }

    /// 获取性能指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// 传输描述（用于日志和录制元数据）
    pub fn transport(&self) -> String {
        self.opener.describe()
    }
}

impl Drop for Headset {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            debug!("Reader ended with error during drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindwave_protocol::encode_packet;
    use crossbeam_channel::{Receiver, Sender, unbounded};
    use mindwave_transport::{ByteSource, channel};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    /// 关闭句柄无法唤醒的字节源（模拟卡死的驱动）
    struct StuckSource {
        rx: Receiver<u8>,
        close: CloseHandle,
    }

    impl ByteSource for StuckSource {
        fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
            for byte in buf.iter_mut() {
                *byte = self.rx.recv().map_err(|_| TransportError::Disconnected)?;
            }
            Ok(())
        }

        fn close_handle(&self) -> CloseHandle {
            self.close.clone()
        }
    }

    /// 每次 open 依次取出一个 StuckSource
    fn stuck_headset(sources: usize) -> (Vec<Sender<u8>>, Headset) {
        let (senders, receivers): (Vec<_>, VecDeque<_>) = (0..sources).map(|_| unbounded::<u8>()).unzip();
        let receivers = Mutex::new(receivers);
        let opener = move || -> Result<Box<dyn ByteSource>, TransportError> {
            let rx = receivers.lock().pop_front().ok_or(TransportError::Disconnected)?;
            Ok(Box::new(StuckSource {
                rx,
                close: CloseHandle::new(),
            }))
        };
        let config = ReaderConfig {
            join_timeout: Duration::from_millis(100),
            ..ReaderConfig::default()
        };
        (senders, Headset::new(opener, config))
    }

    fn feed(tx: &Sender<u8>, payload: &[u8]) {
        for byte in encode_packet(payload) {
            tx.send(byte).unwrap();
        }
    }

    #[test]
    fn test_start_twice_fails() {
        let (_feeder, opener) = channel(None);
        let headset = Headset::new(opener, ReaderConfig::default());

        headset.start().unwrap();
        assert!(headset.is_running());
        assert!(matches!(headset.start(), Err(DriverError::AlreadyRunning)));

        headset.stop().unwrap();
        assert!(!headset.is_running());
    }

    #[test]
    fn test_stop_when_not_running_is_noop() {
        let (_feeder, opener) = channel(None);
        let headset = Headset::new(opener, ReaderConfig::default());
        assert!(headset.stop().is_ok());
        assert!(headset.stop().is_ok());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let opener = || -> Result<Box<dyn ByteSource>, TransportError> {
            Err(TransportError::Open {
                target: "test".to_string(),
                reason: "unavailable".to_string(),
            })
        };
        let headset = Headset::new(opener, ReaderConfig::default());
        assert!(matches!(
            headset.start(),
            Err(DriverError::Transport(TransportError::Open { .. }))
        ));
        assert!(!headset.is_running());
    }

    #[test]
    fn test_disconnect_is_surfaced_by_stop() {
        let (feeder, opener) = channel(None);
        let headset = Headset::new(opener, ReaderConfig::default());
        headset.start().unwrap();

        feeder.send(encode_packet(&[0x02, 0x05])).unwrap();
        drop(feeder);

        assert!(wait_until(Duration::from_secs(2), || !headset.is_running()));
        assert_eq!(headset.poor_signal(), 5);
        assert!(matches!(
            headset.stop(),
            Err(DriverError::Transport(TransportError::Disconnected))
        ));
        assert_eq!(headset.metrics().transport_errors, 1);
    }

    #[test]
    fn test_restart_after_stop() {
        let (feeder, opener) = channel(None);
        let headset = Headset::new(opener, ReaderConfig::default());

        headset.start().unwrap();
        headset.stop().unwrap();
        headset.start().unwrap();

        feeder.send(encode_packet(&[0x16, 0x42])).unwrap();
        assert!(wait_until(Duration::from_secs(2), || headset.blink_strength() == 0x42));
        headset.stop().unwrap();
    }

    #[test]
    fn test_stop_from_observer_does_not_deadlock() {
        let (feeder, opener) = channel(None);
        let headset = Arc::new(Headset::new(opener, ReaderConfig::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&headset);
        let c = calls.clone();
        headset.set_callback(SensorKind::PoorSignal, move |_: SensorField| {
            c.fetch_add(1, Ordering::SeqCst);
            if let Some(headset) = weak.upgrade() {
                let _ = headset.stop();
            }
        });

        headset.start().unwrap();
        feeder.send(encode_packet(&[0x02, 0x00])).unwrap();

        assert!(wait_until(Duration::from_secs(2), || !headset.is_running()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_latest_by_name() {
        let (_feeder, opener) = channel(None);
        let headset = Headset::new(opener, ReaderConfig::default());
        assert_eq!(
            headset.latest_by_name("rawValue").unwrap(),
            SensorField::RawValue(0)
        );
        assert!(matches!(
            headset.latest_by_name("delta"),
            Err(DriverError::Protocol(_))
        ));
    }

    #[test]
    fn test_drop_joins_reader() {
        let (_feeder, opener) = channel(None);
        let headset = Headset::new(opener, ReaderConfig::default());
        headset.start().unwrap();
        drop(headset);
    }

    #[test]
    fn test_join_timeout_blocks_second_reader() {
        let (senders, headset) = stuck_headset(2);

        headset.start().unwrap();
        assert!(matches!(headset.stop(), Err(DriverError::ReaderThread(_))));
        assert_eq!(headset.reader_state(), ReaderState::Stopping);
        assert!(!headset.is_running());

        // 旧线程仍卡在读取中，不允许启动第二个读线程
        assert!(matches!(headset.start(), Err(DriverError::ReaderThread(_))));

        // 旧线程读到的包在停止请求之后到达，被丢弃
        feed(&senders[0], &[0x16, 0x11]);
        assert!(wait_until(Duration::from_secs(2), || {
            headset.reader_state() == ReaderState::Stopped
        }));
        assert_eq!(headset.blink_strength(), 0);

        headset.start().unwrap();
        feed(&senders[1], &[0x16, 0x22]);
        assert!(wait_until(Duration::from_secs(2), || headset.blink_strength() == 0x22));

        // 旧数据源断开不影响新的读线程
        drop(senders);
        assert!(wait_until(Duration::from_secs(2), || !headset.is_running()));
        assert!(matches!(
            headset.stop(),
            Err(DriverError::Transport(TransportError::Disconnected))
        ));
    }

    #[test]
    fn test_stale_reader_does_not_stop_new_run() {
        let (mut senders, headset) = stuck_headset(2);

        headset.start().unwrap();
        assert!(headset.stop().is_err());
        let stale = senders.remove(0);

        // 旧数据源断开：旧线程以错误退出，只改动自己的状态
        drop(stale);
        assert!(wait_until(Duration::from_secs(2), || {
            headset.reader_state() == ReaderState::Stopped
        }));

        headset.start().unwrap();
        feed(&senders[0], &[0x02, 0x07]);
        assert!(wait_until(Duration::from_secs(2), || headset.poor_signal() == 7));
        assert!(headset.is_running());

        // 新读线程同样卡住：stop 超时后再次 stop 可以完成 join
        assert!(matches!(headset.stop(), Err(DriverError::ReaderThread(_))));
        feed(&senders[0], &[0x02, 0x08]);
        assert!(wait_until(Duration::from_secs(2), || {
            headset.reader_state() == ReaderState::Stopped
        }));
        assert!(headset.stop().is_ok());
        assert_eq!(headset.poor_signal(), 7);
    }

    #[test]
    fn test_concurrent_stop_from_observer_and_controller() {
        let (feeder, opener) = channel(None);
        let headset = Arc::new(Headset::new(opener, ReaderConfig::default()));
        let entered = Arc::new(AtomicBool::new(false));

        let weak = Arc::downgrade(&headset);
        let flag = entered.clone();
        headset.set_callback(SensorKind::PoorSignal, move |_: SensorField| {
            flag.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            if let Some(headset) = weak.upgrade() {
                let _ = headset.stop();
            }
        });

        headset.start().unwrap();
        feeder.send(encode_packet(&[0x02, 0x00])).unwrap();
        assert!(wait_until(Duration::from_secs(2), || entered.load(Ordering::SeqCst)));
        thread::sleep(Duration::from_millis(20));

        let begin = Instant::now();
        assert!(headset.stop().is_ok());
        assert!(begin.elapsed() < Duration::from_secs(1));
        assert_eq!(headset.reader_state(), ReaderState::Stopped);
    }
}
