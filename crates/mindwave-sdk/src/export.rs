//! 历史导出 → 录制文件
//!
//! 驱动层的 [`HistoryExport`] 只包含内存中的数据；这里把它转换成
//! `mindwave-tools` 的 [`EegRecording`]，以便保存或导出 CSV。

use mindwave_driver::HistoryExport;
use mindwave_tools::{EegRecording, RecordingMetadata, StimulusEvent, unix_micros};

/// 把一次 logging 会话的历史转换为录制
///
/// `source` 通常是 `Headset::transport()` 的返回值。
///
/// # Example
///
/// ```
/// use mindwave_sdk::driver::HistoryExport;
/// use mindwave_sdk::recording_from_history;
///
/// let history = HistoryExport {
///     raw_history: vec![1, 2, 3],
///     stimulus_log: Vec::new(),
///     sample_rate_hz: 512,
///     logging_started_at: None,
///     logging_stopped_at: None,
/// };
/// let recording = recording_from_history(&history, "channel");
/// assert_eq!(recording.sample_count(), 3);
/// ```
pub fn recording_from_history(history: &HistoryExport, source: &str) -> EegRecording {
    let mut metadata = RecordingMetadata::new(source);
    metadata.sample_rate_hz = history.sample_rate_hz;
    if let Some(started) = history.logging_started_at {
        metadata.start_time_us = unix_micros(started);
    }
    metadata.end_time_us = history.logging_stopped_at.map(unix_micros);

    let mut recording = EegRecording::new(metadata);
    recording.raw = history.raw_history.clone();
    recording.stimuli = history
        .stimulus_log
        .iter()
        .map(|mark| StimulusEvent {
            timestamp_us: unix_micros(mark.timestamp),
            sample_index: mark.sample_index as u64,
            value: mark.value,
        })
        .collect();
    recording
}
