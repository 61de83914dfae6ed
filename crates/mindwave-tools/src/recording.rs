//! # 录制格式定义
//!
//! 一次 logging 会话的原始 EEG 样本与外部刺激标记。
//!
//! 导出时使用两个通道：
//! - `EEG1`: 原始 EEG 数值
//! - `STI 014`: 刺激通道，刺激标记所在采样点为标记值，其余为 0

use anyhow::{Context, Result};
use mindwave_protocol::constants::RAW_SAMPLE_RATE_HZ;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

/// 录制文件魔数（用于文件格式识别）
pub const MAGIC: &[u8; 8] = b"MWEEGV1\0";

/// 当前格式版本
pub const FORMAT_VERSION: u8 = 1;

/// 原始 EEG 通道名称
pub const EEG_CHANNEL: &str = "EEG1";

/// 刺激通道名称
pub const STIM_CHANNEL: &str = "STI 014";

/// MindWave EEG 录制文件 v1
///
/// 文件格式：
///
/// ```text
/// [MAGIC: 8 bytes]
/// [Version: 1 byte]
/// [Data: bincode serialized EegRecording]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EegRecording {
    /// 格式版本
    pub version: u8,
    /// 元数据
    pub metadata: RecordingMetadata,
    /// 原始 EEG 样本（按到达顺序）
    pub raw: Vec<i16>,
    /// 刺激标记
    pub stimuli: Vec<StimulusEvent>,
}

impl EegRecording {
    /// 创建空录制
    pub fn new(metadata: RecordingMetadata) -> Self {
        Self {
            version: FORMAT_VERSION,
            metadata,
            raw: Vec::new(),
            stimuli: Vec::new(),
        }
    }

    pub fn push_sample(&mut self, value: i16) {
        self.raw.push(value);
    }

    pub fn add_stimulus(&mut self, event: StimulusEvent) {
        self.stimuli.push(event);
    }

    pub fn sample_count(&self) -> usize {
        self.raw.len()
    }

    /// 按采样率计算的时长（采样率为 0 时返回 0）
    pub fn duration(&self) -> Duration {
        if self.metadata.sample_rate_hz == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.raw.len() as f64 / self.metadata.sample_rate_hz as f64)
    }

    /// 生成与 `raw` 等长的刺激通道
    ///
    /// 超出样本范围的标记落在最后一个采样点；同一采样点的多个标记以后者为准。
    pub fn stimulus_channel(&self) -> Vec<i32> {
        let mut channel = vec![0i32; self.raw.len()];
        let Some(last) = self.raw.len().checked_sub(1) else {
            return channel;
        };
        for event in &self.stimuli {
            let index = (event.sample_index as usize).min(last);
            channel[index] = event.value;
        }
        channel
    }

    /// 截取 `[start, end)` 范围内的样本，刺激标记随之平移
    pub fn window(&self, start: usize, end: usize) -> EegRecording {
        let end = end.min(self.raw.len());
        let start = start.min(end);

        let mut windowed = EegRecording::new(self.metadata.clone());
        windowed.raw = self.raw[start..end].to_vec();
        windowed.stimuli = self
            .stimuli
            .iter()
            .filter(|e| (e.sample_index as usize) >= start && (e.sample_index as usize) < end)
            .map(|e| StimulusEvent {
                sample_index: e.sample_index - start as u64,
                ..*e
            })
            .collect();
        windowed
    }

    /// 导出 CSV：`sample,EEG1,STI 014`
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref()).context("创建 CSV 文件失败")?;
        writer
            .write_record(["sample", EEG_CHANNEL, STIM_CHANNEL])
            .context("写入 CSV 表头失败")?;

        let stim = self.stimulus_channel();
        for (i, (raw, stim)) in self.raw.iter().zip(&stim).enumerate() {
            writer
                .write_record([i.to_string(), raw.to_string(), stim.to_string()])
                .context("写入 CSV 数据失败")?;
        }
        writer.flush().context("刷新缓冲区失败")?;
        Ok(())
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).context("创建录制文件失败")?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC).context("写入魔数失败")?;
        writer.write_all(&[self.version]).context("写入版本失败")?;

        let data = bincode::serialize(self).context("序列化录制失败")?;
        writer.write_all(&data).context("写入录制数据失败")?;
        writer.flush().context("刷新缓冲区失败")?;

        Ok(())
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).context("打开录制文件失败")?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).context("读取魔数失败")?;
        if &magic != MAGIC {
            anyhow::bail!("无效的录制文件格式（魔数不匹配）");
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version).context("读取版本失败")?;
        if version[0] != FORMAT_VERSION {
            anyhow::bail!("不支持的录制文件版本: {}", version[0]);
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).context("读取录制数据失败")?;

        let recording: EegRecording = bincode::deserialize(&data).context("反序列化录制失败")?;
        Ok(recording)
    }
}

/// 录制元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// logging 开始时间（Unix 时间戳，微秒）
    pub start_time_us: u64,
    /// logging 结束时间（仍在记录时导出为 None）
    pub end_time_us: Option<u64>,
    /// 数据来源（传输描述，如 "serial:/dev/rfcomm0@57600"）
    pub source: String,
    /// 原始 EEG 采样率
    pub sample_rate_hz: u32,
    /// 平台信息
    pub platform: String,
    /// 备注
    pub notes: String,
}

impl RecordingMetadata {
    /// 创建新的元数据（开始时间为当前时间）
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            start_time_us: crate::timestamp::unix_micros(std::time::SystemTime::now()),
            end_time_us: None,
            source: source.into(),
            sample_rate_hz: RAW_SAMPLE_RATE_HZ,
            platform: std::env::consts::OS.to_string(),
            notes: String::new(),
        }
    }
}

/// 刺激标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusEvent {
    /// 标记时间（Unix 时间戳，微秒）
    pub timestamp_us: u64,
    /// 对齐到的采样点
    pub sample_index: u64,
    pub value: i32,
}
