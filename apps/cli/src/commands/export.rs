//! 导出命令
//!
//! 把录制文件转换为 CSV（`sample,EEG1,STI 014`），可选截取样本范围。

use anyhow::{Context, Result};
use clap::Args;
use mindwave_sdk::EegRecording;
use std::path::PathBuf;

/// 导出命令参数
#[derive(Args, Debug)]
pub struct ExportCommand {
    /// 录制文件路径
    #[arg(short, long)]
    pub input: PathBuf,

    /// CSV 输出路径
    #[arg(short, long)]
    pub output: PathBuf,

    /// 起始样本（包含）
    #[arg(long, default_value_t = 0)]
    pub start: usize,

    /// 结束样本（不包含），默认到末尾
    #[arg(long)]
    pub end: Option<usize>,
}

impl ExportCommand {
    pub fn execute(&self) -> Result<()> {
        let recording = EegRecording::load(&self.input)
            .with_context(|| format!("加载录制失败: {}", self.input.display()))?;

        println!("📂 来源: {}", recording.metadata.source);
        println!(
            "   {} 个样本 @ {} Hz ({:.1}s), {} 个刺激标记",
            recording.sample_count(),
            recording.metadata.sample_rate_hz,
            recording.duration().as_secs_f64(),
            recording.stimuli.len()
        );

        let end = self.end.unwrap_or(recording.sample_count());
        let windowed = recording.window(self.start, end);
        windowed.write_csv(&self.output)?;

        println!(
            "✅ 已导出 {} 个样本到 {}",
            windowed.sample_count(),
            self.output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindwave_sdk::RecordingMetadata;
    use tempfile::TempDir;

    #[test]
    fn test_export_window() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("session.mwr");
        let output = dir.path().join("session.csv");

        let mut recording = EegRecording::new(RecordingMetadata::new("test"));
        recording.raw = vec![1, 2, 3, 4];
        recording.save(&input).unwrap();

        let cmd = ExportCommand {
            input,
            output: output.clone(),
            start: 2,
            end: None,
        };
        cmd.execute().unwrap();

        let content = std::fs::read_to_string(output).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), vec![
            "sample,EEG1,STI 014",
            "0,3,0",
            "1,4,0"
        ]);
    }
}
