//! 录制命令
//!
//! 开启 logging 录制原始 EEG，标准输入中的每一行整数作为一个刺激标记。

use super::SourceArgs;
use crate::config::CliConfig;
use crate::utils::{install_interrupt_flag, parse_stimulus, print_metrics};
use anyhow::{Context, Result};
use clap::Args;
use mindwave_sdk::{Headset, recording_from_history};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 录制命令参数
#[derive(Args, Debug)]
pub struct RecordCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    /// 输出文件路径
    #[arg(short, long)]
    pub output: PathBuf,

    /// 录制时长（秒），0 表示直到 Ctrl-C
    #[arg(short, long, default_value_t = 0)]
    pub duration: u64,

    /// 同时导出 CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// 写入录制元数据的备注
    #[arg(long, default_value = "")]
    pub notes: String,
}

impl RecordCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        let headset = Arc::new(self.source.build_headset(config)?);
        let running = install_interrupt_flag()?;

        // 先开启 logging，回放数据源从第一个样本开始记录
        headset.set_logging(true);
        headset.start()?;
        println!("✅ 已连接: {}，开始录制...", headset.transport());
        println!("   输入整数并回车以记录刺激标记");

        spawn_stimulus_reader(headset.clone());

        let start = Instant::now();
        let limit = (self.duration > 0).then(|| Duration::from_secs(self.duration));
        while running.load(Ordering::SeqCst) && headset.is_running() {
            if limit.is_some_and(|limit| start.elapsed() >= limit) {
                println!("\n⏱️  达到时长限制");
                break;
            }
            thread::sleep(Duration::from_millis(200));
        }

        headset.set_logging(false);
        if let Err(e) = headset.stop() {
            warn!("Reader ended with error: {}", e);
        }

        let history = headset.export_history();
        let mut recording = recording_from_history(&history, &headset.transport());
        recording.metadata.notes = self.notes.clone();

        println!(
            "\n✅ 录制完成: {} 个样本 ({:.1}s), {} 个刺激标记",
            recording.sample_count(),
            recording.duration().as_secs_f64(),
            recording.stimuli.len()
        );

        println!("💾 保存到: {}", self.output.display());
        recording
            .save(&self.output)
            .with_context(|| format!("保存录制失败: {}", self.output.display()))?;

        if let Some(csv) = &self.csv {
            println!("💾 导出 CSV: {}", csv.display());
            recording.write_csv(csv)?;
        }

        print_metrics(&headset.metrics());
        Ok(())
    }
}

/// 后台读取标准输入的刺激标记（EOF 时退出）
fn spawn_stimulus_reader(headset: Arc<Headset>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_stimulus(&line) {
                Ok(Some(value)) => {
                    if headset.record_stimulus(value) {
                        info!("Stimulus {} recorded", value);
                    }
                },
                Ok(None) => {},
                Err(e) => eprintln!("⚠️  {e:#}"),
            }
        }
    });
}
