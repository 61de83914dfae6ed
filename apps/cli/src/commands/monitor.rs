//! 监控命令
//!
//! 周期性打印最新读数，Ctrl-C 退出后打印统计信息。

use super::SourceArgs;
use crate::config::CliConfig;
use crate::utils::{install_interrupt_flag, print_metrics};
use anyhow::Result;
use clap::Args;
use mindwave_sdk::{SensorField, SensorKind};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// 监控命令参数
#[derive(Args, Debug)]
pub struct MonitorCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    /// 打印间隔（毫秒）
    #[arg(short, long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// 同时打印每个眨眼事件
    #[arg(long)]
    pub blinks: bool,
}

impl MonitorCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        let headset = self.source.build_headset(config)?;
        let running = install_interrupt_flag()?;

        if self.blinks {
            headset.set_callback(SensorKind::BlinkStrength, |field: SensorField| {
                println!("👁  blink {}", field.value());
            });
        }

        headset.start()?;
        println!("✅ 已连接: {}（Ctrl-C 退出）", headset.transport());

        let interval = Duration::from_millis(self.interval_ms.max(10));
        while running.load(Ordering::SeqCst) && headset.is_running() {
            thread::sleep(interval);
            let r = headset.readings();
            println!(
                "signal={:3}  attention={:3}  meditation={:3}  raw={:6}",
                r.poor_signal, r.attention, r.meditation, r.raw_value
            );
        }

        if let Err(e) = headset.stop() {
            warn!("Reader ended with error: {}", e);
        }
        print_metrics(&headset.metrics());
        Ok(())
    }
}
