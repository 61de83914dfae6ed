//! 工具函数

use anyhow::{Context, Result};
use mindwave_sdk::MetricsSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 安装 Ctrl-C 处理器，返回运行标志（收到信号后变为 false）
pub fn install_interrupt_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("安装 Ctrl-C 处理器失败")?;
    Ok(running)
}

/// 打印统计信息
pub fn print_metrics(metrics: &MetricsSnapshot) {
    println!("📊 统计:");
    println!(
        "   数据包: {} 总计, {} 有效 ({:.1}%)",
        metrics.packets_total,
        metrics.packets_valid,
        metrics.valid_packet_rate()
    );
    println!(
        "   丢弃: {} 校验失败, {} 格式错误, {} 字节未同步",
        metrics.checksum_mismatches, metrics.malformed_packets, metrics.bytes_discarded
    );
    println!(
        "   字段: {} 已解码, {} 观察者失败",
        metrics.fields_decoded, metrics.observer_failures
    );
}

/// 解析刺激标记输入行（忽略空行）
pub fn parse_stimulus(line: &str) -> Result<Option<i32>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let value = line
        .parse::<i32>()
        .with_context(|| format!("无效的刺激值: '{}'", line))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stimulus() {
        assert_eq!(parse_stimulus("  ").unwrap(), None);
        assert_eq!(parse_stimulus("3\n").unwrap(), Some(3));
        assert_eq!(parse_stimulus("-12").unwrap(), Some(-12));
        assert!(parse_stimulus("go").is_err());
    }
}
