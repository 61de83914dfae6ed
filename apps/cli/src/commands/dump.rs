//! 抓包解析命令
//!
//! 离线解析原始字节抓包，逐包打印解码字段，最后打印统计。

use anyhow::{Context, Result};
use clap::Args;
use mindwave_sdk::driver::PacketReader;
use mindwave_sdk::protocol::{ProtocolError, RawPacket, SensorKind, decode_payload};
use mindwave_sdk::transport::ReaderSource;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// 解析命令参数
#[derive(Args, Debug)]
pub struct DumpCommand {
    /// 抓包文件路径
    #[arg(short, long)]
    pub input: PathBuf,

    /// 不打印原始 EEG 字段
    #[arg(long)]
    pub no_raw: bool,

    /// 最多打印的数据包数
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// 解析统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpSummary {
    pub packets: usize,
    pub valid: usize,
    pub checksum_mismatches: usize,
    pub malformed: usize,
    pub fields: usize,
    pub bytes_discarded: u64,
}

impl DumpCommand {
    pub fn execute(&self) -> Result<()> {
        let file = File::open(&self.input)
            .with_context(|| format!("打开抓包文件失败: {}", self.input.display()))?;
        let source = ReaderSource::named(BufReader::new(file), self.input.display().to_string());

        let summary = self.dump(PacketReader::new(source))?;

        println!("📊 统计:");
        println!(
            "   数据包: {} 总计, {} 有效, {} 校验失败, {} 格式错误",
            summary.packets, summary.valid, summary.checksum_mismatches, summary.malformed
        );
        println!(
            "   字段: {}，未同步字节: {}",
            summary.fields, summary.bytes_discarded
        );
        Ok(())
    }

    fn dump(&self, mut reader: PacketReader<ReaderSource<BufReader<File>>>) -> Result<DumpSummary> {
        let mut summary = DumpSummary::default();

        while let Some(packet) = reader.next() {
            let packet = packet.context("读取抓包失败")?;
            summary.bytes_discarded += reader.take_discarded();
            summary.packets += 1;

            let line = self.describe_packet(&packet, &mut summary);
            if let Some(line) = line
                && self.limit.is_none_or(|limit| summary.packets <= limit)
            {
                println!("#{:<6} {}", summary.packets, line);
            }
        }
        summary.bytes_discarded += reader.take_discarded();

        Ok(summary)
    }

    /// 返回要打印的一行（全部字段被过滤时返回 None）
    fn describe_packet(&self, packet: &RawPacket, summary: &mut DumpSummary) -> Option<String> {
        if let Err(e) = packet.verify() {
            summary.checksum_mismatches += 1;
            return Some(format!("✗ {e}"));
        }

        match decode_payload(&packet.payload) {
            Ok(fields) => {
                summary.valid += 1;
                summary.fields += fields.len();
                let shown: Vec<String> = fields
                    .iter()
                    .filter(|f| !(self.no_raw && f.kind() == SensorKind::RawValue))
                    .map(|f| f.to_string())
                    .collect();
                (!shown.is_empty()).then(|| shown.join(" "))
            },
            Err(e @ ProtocolError::Malformed { .. }) => {
                summary.malformed += 1;
                Some(format!("✗ {e}"))
            },
            Err(e) => Some(format!("✗ {e}")),
        }
    }
}
