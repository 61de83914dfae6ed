//! 打印头戴设备的实时读数
//!
//! ```bash
//! cargo run -p mindwave-sdk --example print_readings -- --port /dev/rfcomm0
//! ```

use clap::Parser;
use mindwave_sdk::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Print MindWave readings once per second")]
struct Args {
    /// 串口名称
    #[arg(long, default_value = "/dev/rfcomm0")]
    port: String,

    /// 波特率
    #[arg(long, default_value_t = 57_600)]
    baud: u32,
}

fn main() -> anyhow::Result<()> {
    mindwave_sdk::init_logger("mindwave_sdk=info,mindwave_driver=info");
    let args = Args::parse();

    let headset = HeadsetBuilder::new()
        .serial(&args.port)
        .baud_rate(args.baud)
        .build()?;

    headset.set_callback(SensorKind::BlinkStrength, |field: SensorField| {
        println!("blink: {}", field.value());
    });

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    headset.start()?;
    println!("Reading from {} (Ctrl-C to stop)", headset.transport());

    while running.load(Ordering::SeqCst) && headset.is_running() {
        thread::sleep(Duration::from_secs(1));
        let r = headset.readings();
        println!(
            "signal={:3} attention={:3} meditation={:3} raw={:6}",
            r.poor_signal, r.attention, r.meditation, r.raw_value
        );
    }

    headset.stop()?;
    Ok(())
}
