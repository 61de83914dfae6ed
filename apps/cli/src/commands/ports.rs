//! 列出可用串口

use anyhow::Result;
use mindwave_sdk::transport::list_ports;

pub fn execute() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("(未发现串口)");
        return Ok(());
    }

    for port in ports {
        println!("{port}");
    }
    Ok(())
}
