//! Cpus command

use anyhow::{Result, anyhow};
use crossterm::style::Stylize;
use kiln_core::flags::{CpuFlags, cpu_flags};
use kiln_schema::{CpuId, HostOs};

/// List recognized CPU ids with the architecture flags they select.
pub fn cpus(host: Option<&str>) -> Result<()> {
    let host = match host {
        Some(h) => h.parse::<HostOs>().map_err(|e| anyhow!(e))?,
        None => HostOs::current(),
    };

    for cpu in &CpuId::KNOWN {
        let vendor = cpu.vendor().map_or_else(String::new, |v| v.to_string());
        let flags = match cpu_flags(cpu, host) {
            CpuFlags::Table(group) => group.join(" "),
            CpuFlags::GenericTune | CpuFlags::Native => String::new(),
        };
        println!("{:<14}{vendor:<8}{}", cpu.as_str(), flags.dark_grey());
    }
    Ok(())
}
