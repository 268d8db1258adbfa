//! Flags command

use anyhow::{Context, Result, anyhow};
use kiln_core::{Config, detect, select_flags};
use kiln_schema::{BuildVariant, CompilerVersion, CpuId, HostOs};

use crate::ui::ConsoleReporter;

/// Options of `kiln flags`.
#[derive(Debug, Clone, Default)]
pub struct FlagsOptions {
    pub build_id: String,
    pub cpu: String,
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    pub host: Option<String>,
    pub json: bool,
}

/// Select and print compiler flags.
pub fn flags(opts: &FlagsOptions, reporter: &ConsoleReporter) -> Result<()> {
    let version = resolve_version(opts)?;
    let cpu = CpuId::parse(&opts.cpu);
    let variant = BuildVariant::from_build_id(&opts.build_id);
    let host = match &opts.host {
        Some(h) => h.parse::<HostOs>().map_err(|e| anyhow!(e))?,
        None => HostOs::current(),
    };

    tracing::debug!(%version, %cpu, %variant, %host, "Selecting flags");
    let selection = select_flags(version, &cpu, &variant, host)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
    } else {
        reporter.diagnostics(&selection.diagnostics);
        println!("{}", selection.flags);
    }
    Ok(())
}

fn resolve_version(opts: &FlagsOptions) -> Result<CompilerVersion> {
    if let Some(v) = &opts.compiler_version {
        return v
            .parse()
            .with_context(|| format!("Invalid compiler version '{v}'"));
    }

    let compiler = match &opts.compiler {
        Some(c) => c.clone(),
        None => Config::load()?.compiler,
    };
    Ok(detect::detect_version(&compiler)?)
}
