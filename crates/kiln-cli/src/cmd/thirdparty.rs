//! Third-party package commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;
use kiln_core::thirdparty::{PackageDescriptor, PackageRegistry};
use kiln_core::{Config, Reporter, USER_AGENT};

use crate::ui::ConsoleReporter;

/// Built-in packages plus any descriptors from the configured directory.
pub fn registry(config: &Config) -> Result<PackageRegistry> {
    let mut registry = PackageRegistry::builtin();
    if let Some(dir) = &config.packages_dir {
        registry
            .load_dir(dir)
            .with_context(|| format!("Failed to load packages from {}", dir.display()))?;
    }
    Ok(registry)
}

/// List known packages and whether they are unpacked under `trunk`.
pub fn list(config: &Config, trunk: Option<&Path>) -> Result<()> {
    let registry = registry(config)?;
    let trunk = trunk.unwrap_or(&config.trunk_dir);

    for pkg in registry.iter() {
        let state = if pkg.is_unpacked(trunk) {
            format!("{:<10}", "unpacked").green()
        } else {
            format!("{:<10}", "missing").dark_grey()
        };
        println!("{:<12}{state}{}", pkg.name(), pkg.cmake_flags);
    }
    Ok(())
}

/// Print one descriptor as TOML.
pub fn show(config: &Config, name: &str) -> Result<()> {
    let registry = registry(config)?;
    let Some(pkg) = registry.find(name) else {
        bail!("Package '{name}' not found");
    };
    print!("{}", pkg.to_toml()?);
    Ok(())
}

/// Print the CMake flags enabling `names`.
pub fn cmake_flags(config: &Config, names: &[String]) -> Result<()> {
    let registry = registry(config)?;
    match registry.cmake_flags(names) {
        Ok(flags) => {
            println!("{flags}");
            Ok(())
        }
        Err(unknown) => bail!("Unknown package(s): {}", unknown.join(", ")),
    }
}

/// Download and unpack `names` (every known package when empty).
pub async fn fetch(
    config: &Config,
    names: &[String],
    trunk: Option<PathBuf>,
    reporter: &ConsoleReporter,
) -> Result<()> {
    let registry = registry(config)?;
    let trunk = trunk.unwrap_or_else(|| config.trunk_dir.clone());

    let selected: Vec<&PackageDescriptor> = if names.is_empty() {
        registry.iter().collect()
    } else {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match registry.find(name) {
                Some(pkg) => selected.push(pkg),
                None => bail!("Package '{name}' not found"),
            }
        }
        selected
    };

    std::fs::create_dir_all(&trunk)
        .with_context(|| format!("Failed to create {}", trunk.display()))?;

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()?;

    reporter.section("Fetching");
    let mut failures = Vec::new();
    for pkg in selected {
        if let Err(e) = pkg.fetch(&client, &trunk, reporter).await {
            tracing::warn!(package = pkg.name(), error = %e, "Fetch failed");
            failures.push(pkg.name().to_string());
        }
    }

    if !failures.is_empty() {
        bail!("Failed to fetch: {}", failures.join(", "));
    }
    Ok(())
}
