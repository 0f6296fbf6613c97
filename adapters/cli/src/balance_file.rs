use std::{fs, path::Path};

use anyhow::{Context, Result};
use kernel_defence_core::BalanceConfig;

/// Reads a TOML balance file. Sections and fields left out keep their
/// built-in values.
pub(crate) fn load(path: &Path) -> Result<BalanceConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read balance file {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse balance file {}", path.display()))
}

fn parse(text: &str) -> Result<BalanceConfig> {
    let balance: BalanceConfig = toml::from_str(text)?;
    balance.validate()?;
    Ok(balance)
}

/// Serialises the balance table as pretty-printed JSON.
pub(crate) fn export_json(balance: &BalanceConfig) -> Result<String> {
    serde_json::to_string_pretty(balance).context("failed to serialise balance table")
}
