//! Configuration commands.

use std::path::Path;

use booksmart_engine::EngineConfig;

use crate::error::{CliError, CliResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &EngineConfig, path: &Path) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CliError::config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> CliResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
