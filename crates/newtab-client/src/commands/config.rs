//! Configuration commands.

use std::path::Path;

use newtab_providers::CalendarSourceConfig;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration and describe the sources it yields.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate()?;

    let plan = config.calendar.plan();
    if plan.is_empty() {
        println!("No calendar source configured.");
    } else {
        for source in &plan {
            println!("source: {}", source.name());
        }
    }
    if config.calendar.api_key.is_some() && config.calendar.calendar_ids.is_empty() {
        println!("note: api_key is set but calendar_ids is empty; it is ignored.");
    }
    let uses_api_key = plan
        .iter()
        .any(|s| matches!(s, CalendarSourceConfig::ApiKey { .. }));
    if uses_api_key && !config.calendar.public_urls.is_empty() {
        println!("note: public_urls are ignored while API key sources are configured.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    let exists = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("config: {}{}", path.display(), exists);
    Ok(())
}
