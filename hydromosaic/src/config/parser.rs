//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [input] section
    if let Some(section) = ini.section(Some("input")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.input.directory = Some(expand_tilde(v));
            }
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("path") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.path = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("format") {
            config.output.format = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "output".to_string(),
                key: "format".to_string(),
                value: v.to_string(),
                reason: "must be 'directory' or 'memory'".to_string(),
            })?;
        }
    }

    // [grid] section
    if let Some(section) = ini.section(Some("grid")) {
        if let Some(v) = section.get("round_decimals") {
            let decimals: u32 = parse_number("grid", "round_decimals", v)?;
            if decimals > 12 {
                return Err(invalid("grid", "round_decimals", v, "must be between 0 and 12"));
            }
            config.grid.round_decimals = decimals;
        }
    }

    // [workers] section
    if let Some(section) = ini.section(Some("workers")) {
        if let Some(v) = section.get("count") {
            let count: usize = parse_number("workers", "count", v)?;
            if count == 0 {
                return Err(invalid("workers", "count", v, "must be at least 1"));
            }
            config.workers.count = count;
        }
    }

    // [scheduler] section
    if let Some(section) = ini.section(Some("scheduler")) {
        if let Some(v) = section.get("poll_interval_ms") {
            let ms: u64 = parse_number("scheduler", "poll_interval_ms", v)?;
            if ms == 0 {
                return Err(invalid("scheduler", "poll_interval_ms", v, "must be at least 1"));
            }
            config.scheduler.poll_interval_ms = ms;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
