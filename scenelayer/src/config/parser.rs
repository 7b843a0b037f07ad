//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use reqwest::Url;
use std::path::PathBuf;

use super::defaults::VALID_FORMATS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [service] section
    if let Some(section) = ini.section(Some("service")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.is_empty() {
                Url::parse(v).map_err(|e| ConfigFileError::InvalidValue {
                    section: "service".to_string(),
                    key: "url".to_string(),
                    value: v.to_string(),
                    reason: format!("not a valid URL: {}", e),
                })?;
                config.service.url = v.trim_end_matches('/').to_string();
            }
        }
        if let Some(v) = section.get("format") {
            let v = v.trim().to_lowercase();
            if !VALID_FORMATS.contains(&v.as_str()) {
                return Err(ConfigFileError::InvalidValue {
                    section: "service".to_string(),
                    key: "format".to_string(),
                    value: v,
                    reason: format!("must be one of: {}", VALID_FORMATS.join(", ")),
                });
            }
            config.service.format = v;
        }
        if let Some(v) = section.get("timeout") {
            config.service.timeout = parse_u64("service", "timeout", v, "seconds")?;
        }
    }

    // [capture] section
    if let Some(section) = ini.section(Some("capture")) {
        if let Some(v) = section.get("settle_delay_ms") {
            config.capture.settle_delay_ms =
                parse_u64("capture", "settle_delay_ms", v, "milliseconds")?;
        }
        if let Some(v) = section.get("convergence_timeout_secs") {
            let secs = parse_u64("capture", "convergence_timeout_secs", v, "seconds")?;
            if secs == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "capture".to_string(),
                    key: "convergence_timeout_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.capture.convergence_timeout_secs = secs;
        }
        if let Some(v) = section.get("thumbnail_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.capture.thumbnail_dir = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("owner") {
            let v = v.trim();
            if v.is_empty() || v.contains(['/', '\\']) || v == ".." {
                return Err(ConfigFileError::InvalidValue {
                    section: "capture".to_string(),
                    key: "owner".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-empty name without path separators".to_string(),
                });
            }
            config.capture.owner = v.to_string();
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

fn parse_u64(section: &str, key: &str, value: &str, unit: &str) -> Result<u64, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("must be a non-negative integer ({})", unit),
        })
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
