//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use crate::capture::CaptureConfig;
use crate::fetch::FetchConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Image service settings
    pub service: ServiceSettings,
    /// Thumbnail capture settings
    pub capture: CaptureSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Remote image service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    /// Base URL of the image server (without `/exportImage`)
    pub url: String,
    /// Output format: "jpgpng", "png", "png8", "png24", "png32", or "jpg"
    pub format: String,
    /// Request timeout in seconds; 0 disables it
    pub timeout: u64,
}

/// Thumbnail capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub settle_delay_ms: u64,
    pub convergence_timeout_secs: u64,
    /// Root directory for persisted thumbnails
    pub thumbnail_dir: PathBuf,
    /// Owner id thumbnails are filed under
    pub owner: String,
}

/// Log output.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl ConfigFile {
    /// Fetch pipeline settings from the `[service]` section.
    pub fn to_fetch_config(&self) -> FetchConfig {
        FetchConfig {
            format: self.service.format.clone(),
            timeout: (self.service.timeout > 0).then(|| Duration::from_secs(self.service.timeout)),
        }
    }

    /// Capture settings from the `[capture]` section.
    pub fn to_capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            settle_delay: Duration::from_millis(self.capture.settle_delay_ms),
            convergence_timeout: Duration::from_secs(self.capture.convergence_timeout_secs),
            owner_id: self.capture.owner.clone(),
        }
    }
}
