//! Default values for every configuration key.

use super::settings::{CaptureSettings, ConfigFile, LoggingSettings, ServiceSettings};
use crate::service::{DEFAULT_FORMAT, DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT_SECS};

/// Default settle delay after the view reports convergence.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Default upper bound on waiting for the view to converge.
pub const DEFAULT_CONVERGENCE_TIMEOUT_SECS: u64 = 30;

/// Owner id used when none is configured.
pub const DEFAULT_OWNER: &str = "anonymous";

pub const DEFAULT_LOG_FILE: &str = "scenelayer.log";

/// Output formats the image service accepts.
pub const VALID_FORMATS: &[&str] = &["jpgpng", "png", "png8", "png24", "png32", "jpg"];

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            service: ServiceSettings {
                url: DEFAULT_SERVICE_URL.to_string(),
                format: DEFAULT_FORMAT.to_string(),
                timeout: DEFAULT_TIMEOUT_SECS,
            },
            capture: CaptureSettings {
                settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
                convergence_timeout_secs: DEFAULT_CONVERGENCE_TIMEOUT_SECS,
                thumbnail_dir: config_dir.join("thumbnails"),
                owner: DEFAULT_OWNER.to_string(),
            },
            logging: LoggingSettings {
                directory: config_dir.join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
