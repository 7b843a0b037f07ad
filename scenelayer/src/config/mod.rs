//! User configuration loaded from `~/.scenelayer/config.ini`.
//!
//! Settings structs live in `settings`, constants in `defaults`,
//! parsing in `parser`, and serialization in `writer`. Missing files and
//! missing keys fall back to defaults.
//!
//! # Example
//!
//! ```
//! use scenelayer::config::ConfigFile;
//! use std::time::Duration;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.service.format, "jpgpng");
//! assert_eq!(config.to_capture_config().settle_delay, Duration::from_millis(1000));
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CaptureSettings, ConfigFile, LoggingSettings, ServiceSettings};
