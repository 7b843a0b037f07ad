//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use scenelayer::capture::CaptureError;
use scenelayer::config::ConfigFileError;
use scenelayer::fetch::RenderError;
use scenelayer::registry::RegistryError;
use scenelayer::service::ServiceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Configuration file already present
    ConfigExists(PathBuf),
    /// Bad command-line value
    InvalidArgument(String),
    /// Failed to create the image service client
    ServiceCreation(ServiceError),
    /// Selection could not be resolved
    Registry(RegistryError),
    /// Render failed
    Render(RenderError),
    /// Extent or size leaves nothing to draw
    NothingRendered,
    /// Thumbnail capture failed
    Capture(CaptureError),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: image::ImageError },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Fix the value in the configuration file, or regenerate it with:");
                eprintln!("  scenelayer init --force");
            }
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it with the defaults.");
            }
            CliError::Render(RenderError::NetworkFailure(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. No network access to the image service");
                eprintln!("  2. Wrong service url in the [service] section of config.ini");
                eprintln!("  3. Scene ids that do not exist on the service");
            }
            CliError::Capture(CaptureError::ConvergenceTimeout(_)) => {
                eprintln!();
                eprintln!("The view kept redrawing. Raise convergence_timeout_secs in the");
                eprintln!("[capture] section of config.ini and try again.");
            }
            CliError::NothingRendered => {
                eprintln!();
                eprintln!("Check that --extent has a non-zero width and height and that");
                eprintln!("--size is at least 1x1.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::ConfigExists(path) => {
                write!(f, "Configuration file already exists: {}", path.display())
            }
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::ServiceCreation(e) => write!(f, "Failed to create service client: {}", e),
            CliError::Registry(e) => write!(f, "Renderer error: {}", e),
            CliError::Render(e) => write!(f, "Render failed: {}", e),
            CliError::NothingRendered => write!(f, "Nothing to render for this view"),
            CliError::Capture(e) => write!(f, "Thumbnail capture failed: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Registry(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::Capture(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::Render(e)
    }
}

impl From<CaptureError> for CliError {
    fn from(e: CaptureError) -> Self {
        CliError::Capture(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_render_error_keeps_source() {
        let err = CliError::from(RenderError::NetworkFailure(ServiceError::HttpStatus {
            status: 503,
            url: "https://example.com/exportImage".to_string(),
        }));

        assert_eq!(
            err.to_string(),
            "Render failed: network failure: HTTP 503 from https://example.com/exportImage"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_exists_message() {
        let err = CliError::ConfigExists(PathBuf::from("/tmp/config.ini"));
        assert_eq!(
            err.to_string(),
            "Configuration file already exists: /tmp/config.ini"
        );
        assert!(err.source().is_none());
    }
}
