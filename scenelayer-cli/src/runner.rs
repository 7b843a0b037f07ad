//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, runtime and session
//! creation, and image output to reduce duplication across command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use scenelayer::config::{config_file_path, ConfigFile};
use scenelayer::logging::{init_logging, LoggingGuard};
use scenelayer::registry::RendererRegistry;
use scenelayer::service::{AsyncReqwestClient, ExportImageService, ServiceError};
use scenelayer::session::{RenderOutcome, RenderSession};
use scenelayer::storage::DiskThumbnailStore;
use scenelayer::view::OffscreenView;
use tokio::runtime::Runtime;
use tracing::info;

use crate::commands::common::ViewArgs;
use crate::error::CliError;

/// Session type every rendering command works with.
pub type CliSession =
    RenderSession<ExportImageService<AsyncReqwestClient>, OffscreenView, DiskThumbnailStore>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// `config_path` overrides the default `~/.scenelayer/config.ini`. A
    /// missing file means defaults.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let path = config_path.unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&path)?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("SceneLayer v{}", scenelayer::VERSION);
        info!("SceneLayer CLI: {} command", command);
        info!(service = %self.config.service.url, "Image service");
    }

    /// Create a render session over a headless view of `view`.
    pub fn create_session(
        &self,
        view: &ViewArgs,
        registry: Arc<RendererRegistry>,
    ) -> Result<CliSession, CliError> {
        let client = http_client(&self.config).map_err(CliError::ServiceCreation)?;
        let service = ExportImageService::new(client, self.config.service.url.as_str());

        Ok(RenderSession::new(
            Arc::new(OffscreenView::new(view.view_state())),
            service,
            DiskThumbnailStore::new(&self.config.capture.thumbnail_dir),
            registry,
            self.config.to_fetch_config(),
            self.config.to_capture_config(),
        ))
    }

    /// Renders the session's current selection, failing unless it reached
    /// the view.
    pub fn render(&self, session: &CliSession) -> Result<RenderOutcome, CliError> {
        let outcome = self.runtime.block_on(session.render())?;
        match outcome {
            RenderOutcome::Displayed { .. } => Ok(outcome),
            RenderOutcome::Skipped | RenderOutcome::Superseded => Err(CliError::NothingRendered),
        }
    }

    /// Writes what the view shows to `path`.
    pub fn save_view(&self, session: &CliSession, path: &Path) -> Result<(), CliError> {
        let canvas = session.view().render().ok_or(CliError::NothingRendered)?;

        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"));
        // JPEG has no alpha channel
        let saved = if is_jpeg {
            DynamicImage::ImageRgba8(canvas.clone()).to_rgb8().save(path)
        } else {
            canvas.save(path)
        };

        saved.map_err(|e| CliError::FileWrite {
            path: path.to_path_buf(),
            error: e,
        })?;

        info!(path = %path.display(), size = ?canvas.dimensions(), "Image saved");
        println!(
            "Saved {}x{} image to {}",
            canvas.width(),
            canvas.height(),
            path.display()
        );
        Ok(())
    }
}

/// HTTP client honouring `[service] timeout`; 0 leaves requests unbounded.
fn http_client(config: &ConfigFile) -> Result<AsyncReqwestClient, ServiceError> {
    AsyncReqwestClient::build(config.to_fetch_config().timeout)
}
