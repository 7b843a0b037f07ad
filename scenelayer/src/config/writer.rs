//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[service]
; Base URL of the raster image server (exportImage is appended)
url = {}
; Output format: jpgpng, png, png8, png24, png32, jpg (default: jpgpng)
format = {}
; Request timeout in seconds, 0 to rely on cancellation only (default: 30)
timeout = {}

[capture]
; Extra wait after the view reports it has finished drawing (default: 1000)
settle_delay_ms = {}
; Give up on a thumbnail if the view is still drawing after this long (default: 30)
convergence_timeout_secs = {}
; Where renderer thumbnails are written: <thumbnail_dir>/<owner>/<renderer>.png
thumbnail_dir = {}
owner = {}

[logging]
directory = {}
file = {}
"#,
        config.service.url,
        config.service.format,
        config.service.timeout,
        config.capture.settle_delay_ms,
        config.capture.convergence_timeout_secs,
        path_to_string(&config.capture.thumbnail_dir),
        config.capture.owner,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Shortens paths under the home directory to `~/...`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_tilde_paths() {
        let content = to_config_string(&ConfigFile::default());

        if dirs::home_dir().is_some() {
            assert!(content.contains("thumbnail_dir = ~/.scenelayer/thumbnails"));
            assert!(content.contains("directory = ~/.scenelayer/logs"));
        }
        assert!(content.contains("format = jpgpng"));
        assert!(content.contains("settle_delay_ms = 1000"));
    }

    #[test]
    fn test_every_section_written() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[service]", "[capture]", "[logging]"] {
            assert!(content.contains(section), "missing {}", section);
        }
    }
}
