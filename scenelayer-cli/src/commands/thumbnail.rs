//! Thumbnail command - register a custom renderer and capture its thumbnail.
//!
//! The renderer is registered without a thumbnail, which queues a capture.
//! Rendering the selection with it then runs the capture once the view has
//! settled, and the PNG lands under `<thumbnail_dir>/<owner>/<id>.png`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use scenelayer::registry::{CustomRenderer, RendererId, RendererRegistry};
use scenelayer::rendering_rule::presets;
use scenelayer::session::{RenderOutcome, RendererChoice};
use serde_json::Value;

use super::common::{SceneArgs, ViewArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// The custom renderer to capture.
#[derive(Debug, Clone, Args)]
pub struct RendererSource {
    /// Renderer id; also the thumbnail file name
    #[arg(long)]
    pub id: String,

    /// Display name (default: the id)
    #[arg(long)]
    pub name: Option<String>,

    /// Rendering rule as JSON
    #[arg(long, conflicts_with = "from_preset", required_unless_present = "from_preset")]
    pub rule: Option<String>,

    /// Start from a built-in preset instead of a JSON rule
    #[arg(long)]
    pub from_preset: Option<String>,
}

impl RendererSource {
    fn into_renderer(self) -> Result<CustomRenderer, CliError> {
        let rule = match (&self.rule, &self.from_preset) {
            (Some(json), _) => parse_rule(json)?,
            (None, Some(name)) => presets::preset(name)
                .ok_or_else(|| CliError::InvalidArgument(format!("unknown preset '{}'", name)))?
                .into_value(),
            (None, None) => {
                return Err(CliError::InvalidArgument(
                    "either --rule or --from-preset is required".to_string(),
                ))
            }
        };
        let name = self.name.unwrap_or_else(|| self.id.clone());
        Ok(CustomRenderer::new(self.id, name, rule))
    }
}

fn parse_rule(json: &str) -> Result<Value, CliError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CliError::InvalidArgument(format!("--rule is not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(CliError::InvalidArgument(
            "--rule must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// Run the thumbnail command.
pub fn run(
    config_path: Option<PathBuf>,
    view: &ViewArgs,
    scenes: &SceneArgs,
    source: RendererSource,
) -> Result<(), CliError> {
    let renderer = source.into_renderer()?;
    let id: RendererId = renderer.id.clone();

    let runner = CliRunner::new(config_path)?;
    runner.log_startup("thumbnail");

    let registry = Arc::new(RendererRegistry::new());
    registry.register(renderer);

    let session = runner.create_session(view, Arc::clone(&registry))?;
    session.select(&scenes.selection(), scenes.method, RendererChoice::Custom(id.clone()))?;

    println!("Capturing thumbnail for renderer '{}'...", id);
    let outcome = runner.render(&session)?;
    session.teardown();

    match outcome {
        RenderOutcome::Displayed {
            capture: Some(Ok(thumbnail)),
            ..
        } => {
            println!("Saved thumbnail to {}", thumbnail.location);
            println!("  Size: {} bytes", thumbnail.encoded.len());
            Ok(())
        }
        RenderOutcome::Displayed {
            capture: Some(Err(e)),
            ..
        } => Err(e.into()),
        _ => Err(CliError::NothingRendered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(rule: Option<&str>, from_preset: Option<&str>) -> RendererSource {
        RendererSource {
            id: "my-ndwi".to_string(),
            name: None,
            rule: rule.map(str::to_string),
            from_preset: from_preset.map(str::to_string),
        }
    }

    #[test]
    fn test_renderer_from_json_rule() {
        let renderer = source(Some(r#"{"rasterFunction":"Geology"}"#), None)
            .into_renderer()
            .unwrap();

        assert_eq!(renderer.id.as_str(), "my-ndwi");
        assert_eq!(renderer.name, "my-ndwi");
        assert_eq!(renderer.rendering_rule["rasterFunction"], "Geology");
        assert!(!renderer.has_thumbnail());
    }

    #[test]
    fn test_renderer_from_preset() {
        let renderer = source(None, Some("MNDWI Colorized")).into_renderer().unwrap();
        assert_eq!(renderer.rendering_rule["rasterFunction"], "Colormap");
    }

    #[test]
    fn test_invalid_sources() {
        assert!(source(Some("not json"), None).into_renderer().is_err());
        assert!(source(Some("[1, 2]"), None).into_renderer().is_err());
        assert!(source(None, Some("Nope")).into_renderer().is_err());
        assert!(source(None, None).into_renderer().is_err());
    }
}
