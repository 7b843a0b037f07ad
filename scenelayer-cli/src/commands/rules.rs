//! Rules command - print the request parameters for a selection.
//!
//! Nothing is sent to the image service; this shows exactly what the
//! `mosaicRule` and `renderingRule` query parameters would carry.

use scenelayer::mosaic::build_mosaic_rule;
use scenelayer::registry::RendererRegistry;
use scenelayer::rendering_rule::serialize_rendering_rule;
use scenelayer::session::RendererChoice;

use super::common::SceneArgs;
use crate::error::CliError;

/// Run the rules command.
pub fn run(scenes: &SceneArgs, renderer: &str) -> Result<(), CliError> {
    let (mosaic_rule, rendering_rule) = encode(scenes, renderer)?;
    println!("mosaicRule={}", mosaic_rule);
    println!("renderingRule={}", rendering_rule);
    Ok(())
}

/// Returns the encoded mosaic and rendering rules.
fn encode(scenes: &SceneArgs, renderer: &str) -> Result<(String, String), CliError> {
    let mosaic_rule = build_mosaic_rule(&scenes.selection(), scenes.method)
        .ok_or_else(|| CliError::InvalidArgument("at least one --scene is required".to_string()))?
        .to_json()
        .map_err(|e| CliError::InvalidArgument(format!("cannot encode mosaic rule: {}", e)))?;

    let rule = RendererChoice::preset(renderer).rendering_rule(&RendererRegistry::new())?;
    Ok((mosaic_rule, serialize_rendering_rule(&rule)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenelayer::mosaic::CompositeMethod;

    fn scenes(ids: &[u64], method: Option<CompositeMethod>) -> SceneArgs {
        SceneArgs {
            scene: ids.to_vec(),
            method,
        }
    }

    #[test]
    fn test_composite_rules() {
        let (mosaic, rendering) =
            encode(&scenes(&[101, 102], Some(CompositeMethod::Max)), "Agriculture").unwrap();

        let mosaic: serde_json::Value = serde_json::from_str(&mosaic).unwrap();
        assert_eq!(mosaic["mosaicOperation"], "MT_MAX");
        assert_eq!(mosaic["lockRasterIds"], serde_json::json!([101, 102]));
        assert_eq!(rendering, r#"{"rasterFunction":"Agriculture"}"#);
    }

    #[test]
    fn test_index_preset_leads_with_function_name() {
        let (_, rendering) = encode(&scenes(&[7], None), "ndvi colorized").unwrap();
        assert!(rendering.starts_with(r#"{"rasterFunction":"Colormap""#));
    }

    #[test]
    fn test_empty_selection_rejected() {
        assert!(matches!(
            encode(&scenes(&[], None), "Agriculture"),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
