//! Export command - render a selection over an extent to an image file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scenelayer::registry::RendererRegistry;
use scenelayer::session::RendererChoice;

use super::common::{SceneArgs, ViewArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the export command.
pub fn run(
    config_path: Option<PathBuf>,
    view: &ViewArgs,
    scenes: &SceneArgs,
    renderer: &str,
    output: &Path,
) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    runner.log_startup("export");

    let session = runner.create_session(view, Arc::new(RendererRegistry::new()))?;
    session.select(&scenes.selection(), scenes.method, RendererChoice::preset(renderer))?;

    println!("Rendering {} over {}:", renderer, view.extent().bbox_param());
    println!("  Scenes: {:?}", scenes.scene);
    if let Some(method) = scenes.method.filter(|_| scenes.scene.len() > 1) {
        println!("  Composite: {}", method);
    }
    println!("  Size: {}", view.size);
    println!();

    let start = std::time::Instant::now();
    runner.render(&session)?;
    println!("Rendered in {:.2}s", start.elapsed().as_secs_f64());

    runner.save_view(&session, output)?;
    session.teardown();
    Ok(())
}
