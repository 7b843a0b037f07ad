//! SceneLayer CLI - Command-line interface
//!
//! Drives the SceneLayer render pipeline headlessly: prints the request
//! parameters for a selection, exports a rendered view to a file, and
//! captures renderer thumbnails.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::common::{SceneArgs, ViewArgs, DEFAULT_RENDERER};
use commands::thumbnail::RendererSource;

#[derive(Debug, Parser)]
#[command(name = "scenelayer")]
#[command(version = scenelayer::VERSION)]
#[command(about = "Render and composite remote raster imagery", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.scenelayer/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Print the mosaicRule and renderingRule for a selection (no network)
    Rules {
        #[command(flatten)]
        scenes: SceneArgs,

        /// Preset or service function template name
        #[arg(long, default_value = DEFAULT_RENDERER)]
        renderer: String,
    },

    /// Render a selection over an extent and write the image to a file
    Export {
        #[command(flatten)]
        view: ViewArgs,

        #[command(flatten)]
        scenes: SceneArgs,

        /// Preset or service function template name
        #[arg(long, default_value = DEFAULT_RENDERER)]
        renderer: String,

        /// Output file; the format follows the extension (.png, .jpg, ...)
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Render with a custom renderer and store its thumbnail
    Thumbnail {
        #[command(flatten)]
        view: ViewArgs,

        #[command(flatten)]
        scenes: SceneArgs,

        #[command(flatten)]
        source: RendererSource,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => commands::init::run(cli.config, force),
        Commands::Rules { scenes, renderer } => commands::rules::run(&scenes, &renderer),
        Commands::Export {
            view,
            scenes,
            renderer,
            output,
        } => commands::export::run(cli.config, &view, &scenes, &renderer, &output),
        Commands::Thumbnail {
            view,
            scenes,
            source,
        } => commands::thumbnail::run(cli.config, &view, &scenes, source),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenelayer::mosaic::CompositeMethod;

    #[test]
    fn test_rules_arguments() {
        let cli = Cli::try_parse_from([
            "scenelayer",
            "rules",
            "--scene",
            "101",
            "--scene",
            "102",
            "--method",
            "MIN",
            "--renderer",
            "Agriculture",
        ])
        .unwrap();

        match cli.command {
            Commands::Rules { scenes, renderer } => {
                assert_eq!(scenes.scene, vec![101, 102]);
                assert_eq!(scenes.method, Some(CompositeMethod::Min));
                assert_eq!(renderer, "Agriculture");
            }
            other => panic!("expected rules, got {:?}", other),
        }
    }

    #[test]
    fn test_renderer_defaults_to_natural_color() {
        let cli = Cli::try_parse_from(["scenelayer", "rules", "--scene", "7"]).unwrap();
        match cli.command {
            Commands::Rules { scenes, renderer } => {
                assert_eq!(renderer, "Natural Color");
                assert_eq!(scenes.method, None);
            }
            other => panic!("expected rules, got {:?}", other),
        }
    }

    #[test]
    fn test_scene_is_required() {
        assert!(Cli::try_parse_from(["scenelayer", "rules"]).is_err());
    }

    #[test]
    fn test_unknown_method_rejected() {
        let result =
            Cli::try_parse_from(["scenelayer", "rules", "--scene", "1", "--method", "median"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_export_arguments() {
        let cli = Cli::try_parse_from([
            "scenelayer",
            "--config",
            "/tmp/scenelayer.ini",
            "export",
            "--extent",
            "-1000,-750,1000,750",
            "--wkid",
            "102100",
            "--size",
            "800x600",
            "--scene",
            "2969545",
            "-o",
            "out.png",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/scenelayer.ini")));
        match cli.command {
            Commands::Export { view, output, .. } => {
                assert_eq!(output, PathBuf::from("out.png"));
                assert_eq!(view.size.width, 800);
                assert_eq!(view.size.height, 600);
                let extent = view.extent();
                assert_eq!(extent.wkid, 102100);
                assert_eq!(extent.xmin, -1000.0);
                assert_eq!(extent.ymax, 750.0);
            }
            other => panic!("expected export, got {:?}", other),
        }
    }

    #[test]
    fn test_export_requires_extent() {
        let result = Cli::try_parse_from([
            "scenelayer",
            "export",
            "--scene",
            "1",
            "--output",
            "out.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_thumbnail_rule_and_preset_conflict() {
        let result = Cli::try_parse_from([
            "scenelayer",
            "thumbnail",
            "--extent",
            "0,0,10,10",
            "--scene",
            "1",
            "--id",
            "my-ndwi",
            "--rule",
            r#"{"rasterFunction":"Agriculture"}"#,
            "--from-preset",
            "Geology",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_thumbnail_arguments() {
        let cli = Cli::try_parse_from([
            "scenelayer",
            "thumbnail",
            "--extent",
            "0,0,10,10",
            "--scene",
            "1",
            "--id",
            "my-ndwi",
            "--from-preset",
            "MNDWI Colorized",
        ])
        .unwrap();

        match cli.command {
            Commands::Thumbnail { source, .. } => {
                assert_eq!(source.id, "my-ndwi");
                assert_eq!(source.from_preset.as_deref(), Some("MNDWI Colorized"));
                assert!(source.rule.is_none());
            }
            other => panic!("expected thumbnail, got {:?}", other),
        }
    }

    #[test]
    fn test_init_force_flag() {
        let cli = Cli::try_parse_from(["scenelayer", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }
}
