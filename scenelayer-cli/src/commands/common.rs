//! Argument groups shared across CLI commands.

use clap::Args;
use scenelayer::geo::{Extent, ViewSize, ViewState};
use scenelayer::mosaic::{CompositeMethod, SceneSelection};

/// Renderer used when `--renderer` is not given.
pub const DEFAULT_RENDERER: &str = "Natural Color";

/// Scenes to draw and how to combine them.
#[derive(Debug, Clone, Args)]
pub struct SceneArgs {
    /// Scene object id; repeat for a composite
    #[arg(long, required = true)]
    pub scene: Vec<u64>,

    /// Composite method: first, last, min, max, mean, blend or sum
    ///
    /// Ignored with a single scene.
    #[arg(long)]
    pub method: Option<CompositeMethod>,
}

impl SceneArgs {
    pub fn selection(&self) -> SceneSelection {
        SceneSelection::from_ids(self.scene.iter().copied())
    }
}

/// Map area and output size of a headless view.
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Map extent as xmin,ymin,xmax,ymax
    #[arg(long, allow_hyphen_values = true)]
    pub extent: Extent,

    /// Spatial reference of the extent (default: 3857, Web Mercator)
    #[arg(long)]
    pub wkid: Option<u32>,

    /// Output size as WIDTHxHEIGHT
    #[arg(long, default_value = "800x600")]
    pub size: ViewSize,
}

impl ViewArgs {
    /// Extent with `--wkid` applied.
    pub fn extent(&self) -> Extent {
        let mut extent = self.extent;
        if let Some(wkid) = self.wkid {
            extent.wkid = wkid;
        }
        extent
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::new(self.extent(), self.size)
    }
}
