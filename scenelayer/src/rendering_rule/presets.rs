//! Built-in renderers offered for every scene.
//!
//! Most presets reference function templates published by the Landsat
//! imagery service; the index renderers are assembled client-side from band
//! arithmetic and a colour ramp.

use super::function::{BandArithmeticMethod, RasterFunction};

/// A named renderer shown in the renderer picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "Agriculture",
        description: "Bands shortwave IR-1, near-IR, blue (6, 5, 2) with dynamic range adjustment",
    },
    Preset {
        name: "Natural Color",
        description: "Natural color bands red, green, blue (4, 3, 2)",
    },
    Preset {
        name: "Color Infrared",
        description: "Bands near-IR, red, green (5, 4, 3) highlighting healthy vegetation",
    },
    Preset {
        name: "Short-wave Infrared",
        description: "Bands shortwave IR-2, shortwave IR-1, red (7, 6, 4)",
    },
    Preset {
        name: "Geology",
        description: "Bands shortwave IR-2, shortwave IR-1, blue (7, 6, 2)",
    },
    Preset {
        name: "Bathymetric",
        description: "Bands red, green, coastal (4, 3, 1)",
    },
    Preset {
        name: "NDVI Colorized",
        description: "Normalized difference vegetation index (5 - 4)/(5 + 4) with colormap",
    },
    Preset {
        name: "MNDWI Colorized",
        description: "Modified normalized difference water index (3 - 6)/(3 + 6) with colormap",
    },
];

/// Returns the raster function for a preset, matched case-insensitively.
pub fn preset(name: &str) -> Option<RasterFunction> {
    let preset = PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))?;

    let function = match preset.name {
        "NDVI Colorized" => ndvi_colorized(),
        "MNDWI Colorized" => RasterFunction::colormap(
            "Blue_Bright",
            RasterFunction::band_arithmetic("(B3-B6)/(B3+B6)", BandArithmeticMethod::UserDefined)
                .with_output_pixel_type("F32"),
        ),
        other => RasterFunction::named(other),
    };
    Some(function)
}

/// Vegetation index with the service's NDVI colour ramp.
pub fn ndvi_colorized() -> RasterFunction {
    RasterFunction::colormap(
        "NDVI",
        RasterFunction::band_arithmetic("(B5-B4)/(B5+B4)", BandArithmeticMethod::UserDefined)
            .with_output_pixel_type("F32"),
    )
}
