//! Spatial types shared by the render pipeline.
//!
//! A render is always described by a map extent (in a projected coordinate
//! system identified by its WKID) plus the pixel size of the viewport that
//! will display the result.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Web Mercator (auxiliary sphere), the default map projection.
pub const WEB_MERCATOR_WKID: u32 = 3857;

/// Errors produced when parsing extents or viewport sizes from text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoParseError {
    /// Wrong number of comma/`x` separated components
    #[error("expected {expected} components, found {found}")]
    ComponentCount { expected: usize, found: usize },

    /// A component was not a number
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// Rectangular map extent in a single spatial reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    /// Well-known ID of the spatial reference the coordinates are in
    pub wkid: u32,
}

impl Extent {
    /// Creates a new extent in the given spatial reference.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64, wkid: u32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            wkid,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true when the extent covers no area or holds non-finite values.
    pub fn is_empty(&self) -> bool {
        let finite = [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Formats the extent as the `xmin,ymin,xmax,ymax` bbox parameter.
    pub fn bbox_param(&self) -> String {
        format!("{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

impl FromStr for Extent {
    type Err = GeoParseError;

    /// Parses `xmin,ymin,xmax,ymax` in Web Mercator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| {
                let p = p.trim();
                p.parse::<f64>()
                    .map_err(|_| GeoParseError::InvalidNumber(p.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [xmin, ymin, xmax, ymax] => Ok(Extent::new(
                *xmin,
                *ymin,
                *xmax,
                *ymax,
                WEB_MERCATOR_WKID,
            )),
            _ => Err(GeoParseError::ComponentCount {
                expected: 4,
                found: parts.len(),
            }),
        }
    }
}

/// Pixel dimensions of a viewport or output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ViewSize {
    pub width: u32,
    pub height: u32,
}

impl ViewSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-sized viewport has not been laid out yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Formats the size as the `width,height` size parameter.
    pub fn size_param(&self) -> String {
        format!("{},{}", self.width, self.height)
    }
}

impl fmt::Display for ViewSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ViewSize {
    type Err = GeoParseError;

    /// Parses `WIDTHxHEIGHT`, e.g. `800x600`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(['x', 'X']).collect();
        if parts.len() != 2 {
            return Err(GeoParseError::ComponentCount {
                expected: 2,
                found: parts.len(),
            });
        }
        let parse = |p: &str| {
            let p = p.trim();
            p.parse::<u32>()
                .map_err(|_| GeoParseError::InvalidNumber(p.to_string()))
        };
        Ok(ViewSize::new(parse(parts[0])?, parse(parts[1])?))
    }
}

/// Snapshot of what a map view currently shows.
///
/// `extent` is `None` until the view has been laid out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewState {
    pub extent: Option<Extent>,
    pub size: ViewSize,
}

impl ViewState {
    pub fn new(extent: Extent, size: ViewSize) -> Self {
        Self {
            extent: Some(extent),
            size,
        }
    }

    /// Returns the extent and size if the view can be rendered into.
    pub fn renderable(&self) -> Option<(Extent, ViewSize)> {
        match self.extent {
            Some(extent) if !extent.is_empty() && !self.size.is_empty() => {
                Some((extent, self.size))
            }
            _ => None,
        }
    }
}

/// Placement of a rendered image on the map.
///
/// The image covers exactly `extent` and was rendered at `size` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    pub extent: Extent,
    pub size: ViewSize,
}

impl Georeference {
    pub fn new(extent: Extent, size: ViewSize) -> Self {
        Self { extent, size }
    }

    /// Map units per pixel along x.
    pub fn resolution(&self) -> f64 {
        if self.size.width == 0 {
            return 0.0;
        }
        self.extent.width() / self.size.width as f64
    }
}
