//! Rendering rules for the remote image service.
//!
//! A rendering rule describes a server-side raster transform (band math,
//! colour mapping, function chaining). The service reads the rule from a
//! JSON string parameter and is sensitive to field order: every object that
//! carries a `rasterFunction` key must list it first. A standard encoder
//! makes no such promise, so rules are written with
//! [`serialize_rendering_rule`].
//!
//! # Example
//!
//! ```
//! use scenelayer::rendering_rule::{serialize_rendering_rule, RasterFunction};
//!
//! let rule = RasterFunction::named("Agriculture").into_value();
//! assert_eq!(serialize_rendering_rule(&rule), r#"{"rasterFunction":"Agriculture"}"#);
//! ```

mod function;
pub mod presets;
mod serializer;

pub use function::{BandArithmeticMethod, RasterFunction};
pub use serializer::{serialize_rendering_rule, RASTER_FUNCTION_KEY};
