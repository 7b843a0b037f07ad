//! Typed builder for raster function definitions.

use serde_json::{Map, Value};

use super::serializer::RASTER_FUNCTION_KEY;

/// Predefined band arithmetic methods understood by the image service.
///
/// `UserDefined` evaluates the expression in `BandIndexes` verbatim; the
/// other methods take a comma separated list of band indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandArithmeticMethod {
    UserDefined,
    Ndvi,
    Savi,
    Msavi,
}

impl BandArithmeticMethod {
    /// Numeric code sent in the `Method` argument.
    pub fn code(self) -> u8 {
        match self {
            BandArithmeticMethod::UserDefined => 0,
            BandArithmeticMethod::Ndvi => 1,
            BandArithmeticMethod::Savi => 2,
            BandArithmeticMethod::Msavi => 4,
        }
    }
}

/// A server-side raster function, possibly chained over another function.
///
/// Converts into the nested JSON value accepted by
/// [`serialize_rendering_rule`](super::serialize_rendering_rule).
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFunction {
    name: String,
    arguments: Map<String, Value>,
    variable_name: Option<String>,
    output_pixel_type: Option<String>,
}

impl RasterFunction {
    /// References a function template published by the service, e.g. `"Agriculture"`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
            variable_name: None,
            output_pixel_type: None,
        }
    }

    /// Band math over the service's bands, e.g. `"(B5-B4)/(B5+B4)"`.
    pub fn band_arithmetic(expression: impl Into<String>, method: BandArithmeticMethod) -> Self {
        Self::named("BandArithmetic")
            .with_argument("Method", method.code())
            .with_argument("BandIndexes", expression.into())
            .with_variable_name("Raster")
    }

    /// Applies a named colour ramp to the output of `input`.
    pub fn colormap(colormap_name: impl Into<String>, input: RasterFunction) -> Self {
        Self::named("Colormap")
            .with_argument("colormapName", colormap_name.into())
            .with_argument("Raster", input.into_value())
            .with_variable_name("Raster")
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = Some(name.into());
        self
    }

    /// Overrides the pixel type of the function output (e.g. `"U8"`, `"F32"`).
    pub fn with_output_pixel_type(mut self, pixel_type: impl Into<String>) -> Self {
        self.output_pixel_type = Some(pixel_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the JSON object for this function and everything chained under it.
    pub fn into_value(self) -> Value {
        let mut object = Map::new();
        object.insert(RASTER_FUNCTION_KEY.to_string(), Value::String(self.name));
        if !self.arguments.is_empty() {
            object.insert(
                "rasterFunctionArguments".to_string(),
                Value::Object(self.arguments),
            );
        }
        if let Some(variable_name) = self.variable_name {
            object.insert("variableName".to_string(), Value::String(variable_name));
        }
        if let Some(pixel_type) = self.output_pixel_type {
            object.insert("outputPixelType".to_string(), Value::String(pixel_type));
        }
        Value::Object(object)
    }
}

impl From<RasterFunction> for Value {
    fn from(function: RasterFunction) -> Self {
        function.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering_rule::serialize_rendering_rule;
    use serde_json::json;

    #[test]
    fn test_named_function() {
        let value = RasterFunction::named("Agriculture").into_value();
        assert_eq!(value, json!({ "rasterFunction": "Agriculture" }));
    }

    #[test]
    fn test_band_arithmetic_arguments() {
        let value =
            RasterFunction::band_arithmetic("(B5-B4)/(B5+B4)", BandArithmeticMethod::UserDefined)
                .with_output_pixel_type("F32")
                .into_value();

        assert_eq!(
            value,
            json!({
                "rasterFunction": "BandArithmetic",
                "rasterFunctionArguments": { "Method": 0, "BandIndexes": "(B5-B4)/(B5+B4)" },
                "variableName": "Raster",
                "outputPixelType": "F32"
            })
        );
    }

    #[test]
    fn test_colormap_chain_serializes_function_first() {
        let ndvi = RasterFunction::band_arithmetic("5 4", BandArithmeticMethod::Ndvi);
        let rule = RasterFunction::colormap("NDVI", ndvi).into_value();

        let out = serialize_rendering_rule(&rule);
        assert!(out.starts_with(r#"{"rasterFunction":"Colormap","#));
        assert!(out.contains(
            r#""Raster":{"rasterFunction":"BandArithmetic","rasterFunctionArguments":{"BandIndexes":"5 4","Method":1}"#
        ));
    }

    #[test]
    fn test_method_codes() {
        assert_eq!(BandArithmeticMethod::UserDefined.code(), 0);
        assert_eq!(BandArithmeticMethod::Ndvi.code(), 1);
        assert_eq!(BandArithmeticMethod::Msavi.code(), 4);
    }
}
