//! Order-preserving JSON writer for rendering rules.

use serde_json::Value;

/// Key the image service requires to appear first in every function object.
pub const RASTER_FUNCTION_KEY: &str = "rasterFunction";

/// Serializes a rendering rule, emitting `rasterFunction` first in every object.
///
/// Arrays are written element-wise and the rule is applied at every nesting
/// depth, so a function nested under `rasterFunctionArguments` is ordered the
/// same way as the outer one. Remaining keys follow in the map's own order.
/// Scalars use standard JSON encoding. The output has no whitespace.
pub fn serialize_rendering_rule(rule: &Value) -> String {
    let mut out = String::new();
    write_value(rule, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            let mut first = true;
            if let Some(function) = map.get(RASTER_FUNCTION_KEY) {
                write_entry(RASTER_FUNCTION_KEY, function, out);
                first = false;
            }
            for (key, item) in map.iter().filter(|(k, _)| *k != RASTER_FUNCTION_KEY) {
                if !first {
                    out.push(',');
                }
                write_entry(key, item, out);
                first = false;
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_entry(key: &str, value: &Value, out: &mut String) {
    out.push_str(&Value::from(key).to_string());
    out.push(':');
    write_value(value, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_scalars_use_standard_encoding() {
        assert_eq!(serialize_rendering_rule(&json!(null)), "null");
        assert_eq!(serialize_rendering_rule(&json!(true)), "true");
        assert_eq!(serialize_rendering_rule(&json!(42)), "42");
        assert_eq!(serialize_rendering_rule(&json!(-1.5)), "-1.5");
        assert_eq!(
            serialize_rendering_rule(&json!("a\"b\\c\nd")),
            r#""a\"b\\c\nd""#
        );
    }

    #[test]
    fn test_top_level_and_nested_ordering() {
        let rule = json!({
            "a": 1,
            "rasterFunction": "X",
            "b": { "c": 2, "rasterFunction": "Y" }
        });

        assert_eq!(
            serialize_rendering_rule(&rule),
            r#"{"rasterFunction":"X","a":1,"b":{"rasterFunction":"Y","c":2}}"#
        );
    }

    #[test]
    fn test_function_chained_under_arguments() {
        let rule = json!({
            "rasterFunctionArguments": {
                "Raster": {
                    "rasterFunctionArguments": { "BandIndexes": "(B5-B4)/(B5+B4)", "Method": 0 },
                    "rasterFunction": "BandArithmetic"
                },
                "colormapName": "NDVI"
            },
            "rasterFunction": "Colormap"
        });

        let out = serialize_rendering_rule(&rule);
        assert!(out.starts_with(r#"{"rasterFunction":"Colormap""#));
        assert!(out.contains(r#""Raster":{"rasterFunction":"BandArithmetic","#));
    }

    #[test]
    fn test_arrays_order_each_element() {
        let rule = json!([
            { "z": 1, "rasterFunction": "A" },
            [ { "y": 2, "rasterFunction": "B" } ],
            3
        ]);

        assert_eq!(
            serialize_rendering_rule(&rule),
            r#"[{"rasterFunction":"A","z":1},[{"rasterFunction":"B","y":2}],3]"#
        );
    }

    #[test]
    fn test_object_without_function_key() {
        assert_eq!(serialize_rendering_rule(&json!({})), "{}");
        assert_eq!(
            serialize_rendering_rule(&json!({"b": [], "a": "x"})),
            r#"{"a":"x","b":[]}"#
        );
    }

    #[test]
    fn test_non_string_function_value_still_first() {
        let rule = json!({ "a": 1, "rasterFunction": { "b": 2, "rasterFunction": null } });
        assert_eq!(
            serialize_rendering_rule(&rule),
            r#"{"rasterFunction":{"rasterFunction":null,"b":2},"a":1}"#
        );
    }

    fn arb_rule() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z \"\\\\]{0,6}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 48, 5, |inner| {
            let key = prop_oneof![
                3 => "[a-z]{1,6}",
                1 => Just(RASTER_FUNCTION_KEY.to_string()),
            ];
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec((key, inner), 0..5)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    fn function_objects<'a>(value: &'a Value, found: &mut Vec<&'a Value>) {
        match value {
            Value::Array(items) => items.iter().for_each(|v| function_objects(v, found)),
            Value::Object(map) => {
                if map.contains_key(RASTER_FUNCTION_KEY) {
                    found.push(value);
                }
                map.values().for_each(|v| function_objects(v, found));
            }
            _ => {}
        }
    }

    proptest! {
        #[test]
        fn prop_output_is_equivalent_json(rule in arb_rule()) {
            let out = serialize_rendering_rule(&rule);
            let parsed: Value = serde_json::from_str(&out).unwrap();
            prop_assert_eq!(parsed, rule);
        }

        #[test]
        fn prop_function_key_first_at_every_depth(rule in arb_rule()) {
            let out = serialize_rendering_rule(&rule);
            let mut objects = Vec::new();
            function_objects(&rule, &mut objects);

            for object in objects {
                let fragment = serialize_rendering_rule(object);
                prop_assert!(
                    fragment.starts_with("{\"rasterFunction\":"),
                    "rasterFunction is not the first key in {}",
                    fragment
                );
                prop_assert!(out.contains(&fragment));
            }
        }
    }
}
