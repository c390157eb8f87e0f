use std::collections::BTreeMap;

use prism_value::Value;

/// A uniform variable flattened to `f32` components.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UniformValue {
    /// Scalar, vector or matrix (column-major, as given).
    Floats(Vec<f32>),
    /// Sequence of structs; fields are flattened the same way.
    Structs(Vec<BTreeMap<String, Vec<f32>>>),
}

/// Flattens a validated uniform payload.
pub(crate) fn flatten(payload: &Value) -> BTreeMap<String, UniformValue> {
    let Some(map) = payload.as_object() else {
        return BTreeMap::new();
    };

    map.iter()
        .map(|(name, value)| (name.clone(), flatten_entry(value)))
        .collect()
}

fn flatten_entry(value: &Value) -> UniformValue {
    if let Some(floats) = value.to_f32_vec() {
        return UniformValue::Floats(floats);
    }

    let structs = value
        .as_array()
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(field, v)| (field.clone(), v.to_f32_vec().unwrap_or_default()))
                .collect()
        })
        .collect();
    UniformValue::Structs(structs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_each_shape() {
        let payload = Value::object([
            ("u_Metallic", Value::from(0.5)),
            ("u_Camera", Value::from([0, 1, 2])),
            (
                "u_Lights",
                Value::array([Value::object([
                    ("strength", Value::from(2)),
                    ("color", Value::from([1, 0, 0])),
                ])]),
            ),
        ]);
        let flat = flatten(&payload);

        assert_eq!(flat["u_Metallic"], UniformValue::Floats(vec![0.5]));
        assert_eq!(flat["u_Camera"], UniformValue::Floats(vec![0.0, 1.0, 2.0]));
        let UniformValue::Structs(lights) = &flat["u_Lights"] else {
            panic!("expected structs");
        };
        assert_eq!(lights[0]["strength"], vec![2.0]);
        assert_eq!(lights[0]["color"], vec![1.0, 0.0, 0.0]);
    }
}
