//! Payload shape rules per resource kind.
//!
//! | kind | payload |
//! |------|---------|
//! | VertexData | `{ attribute: [number, ...], ... }` (at least one attribute) |
//! | IndexData | `[non-negative integer, ...]` |
//! | Uniform | `{ name: number \| [number, ...] \| [{ field: number \| [number, ...] }, ...] }` |
//! | Texture | `{ sampler: image \| [image; 6] }` |

use prism_value::Value;

use super::image::SamplerImages;
use super::kind::ResourceKind;

/// Checks a whole payload against `kind`.
pub(crate) fn validate(kind: ResourceKind, payload: &Value) -> Result<(), String> {
    match kind {
        ResourceKind::IndexData => validate_indices(payload),
        _ => {
            let Some(map) = payload.as_object() else {
                return Err(format!("payload must be an object, found {}", payload.type_name()));
            };
            if kind == ResourceKind::VertexData && map.is_empty() {
                return Err("vertex data needs at least one attribute".to_string());
            }
            map.iter()
                .try_for_each(|(name, value)| validate_entry(kind, name, value))
        }
    }
}

/// Checks one top-level entry of an object payload.
pub(crate) fn validate_entry(kind: ResourceKind, name: &str, value: &Value) -> Result<(), String> {
    match kind {
        ResourceKind::VertexData => {
            if value.is_numeric_array() {
                Ok(())
            } else {
                Err(format!("attribute `{name}` must be a flat numeric array, found {}", describe(value)))
            }
        }
        ResourceKind::Uniform => validate_uniform(name, value),
        ResourceKind::Texture => SamplerImages::from_value(value)
            .map(|_| ())
            .map_err(|e| format!("sampler `{name}`: {e}")),
        ResourceKind::IndexData => validate_indices(value),
    }
}

fn validate_indices(value: &Value) -> Result<(), String> {
    let Some(items) = value.as_array() else {
        return Err(format!("index data must be an array, found {}", value.type_name()));
    };
    for (i, item) in items.iter().enumerate() {
        match item.as_number() {
            Some(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => {}
            _ => return Err(format!("index {i} must be a non-negative integer, found {}", describe(item))),
        }
    }
    Ok(())
}

fn validate_uniform(name: &str, value: &Value) -> Result<(), String> {
    match value {
        Value::Number(_) => Ok(()),
        v if v.is_numeric_array() => Ok(()),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let Some(fields) = item.as_object() else {
                    return Err(format!(
                        "uniform `{name}` mixes numbers and {} at element {i}",
                        item.type_name()
                    ));
                };
                for (field, v) in fields {
                    if !matches!(v, Value::Number(_)) && !v.is_numeric_array() {
                        return Err(format!(
                            "uniform `{name}[{i}].{field}` must be a number or numeric array, found {}",
                            describe(v)
                        ));
                    }
                }
            }
            Ok(())
        }
        other => Err(format!(
            "uniform `{name}` must be a number, numeric array or array of structs, found {}",
            describe(other)
        )),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Array(_) if !value.is_numeric_array() => "a mixed array",
        other => other.type_name(),
    }
}
