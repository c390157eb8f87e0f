use std::collections::BTreeMap;

use crate::error::PathError;
use crate::path::{Path, Segment, ToPath};

/// A nested payload value.
///
/// Mappings iterate in key order, so anything derived from a payload
/// (packing, hashing, logging) is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// Raw byte buffer, e.g. decoded RGBA8 pixels.
    Bytes(Vec<u8>),
}

impl Value {
    /// Builds a mapping from `(key, value)` pairs.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a sequence from anything convertible to values.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// True for a sequence whose every element is a number (empty included).
    pub fn is_numeric_array(&self) -> bool {
        match self {
            Value::Array(items) => items.iter().all(|v| matches!(v, Value::Number(_))),
            _ => false,
        }
    }

    /// Flattens a number or numeric sequence into `f32` components.
    ///
    /// Returns `None` for anything else.
    pub fn to_f32_vec(&self) -> Option<Vec<f32>> {
        match self {
            Value::Number(n) => Some(vec![*n as f32]),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_number().map(|n| n as f32))
                .collect(),
            _ => None,
        }
    }

    // ── Path resolution ───────────────────────────────────────────────────

    /// Resolves `path` and returns a reference to the addressed value.
    pub fn get<P>(&self, path: &P) -> Result<&Value, PathError>
    where
        P: ToPath + ?Sized,
    {
        let path = path.to_path()?;
        let mut current = self;
        for (depth, seg) in path.segments().iter().enumerate() {
            current = step(current, seg, &path, depth)?;
        }
        Ok(current)
    }

    /// Resolves `path` and returns a mutable reference to the addressed value.
    ///
    /// Never creates keys or elements.
    pub fn get_mut<P>(&mut self, path: &P) -> Result<&mut Value, PathError>
    where
        P: ToPath + ?Sized,
    {
        let path = path.to_path()?;
        resolve_mut(self, &path, path.segments().len())
    }

    /// Replaces the value addressed by `path` with `new_value`.
    ///
    /// Returns the previous value, or `None` when the final segment is an index
    /// equal to the sequence length and the value was appended. The path is
    /// fully parsed and resolved before anything is written, so on error the
    /// tree is left exactly as it was.
    pub fn set<P>(&mut self, path: &P, new_value: Value) -> Result<Option<Value>, PathError>
    where
        P: ToPath + ?Sized,
    {
        let path = path.to_path()?;
        let Some(last) = path.segments().last() else {
            return Ok(Some(std::mem::replace(self, new_value)));
        };
        let depth = path.segments().len() - 1;
        let parent = resolve_mut(self, &path, depth)?;

        match (last, parent) {
            (Segment::Field(key), Value::Object(map)) => match map.get_mut(key) {
                Some(slot) => Ok(Some(std::mem::replace(slot, new_value))),
                None => Err(not_found(&path, depth)),
            },
            (Segment::Index(i), Value::Array(items)) => {
                if *i < items.len() {
                    Ok(Some(std::mem::replace(&mut items[*i], new_value)))
                } else if *i == items.len() {
                    items.push(new_value);
                    Ok(None)
                } else {
                    Err(not_found(&path, depth))
                }
            }
            (seg, other) => Err(type_mismatch(&path, depth, seg, other)),
        }
    }
}

fn step<'v>(current: &'v Value, seg: &Segment, path: &Path, depth: usize) -> Result<&'v Value, PathError> {
    match (seg, current) {
        (Segment::Field(key), Value::Object(map)) => {
            map.get(key).ok_or_else(|| not_found(path, depth))
        }
        (Segment::Index(i), Value::Array(items)) => {
            items.get(*i).ok_or_else(|| not_found(path, depth))
        }
        (seg, other) => Err(type_mismatch(path, depth, seg, other)),
    }
}

fn resolve_mut<'v>(root: &'v mut Value, path: &Path, len: usize) -> Result<&'v mut Value, PathError> {
    let mut current = root;
    for (depth, seg) in path.segments()[..len].iter().enumerate() {
        current = match (seg, current) {
            (Segment::Field(key), Value::Object(map)) => {
                map.get_mut(key).ok_or_else(|| not_found(path, depth))?
            }
            (Segment::Index(i), Value::Array(items)) => {
                items.get_mut(*i).ok_or_else(|| not_found(path, depth))?
            }
            (seg, other) => return Err(type_mismatch(path, depth, seg, other)),
        };
    }
    Ok(current)
}

fn not_found(path: &Path, depth: usize) -> PathError {
    PathError::NotFound {
        path: path.as_str().to_string(),
        segment: path.prefix(depth + 1),
    }
}

fn type_mismatch(path: &Path, depth: usize, seg: &Segment, found: &Value) -> PathError {
    PathError::Type {
        path: path.as_str().to_string(),
        segment: path.prefix(depth + 1),
        expected: match seg {
            Segment::Field(_) => "object",
            Segment::Index(_) => "array",
        },
        found: found.type_name(),
    }
}

// ── Conversions ───────────────────────────────────────────────────────────

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}
