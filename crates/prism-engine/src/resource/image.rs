use std::borrow::Cow;

use prism_value::Value;

/// Number of faces a cubemap sampler must provide (+X, -X, +Y, -Y, +Z, -Z).
pub const CUBE_FACES: usize = 6;

/// Texel filtering requested by an image descriptor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

/// Addressing mode requested by an image descriptor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Wrap {
    Repeat,
    #[default]
    Clamp,
    Mirror,
}

/// A decoded RGBA8 image read out of a texture payload.
///
/// Pixels are borrowed when the payload stores them as `Value::Bytes` and
/// converted when they are a numeric array.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: Cow<'a, [u8]>,
    pub filter: Filter,
    pub wrap: Wrap,
}

impl<'a> ImageDesc<'a> {
    /// Reads an image descriptor mapping:
    /// `{ width, height, data, filter?, wrap? }`.
    pub fn from_value(value: &'a Value) -> Result<Self, String> {
        let Some(map) = value.as_object() else {
            return Err(format!("image descriptor must be an object, found {}", value.type_name()));
        };

        let width = dimension(map.get("width"), "width")?;
        let height = dimension(map.get("height"), "height")?;

        let pixels: Cow<'a, [u8]> = match map.get("data") {
            Some(Value::Bytes(bytes)) => Cow::Borrowed(bytes.as_slice()),
            Some(Value::Array(items)) => Cow::Owned(
                items
                    .iter()
                    .map(|v| match v.as_number() {
                        Some(n) if n.fract() == 0.0 && (0.0..=255.0).contains(&n) => Ok(n as u8),
                        _ => Err("image data must contain integers in 0..=255".to_string()),
                    })
                    .collect::<Result<Vec<u8>, String>>()?,
            ),
            Some(other) => {
                return Err(format!("image data must be bytes or a numeric array, found {}", other.type_name()));
            }
            None => return Err("image descriptor is missing `data`".to_string()),
        };

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| format!("image size {width}x{height} is too large"))?;
        if pixels.len() != expected {
            return Err(format!(
                "image data has {} bytes, expected {expected} for {width}x{height} RGBA8",
                pixels.len()
            ));
        }

        let filter = match map.get("filter").map(|v| v.as_str()) {
            None => Filter::default(),
            Some(Some("linear")) => Filter::Linear,
            Some(Some("nearest")) => Filter::Nearest,
            Some(_) => return Err("image filter must be \"linear\" or \"nearest\"".to_string()),
        };

        let wrap = match map.get("wrap").map(|v| v.as_str()) {
            None => Wrap::default(),
            Some(Some("repeat")) => Wrap::Repeat,
            Some(Some("clamp")) => Wrap::Clamp,
            Some(Some("mirror")) => Wrap::Mirror,
            Some(_) => return Err("image wrap must be \"repeat\", \"clamp\" or \"mirror\"".to_string()),
        };

        Ok(Self { width, height, pixels, filter, wrap })
    }
}

fn dimension(value: Option<&Value>, name: &str) -> Result<u32, String> {
    match value.and_then(Value::as_number) {
        Some(n) if n.fract() == 0.0 && n >= 1.0 && n <= f64::from(u32::MAX) => Ok(n as u32),
        Some(_) => Err(format!("image {name} must be a positive integer")),
        None => Err(format!("image descriptor is missing numeric `{name}`")),
    }
}

/// Builds an image descriptor value from raw RGBA8 pixels.
pub fn image_value(width: u32, height: u32, pixels: Vec<u8>) -> Value {
    Value::object([
        ("width", Value::from(width)),
        ("height", Value::from(height)),
        ("data", Value::Bytes(pixels)),
    ])
}

/// The images a sampler entry resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerImages<'a> {
    Single(ImageDesc<'a>),
    /// Exactly [`CUBE_FACES`] equally sized square faces.
    Cube(Vec<ImageDesc<'a>>),
}

impl<'a> SamplerImages<'a> {
    pub fn from_value(value: &'a Value) -> Result<Self, String> {
        match value {
            Value::Array(faces) => {
                if faces.len() != CUBE_FACES {
                    return Err(format!("cubemap needs {CUBE_FACES} faces, found {}", faces.len()));
                }
                let faces = faces
                    .iter()
                    .map(ImageDesc::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                let (w, h) = (faces[0].width, faces[0].height);
                if faces.iter().any(|f| f.width != w || f.height != h) {
                    return Err("cubemap faces must all have the same size".to_string());
                }
                if w != h {
                    return Err(format!("cubemap faces must be square, found {w}x{h}"));
                }
                Ok(SamplerImages::Cube(faces))
            }
            other => ImageDesc::from_value(other).map(SamplerImages::Single),
        }
    }
}
