//! Runtime std140-compatible packing of the uniform block.
//!
//! Rules (matching the WGSL uniform address space for these types):
//!
//! | type | align | size |
//! |------|-------|------|
//! | `float` | 4 | 4 |
//! | `vec2` | 8 | 8 |
//! | `vec3` | 16 | 12 |
//! | `vec4` | 16 | 16 |
//! | `mat4` | 16 | 64 |
//! | `struct[N]` | 16 | stride × N, stride = struct size rounded to 16 |
//!
//! The block size is rounded up to 16 bytes (minimum 16).

use std::collections::BTreeMap;

use crate::plugin::{UniformDecl, UniformType};

use super::uniforms::UniformValue;

const BLOCK_ALIGN: usize = 16;

fn round_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

fn align_of(ty: &UniformType) -> usize {
    match ty {
        UniformType::Float => 4,
        UniformType::Vec2 => 8,
        UniformType::Vec3 | UniformType::Vec4 | UniformType::Mat4 => 16,
        UniformType::StructArray { .. } => BLOCK_ALIGN,
    }
}

fn size_of(ty: &UniformType) -> usize {
    match ty {
        UniformType::Float => 4,
        UniformType::Vec2 => 8,
        UniformType::Vec3 => 12,
        UniformType::Vec4 => 16,
        UniformType::Mat4 => 64,
        UniformType::StructArray { fields, len } => struct_layout(fields).1 * len,
    }
}

/// Field offsets and array stride of a struct.
fn struct_layout(fields: &[(String, UniformType)]) -> (Vec<usize>, usize) {
    let mut offset = 0;
    let mut offsets = Vec::with_capacity(fields.len());
    for (_, ty) in fields {
        offset = round_up(offset, align_of(ty));
        offsets.push(offset);
        offset += size_of(ty);
    }
    (offsets, round_up(offset.max(1), BLOCK_ALIGN))
}

/// Member offsets and total size of a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub offsets: Vec<usize>,
    pub size: usize,
}

pub fn layout(decls: &[UniformDecl]) -> BlockLayout {
    let mut offset = 0;
    let mut offsets = Vec::with_capacity(decls.len());
    for decl in decls {
        offset = round_up(offset, align_of(&decl.ty));
        offsets.push(offset);
        offset += size_of(&decl.ty);
    }
    BlockLayout {
        offsets,
        size: round_up(offset.max(1), BLOCK_ALIGN),
    }
}

/// A packed block plus the declared members no value was supplied for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Packed {
    pub bytes: Vec<u8>,
    pub missing: Vec<String>,
}

/// A supplied value that does not fit its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PackError {
    pub uniform: String,
    pub reason: String,
}

/// Packs `values` into a block laid out for `decls`.
///
/// Members without a value stay zeroed. Values that are not declared are
/// ignored.
pub(crate) fn pack(decls: &[UniformDecl], values: &BTreeMap<&str, &UniformValue>) -> Result<Packed, PackError> {
    let block = layout(decls);
    let mut bytes = vec![0u8; block.size];
    let mut missing = Vec::new();

    for (decl, &offset) in decls.iter().zip(&block.offsets) {
        let Some(value) = values.get(decl.name.as_str()) else {
            missing.push(decl.name.clone());
            continue;
        };
        let fail = |reason: String| PackError { uniform: decl.name.clone(), reason };

        match (&decl.ty, value) {
            (UniformType::StructArray { fields, len }, UniformValue::Structs(items)) => {
                if items.len() > *len {
                    return Err(fail(format!("{} elements given, {len} declared", items.len())));
                }
                let (field_offsets, stride) = struct_layout(fields);
                for (i, item) in items.iter().enumerate() {
                    for (field, floats) in item {
                        let Some(f) = fields.iter().position(|(name, _)| name == field) else {
                            return Err(fail(format!("element {i} has undeclared field `{field}`")));
                        };
                        let expected = fields[f].1.components().unwrap_or(0);
                        if floats.len() != expected {
                            return Err(fail(format!(
                                "`{field}` of element {i} has {} components, expected {expected}",
                                floats.len()
                            )));
                        }
                        write(&mut bytes, offset + i * stride + field_offsets[f], floats);
                    }
                }
            }
            // An empty sequence carries no element type; it is zero structs.
            (UniformType::StructArray { .. }, UniformValue::Floats(floats)) if floats.is_empty() => {}
            (UniformType::StructArray { .. }, UniformValue::Floats(_)) => {
                return Err(fail("expected a sequence of structs, got numbers".to_string()));
            }
            (ty, UniformValue::Floats(floats)) => {
                let expected = ty.components().unwrap_or(0);
                if floats.len() != expected {
                    return Err(fail(format!("{} components given, expected {expected}", floats.len())));
                }
                write(&mut bytes, offset, floats);
            }
            (_, UniformValue::Structs(_)) => {
                return Err(fail("expected numbers, got a sequence of structs".to_string()));
            }
        }
    }

    Ok(Packed { bytes, missing })
}

fn write(bytes: &mut [u8], offset: usize, floats: &[f32]) {
    let src: &[u8] = bytemuck::cast_slice(floats);
    bytes[offset..offset + src.len()].copy_from_slice(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, ty: UniformType) -> UniformDecl {
        UniformDecl { name: name.to_string(), ty }
    }

    fn light() -> UniformType {
        UniformType::StructArray {
            fields: vec![
                ("direction".to_string(), UniformType::Vec3),
                ("strength".to_string(), UniformType::Float),
                ("color".to_string(), UniformType::Vec3),
            ],
            len: 2,
        }
    }

    fn read(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    #[test]
    fn offsets_follow_alignment() {
        let l = layout(&[
            decl("a", UniformType::Float),
            decl("b", UniformType::Vec3),
            decl("c", UniformType::Float),
            decl("d", UniformType::Vec2),
            decl("e", UniformType::Mat4),
        ]);
        assert_eq!(l.offsets, vec![0, 16, 28, 32, 48]);
        assert_eq!(l.size, 112);
    }

    #[test]
    fn struct_arrays_use_rounded_stride() {
        let l = layout(&[decl("u_Camera", UniformType::Vec3), decl("u_Lights", light()), decl("x", UniformType::Float)]);
        // light: direction 0..12, strength 12..16, color 16..28 -> stride 32
        assert_eq!(l.offsets, vec![0, 16, 80]);
        assert_eq!(l.size, 96);
    }

    #[test]
    fn empty_block_is_sixteen_bytes() {
        assert_eq!(layout(&[]).size, 16);
    }

    #[test]
    fn packs_values_and_reports_missing() {
        let decls = [decl("u_Camera", UniformType::Vec3), decl("u_Lights", light()), decl("u_Exposure", UniformType::Float)];
        let camera = UniformValue::Floats(vec![1.0, 2.0, 3.0]);
        let lights = UniformValue::Structs(vec![
            BTreeMap::from([("strength".to_string(), vec![4.0])]),
            BTreeMap::from([("color".to_string(), vec![5.0, 6.0, 7.0])]),
        ]);
        let values = BTreeMap::from([("u_Camera", &camera), ("u_Lights", &lights)]);

        let packed = pack(&decls, &values).unwrap();
        assert_eq!(packed.missing, vec!["u_Exposure".to_string()]);
        assert_eq!(read(&packed.bytes, 8), 3.0);
        assert_eq!(read(&packed.bytes, 16 + 12), 4.0);
        assert_eq!(read(&packed.bytes, 16 + 32 + 16), 5.0);
        assert_eq!(read(&packed.bytes, 16 + 32 + 24), 7.0);
        assert_eq!(read(&packed.bytes, 80), 0.0);
    }

    #[test]
    fn component_mismatch_is_rejected() {
        let decls = [decl("u_Camera", UniformType::Vec3)];
        let short = UniformValue::Floats(vec![1.0, 2.0]);
        let e = pack(&decls, &BTreeMap::from([("u_Camera", &short)])).unwrap_err();
        assert_eq!(e.uniform, "u_Camera");
    }

    #[test]
    fn empty_sequence_packs_as_zero_structs() {
        let decls = [decl("u_Lights", light())];
        let empty = UniformValue::Floats(Vec::new());
        let packed = pack(&decls, &BTreeMap::from([("u_Lights", &empty)])).unwrap();
        assert!(packed.missing.is_empty());
        assert!(packed.bytes.iter().all(|&b| b == 0));

        let numbers = UniformValue::Floats(vec![1.0]);
        assert!(pack(&decls, &BTreeMap::from([("u_Lights", &numbers)])).is_err());
    }

    #[test]
    fn too_many_struct_elements_is_rejected() {
        let decls = [decl("u_Lights", light())];
        let three = UniformValue::Structs(vec![BTreeMap::new(); 3]);
        assert!(pack(&decls, &BTreeMap::from([("u_Lights", &three)])).is_err());
    }
}
