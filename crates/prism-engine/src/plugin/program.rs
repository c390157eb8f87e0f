use std::borrow::Cow;

/// A vertex attribute the shader reads, in `@location` order.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    /// Float components per vertex (1..=4).
    pub components: u32,
}

/// Layout type of one member of the uniform block.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    /// Fixed-length array of structs; each field is a non-struct type.
    StructArray {
        fields: Vec<(String, UniformType)>,
        len: usize,
    },
}

impl UniformType {
    /// Float components of a non-struct type.
    pub fn components(&self) -> Option<usize> {
        match self {
            UniformType::Float => Some(1),
            UniformType::Vec2 => Some(2),
            UniformType::Vec3 => Some(3),
            UniformType::Vec4 => Some(4),
            UniformType::Mat4 => Some(16),
            UniformType::StructArray { .. } => None,
        }
    }
}

/// One member of the uniform block, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub ty: UniformType,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureDimension {
    D2,
    Cube,
}

/// A sampled texture the shader reads.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDecl {
    pub name: String,
    pub dimension: TextureDimension,
}

/// Everything a backend needs to build a plugin's GPU program.
///
/// Shader interface conventions (WGSL):
/// - entry points `vs_main` / `fs_main`
/// - attribute `i` at `@location(i)`, one vertex buffer per attribute
/// - the uniform block at `@group(0) @binding(0)` (std140-compatible layout)
/// - texture `i` at `@group(1) @binding(2 * i)`, its sampler at `2 * i + 1`
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDesc {
    pub label: String,
    pub shader: Cow<'static, str>,
    pub attributes: Vec<AttributeDecl>,
    pub uniforms: Vec<UniformDecl>,
    pub textures: Vec<TextureDecl>,
}

impl ProgramDesc {
    pub fn new(label: impl Into<String>, shader: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            shader: shader.into(),
            attributes: Vec::new(),
            uniforms: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, components: u32) -> Self {
        self.attributes.push(AttributeDecl { name: name.into(), components });
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, ty: UniformType) -> Self {
        self.uniforms.push(UniformDecl { name: name.into(), ty });
        self
    }

    pub fn texture(mut self, name: impl Into<String>, dimension: TextureDimension) -> Self {
        self.textures.push(TextureDecl { name: name.into(), dimension });
        self
    }
}
