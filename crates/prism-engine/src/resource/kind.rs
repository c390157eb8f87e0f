use std::fmt;

/// What a resource payload is destined to become on the GPU.
///
/// Fixed at creation; the renderer picks the upload strategy from it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    /// Named vertex attributes, each a flat numeric array.
    VertexData,
    /// A flat array of vertex indices.
    IndexData,
    /// Named uniform variables.
    Uniform,
    /// Named samplers, each an image or a set of cubemap faces.
    Texture,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::VertexData => "vertex data",
            ResourceKind::IndexData => "index data",
            ResourceKind::Uniform => "uniform",
            ResourceKind::Texture => "texture",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
