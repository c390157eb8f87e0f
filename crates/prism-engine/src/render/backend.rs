use crate::error::{Error, Result};
use crate::plugin::{ProgramDesc, TextureDimension};
use crate::resource::{Filter, Wrap};

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(u64);

        impl $name {
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

handle!(
    /// Backend-owned GPU buffer.
    BufferHandle
);
handle!(
    /// Backend-owned sampled texture (with its sampler).
    TextureHandle
);
handle!(
    /// Backend-owned program (pipeline plus binding layouts).
    ProgramHandle
);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// `f32` vertex attribute data.
    Vertex,
    /// `u32` indices.
    Index,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

/// Baseline the output is reset to by `clear`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearState {
    pub color: [f64; 4],
    pub depth: f32,
}

/// RGBA8 texture contents: one layer for 2D, six for a cubemap.
#[derive(Debug, Clone)]
pub struct TextureUpload<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub dimension: TextureDimension,
    pub layers: Vec<&'a [u8]>,
    pub filter: Filter,
    pub wrap: Wrap,
}

impl TextureUpload<'_> {
    /// Checks the layer count, cube squareness and `max_dimension`.
    pub fn validate(&self, max_dimension: u32) -> Result<()> {
        let expected = match self.dimension {
            TextureDimension::D2 => 1,
            TextureDimension::Cube => 6,
        };
        if self.layers.len() != expected {
            return Err(Error::Backend(format!(
                "{:?} texture needs {expected} layers, got {}",
                self.dimension,
                self.layers.len()
            )));
        }
        if self.dimension == TextureDimension::Cube && self.width != self.height {
            return Err(Error::Backend(format!("cube faces must be square, got {}x{}", self.width, self.height)));
        }
        if self.width > max_dimension || self.height > max_dimension {
            return Err(Error::Backend(format!(
                "texture {}x{} exceeds the device limit of {max_dimension}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IndexRange {
    pub buffer: BufferHandle,
    pub count: u32,
}

/// One draw, fully resolved to backend handles.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub program: ProgramHandle,
    /// One buffer per declared attribute, in declaration order.
    pub vertex_buffers: Vec<BufferHandle>,
    pub index: Option<IndexRange>,
    /// Vertex count for non-indexed draws.
    pub vertex_count: u32,
    /// Packed uniform block.
    pub uniforms: &'a [u8],
    /// One entry per declared texture; `None` selects the fallback texture.
    pub textures: Vec<Option<TextureHandle>>,
    pub topology: Topology,
}

/// GPU-facing side of the renderer.
///
/// Implementations own every GPU object and hand out opaque handles. After
/// the context is lost every method may fail with `Error::ContextLost` and
/// all previously issued handles are invalid.
pub trait Backend {
    /// Resets the output for a new frame.
    fn clear(&mut self, state: ClearState) -> Result<()>;

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle>;

    fn create_buffer(&mut self, usage: BufferUsage, label: Option<&str>, contents: &[u8]) -> Result<BufferHandle>;

    /// Replaces the buffer contents, growing it when needed.
    fn write_buffer(&mut self, buffer: BufferHandle, contents: &[u8]) -> Result<()>;

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureHandle>;

    fn release_texture(&mut self, texture: TextureHandle);

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;

    /// Finishes the frame.
    fn present(&mut self) -> Result<()> {
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn is_context_lost(&self) -> bool {
        false
    }

    /// Drops every GPU object and the output surface. The backend is lost
    /// afterwards.
    fn shutdown(&mut self) {}
}
