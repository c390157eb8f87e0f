use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::plugin::{ProgramDesc, TextureDimension};

use super::backend::{
    Backend, BufferHandle, BufferUsage, ClearState, DrawCall, IndexRange, ProgramHandle, TextureHandle,
    TextureUpload, Topology,
};

/// A draw as the headless backend recorded it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub program: ProgramHandle,
    pub vertex_buffers: Vec<BufferHandle>,
    pub index: Option<IndexRange>,
    pub vertex_count: u32,
    pub uniforms: Vec<u8>,
    pub textures: Vec<Option<TextureHandle>>,
    pub topology: Topology,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Clear(ClearState),
    CreateProgram(String),
    CreateBuffer { buffer: BufferHandle, usage: BufferUsage, len: usize },
    WriteBuffer { buffer: BufferHandle, len: usize },
    ReleaseBuffer(BufferHandle),
    CreateTexture { texture: TextureHandle, width: u32, height: u32, dimension: TextureDimension },
    ReleaseTexture(TextureHandle),
    Draw(RecordedDraw),
    Present,
    Resize { width: u32, height: u32 },
    Shutdown,
}

/// Backend without a GPU: keeps buffer contents in memory and records every
/// call. Used by tests and tooling.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    calls: Vec<BackendCall>,
    programs: HashMap<ProgramHandle, ProgramDesc>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, (u32, u32, TextureDimension)>,
    lost: bool,
    /// Buffer and texture creations left before they start failing.
    create_budget: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.calls.iter().filter_map(|c| match c {
            BackendCall::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// Buffer creations, buffer writes and texture creations recorded so far.
    pub fn upload_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    BackendCall::CreateBuffer { .. } | BackendCall::WriteBuffer { .. } | BackendCall::CreateTexture { .. }
                )
            })
            .count()
    }

    pub fn buffer(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn program(&self, program: ProgramHandle) -> Option<&ProgramDesc> {
        self.programs.get(&program)
    }

    /// Simulates an external context loss (or its end).
    pub fn set_context_lost(&mut self, lost: bool) {
        self.lost = lost;
    }

    /// Lets `successes` more buffer or texture creations through, then fails
    /// the rest with `Error::Backend`. `None` lifts the limit.
    pub fn fail_creates_after(&mut self, successes: Option<usize>) {
        self.create_budget = successes;
    }

    fn spend_create(&mut self) -> Result<()> {
        match &mut self.create_budget {
            Some(0) => Err(Error::Backend("out of device memory".to_string())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn alloc(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check(&self) -> Result<()> {
        if self.lost { Err(Error::ContextLost) } else { Ok(()) }
    }
}

impl Backend for HeadlessBackend {
    fn clear(&mut self, state: ClearState) -> Result<()> {
        self.check()?;
        self.calls.push(BackendCall::Clear(state));
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle> {
        self.check()?;
        let handle = ProgramHandle::new(self.alloc());
        self.programs.insert(handle, desc.clone());
        self.calls.push(BackendCall::CreateProgram(desc.label.clone()));
        Ok(handle)
    }

    fn create_buffer(&mut self, usage: BufferUsage, _label: Option<&str>, contents: &[u8]) -> Result<BufferHandle> {
        self.check()?;
        self.spend_create()?;
        let buffer = BufferHandle::new(self.alloc());
        self.buffers.insert(buffer, contents.to_vec());
        self.calls.push(BackendCall::CreateBuffer { buffer, usage, len: contents.len() });
        Ok(buffer)
    }

    fn write_buffer(&mut self, buffer: BufferHandle, contents: &[u8]) -> Result<()> {
        self.check()?;
        let Some(data) = self.buffers.get_mut(&buffer) else {
            return Err(Error::Backend(format!("unknown buffer {}", buffer.raw())));
        };
        data.clear();
        data.extend_from_slice(contents);
        self.calls.push(BackendCall::WriteBuffer { buffer, len: contents.len() });
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            self.calls.push(BackendCall::ReleaseBuffer(buffer));
        }
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureHandle> {
        self.check()?;
        upload.validate(u32::MAX)?;
        self.spend_create()?;
        let texture = TextureHandle::new(self.alloc());
        self.textures.insert(texture, (upload.width, upload.height, upload.dimension));
        self.calls.push(BackendCall::CreateTexture {
            texture,
            width: upload.width,
            height: upload.height,
            dimension: upload.dimension,
        });
        Ok(texture)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            self.calls.push(BackendCall::ReleaseTexture(texture));
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        self.check()?;
        if !self.programs.contains_key(&call.program) {
            return Err(Error::Backend(format!("unknown program {}", call.program.raw())));
        }
        self.calls.push(BackendCall::Draw(RecordedDraw {
            program: call.program,
            vertex_buffers: call.vertex_buffers.clone(),
            index: call.index,
            vertex_count: call.vertex_count,
            uniforms: call.uniforms.to_vec(),
            textures: call.textures.clone(),
            topology: call.topology,
        }));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.check()?;
        self.calls.push(BackendCall::Present);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(BackendCall::Resize { width, height });
    }

    fn is_context_lost(&self) -> bool {
        self.lost
    }

    fn shutdown(&mut self) {
        self.lost = true;
        self.programs.clear();
        self.buffers.clear();
        self.textures.clear();
        self.calls.push(BackendCall::Shutdown);
    }
}
