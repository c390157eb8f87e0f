use std::collections::{BTreeMap, HashMap};

use prism_value::Value;

use crate::error::{Error, Result};
use crate::plugin::TextureDimension;
use crate::resource::{Resource, ResourceId, ResourceKind, SamplerImages};

use super::backend::{Backend, BufferHandle, BufferUsage, IndexRange, TextureHandle, TextureUpload};
use super::uniforms::{self, UniformValue};
use super::RenderStats;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct VertexBuffer {
    pub buffer: BufferHandle,
    /// Number of `f32` values in the buffer.
    pub floats: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct GpuTexture {
    pub handle: TextureHandle,
    pub dimension: TextureDimension,
}

/// What a resource became on the backend.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GpuPayload {
    Vertex(BTreeMap<String, VertexBuffer>),
    Index(IndexRange),
    /// Uniforms stay CPU-side; they are packed into the block per draw.
    Uniform(BTreeMap<String, UniformValue>),
    Texture(BTreeMap<String, GpuTexture>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GpuEntry {
    pub version: u64,
    pub payload: GpuPayload,
}

/// GPU copies of resources, keyed by resource identity.
#[derive(Debug, Default)]
pub(crate) struct ResourceCache {
    entries: HashMap<ResourceId, GpuEntry>,
}

impl ResourceCache {
    pub fn get(&self, id: ResourceId) -> Option<&GpuEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Uploads `resource` unless the cached copy is current.
    ///
    /// Returns `true` when an upload happened.
    pub fn ensure(&mut self, backend: &mut dyn Backend, resource: &Resource, stats: &mut RenderStats) -> Result<bool> {
        let id = resource.id();
        let current = matches!(self.entries.get(&id), Some(e) if e.version == resource.version());
        if current && !resource.is_dirty() {
            return Ok(false);
        }

        log::debug!(
            "uploading {} resource {id}{} (version {})",
            resource.kind(),
            resource.label().map(|l| format!(" `{l}`")).unwrap_or_default(),
            resource.version()
        );

        let previous = self.entries.remove(&id).map(|e| e.payload);
        let payload = upload(backend, resource, previous)?;
        self.entries.insert(id, GpuEntry { version: resource.version(), payload });

        resource.mark_clean();
        stats.uploads += 1;
        Ok(true)
    }

    /// Releases the GPU objects of one resource.
    pub fn release(&mut self, backend: &mut dyn Backend, id: ResourceId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                release_payload(backend, entry.payload);
                true
            }
            None => false,
        }
    }

    /// Drops every entry without touching the backend; used after context loss
    /// when the handles are already invalid.
    pub fn forget_all(&mut self) {
        self.entries.clear();
    }
}

/// Uploads `resource`, reusing the buffers of `previous` where it can.
///
/// On failure every handle of `previous` and every handle created so far is
/// released, so the backend holds nothing for the resource afterwards.
fn upload(backend: &mut dyn Backend, resource: &Resource, previous: Option<GpuPayload>) -> Result<GpuPayload> {
    let label = resource.label();
    match resource.kind() {
        ResourceKind::VertexData => {
            let mut old = match previous {
                Some(GpuPayload::Vertex(map)) => map,
                Some(other) => {
                    release_payload(backend, other);
                    BTreeMap::new()
                }
                None => BTreeMap::new(),
            };
            let mut buffers = BTreeMap::new();
            let written = upload_vertex(backend, resource, &mut old, &mut buffers);
            for stale in old.into_values() {
                backend.release_buffer(stale.buffer);
            }
            match written {
                Ok(()) => Ok(GpuPayload::Vertex(buffers)),
                Err(e) => {
                    release_payload(backend, GpuPayload::Vertex(buffers));
                    Err(e)
                }
            }
        }

        ResourceKind::IndexData => {
            let indices: Vec<u32> = resource
                .payload()
                .as_array()
                .unwrap_or_default()
                .iter()
                .filter_map(Value::as_number)
                .map(|n| n as u32)
                .collect();
            let bytes: &[u8] = bytemuck::cast_slice(&indices);
            let buffer = match previous {
                Some(GpuPayload::Index(range)) => {
                    if let Err(e) = backend.write_buffer(range.buffer, bytes) {
                        backend.release_buffer(range.buffer);
                        return Err(e);
                    }
                    range.buffer
                }
                other => {
                    if let Some(other) = other {
                        release_payload(backend, other);
                    }
                    backend.create_buffer(BufferUsage::Index, label, bytes)?
                }
            };
            Ok(GpuPayload::Index(IndexRange { buffer, count: indices.len() as u32 }))
        }

        ResourceKind::Uniform => {
            if let Some(old) = previous {
                release_payload(backend, old);
            }
            Ok(GpuPayload::Uniform(uniforms::flatten(resource.payload())))
        }

        ResourceKind::Texture => {
            if let Some(old) = previous {
                release_payload(backend, old);
            }
            let mut textures = BTreeMap::new();
            match upload_textures(backend, resource, &mut textures) {
                Ok(()) => Ok(GpuPayload::Texture(textures)),
                Err(e) => {
                    release_payload(backend, GpuPayload::Texture(textures));
                    Err(e)
                }
            }
        }
    }
}

fn upload_vertex(
    backend: &mut dyn Backend,
    resource: &Resource,
    old: &mut BTreeMap<String, VertexBuffer>,
    buffers: &mut BTreeMap<String, VertexBuffer>,
) -> Result<()> {
    for (name, value) in resource.payload().as_object().into_iter().flatten() {
        let floats = value.to_f32_vec().unwrap_or_default();
        let bytes: &[u8] = bytemuck::cast_slice(&floats);
        let buffer = match old.remove(name) {
            Some(vb) => {
                if let Err(e) = backend.write_buffer(vb.buffer, bytes) {
                    backend.release_buffer(vb.buffer);
                    return Err(e);
                }
                vb.buffer
            }
            None => backend.create_buffer(BufferUsage::Vertex, resource.label(), bytes)?,
        };
        buffers.insert(name.clone(), VertexBuffer { buffer, floats: floats.len() });
    }
    Ok(())
}

fn upload_textures(
    backend: &mut dyn Backend,
    resource: &Resource,
    textures: &mut BTreeMap<String, GpuTexture>,
) -> Result<()> {
    for (name, value) in resource.payload().as_object().into_iter().flatten() {
        let images =
            SamplerImages::from_value(value).map_err(|reason| Error::shape(ResourceKind::Texture, reason))?;
        let (dimension, faces) = match &images {
            SamplerImages::Single(image) => (TextureDimension::D2, std::slice::from_ref(image)),
            SamplerImages::Cube(faces) => (TextureDimension::Cube, faces.as_slice()),
        };
        let first = &faces[0];
        let upload = TextureUpload {
            label: resource.label(),
            width: first.width,
            height: first.height,
            dimension,
            layers: faces.iter().map(|f| &f.pixels[..]).collect(),
            filter: first.filter,
            wrap: first.wrap,
        };
        let handle = backend.create_texture(&upload)?;
        textures.insert(name.clone(), GpuTexture { handle, dimension });
    }
    Ok(())
}

fn release_payload(backend: &mut dyn Backend, payload: GpuPayload) {
    match payload {
        GpuPayload::Vertex(buffers) => {
            for vb in buffers.into_values() {
                backend.release_buffer(vb.buffer);
            }
        }
        GpuPayload::Index(range) => backend.release_buffer(range.buffer),
        GpuPayload::Uniform(_) => {}
        GpuPayload::Texture(textures) => {
            for t in textures.into_values() {
                backend.release_texture(t.handle);
            }
        }
    }
}
