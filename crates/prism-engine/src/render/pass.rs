use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::plugin::{BoundState, ProgramDesc};
use crate::resource::{Resource, ResourceKind};

use super::backend::{Backend, BufferHandle, DrawCall, IndexRange, ProgramHandle, TextureHandle, Topology};
use super::cache::{GpuPayload, ResourceCache};
use super::std140;
use super::uniforms::UniformValue;
use super::RenderStats;

/// A plugin's program as built by the backend.
#[derive(Debug)]
pub(crate) struct ActiveProgram {
    pub handle: ProgramHandle,
    pub desc: ProgramDesc,
}

/// Access a plugin gets while issuing its draws for one `Renderer::draw`.
///
/// Uploads happen here, lazily, for the resources a draw actually uses.
pub struct DrawPass<'a> {
    pub(crate) plugin: &'a str,
    pub(crate) program: &'a ActiveProgram,
    pub(crate) backend: &'a mut dyn Backend,
    pub(crate) cache: &'a mut ResourceCache,
    pub(crate) stats: &'a mut RenderStats,
    pub(crate) warned: &'a mut HashSet<String>,
}

impl DrawPass<'_> {
    pub fn plugin(&self) -> &str {
        self.plugin
    }

    pub fn program(&self) -> &ProgramDesc {
        &self.program.desc
    }

    /// Uploads `resource` if its GPU copy is missing or stale.
    pub fn upload(&mut self, resource: &Resource) -> Result<bool> {
        self.cache.ensure(&mut *self.backend, resource, self.stats)
    }

    /// Composes every resource of `bound` into one draw.
    ///
    /// Resources of the same kind are merged in slot order; a later slot wins
    /// for an attribute, uniform or sampler name that an earlier slot also
    /// provides. Declared uniforms nobody provides are zero; declared textures
    /// nobody provides use the backend fallback.
    pub fn draw_bound(&mut self, bound: &BoundState<'_>, topology: Topology) -> Result<()> {
        for (_, resource) in bound.present() {
            self.upload(resource)?;
        }

        let vertex = self.vertex_buffers(bound)?;
        let index = self.index_range(bound);
        let uniforms = self.uniform_block(bound)?;
        let textures = self.textures(bound)?;

        let call = DrawCall {
            program: self.program.handle,
            vertex_buffers: vertex.buffers,
            index,
            vertex_count: vertex.count,
            uniforms: &uniforms,
            textures,
            topology,
        };

        log::trace!(
            "plugin `{}`: draw ({} vertices, {} indices)",
            self.plugin,
            call.vertex_count,
            call.index.map_or(0, |i| i.count)
        );
        self.backend.draw(&call)?;
        self.stats.draws += 1;
        Ok(())
    }

    fn payloads<'s>(&'s self, bound: &'s BoundState<'_>, kind: ResourceKind) -> impl Iterator<Item = &'s GpuPayload> + 's {
        bound
            .of_kind(kind)
            .filter_map(|r| self.cache.get(r.id()))
            .map(|entry| &entry.payload)
    }

    fn vertex_buffers(&self, bound: &BoundState<'_>) -> Result<VertexInputs> {
        let mut merged = BTreeMap::new();
        for payload in self.payloads(bound, ResourceKind::VertexData) {
            if let GpuPayload::Vertex(buffers) = payload {
                merged.extend(buffers.iter().map(|(name, vb)| (name.as_str(), *vb)));
            }
        }

        let mut inputs = VertexInputs { buffers: Vec::new(), count: 0 };
        let mut count: Option<usize> = None;
        for attr in &self.program.desc.attributes {
            let location = format!("attribute `{}`", attr.name);
            let Some(vb) = merged.get(attr.name.as_str()) else {
                return Err(Error::mismatch(self.plugin, location, "no bound vertex data provides it"));
            };
            let components = attr.components.max(1) as usize;
            if vb.floats % components != 0 {
                return Err(Error::mismatch(
                    self.plugin,
                    location,
                    format!("{} values is not a multiple of {components} components", vb.floats),
                ));
            }
            let vertices = vb.floats / components;
            count = Some(count.map_or(vertices, |c| c.min(vertices)));
            inputs.buffers.push(vb.buffer);
        }
        inputs.count = count.unwrap_or(0) as u32;
        Ok(inputs)
    }

    fn index_range(&self, bound: &BoundState<'_>) -> Option<IndexRange> {
        self.payloads(bound, ResourceKind::IndexData)
            .filter_map(|p| match p {
                GpuPayload::Index(range) => Some(*range),
                _ => None,
            })
            .last()
    }

    fn uniform_block(&mut self, bound: &BoundState<'_>) -> Result<Vec<u8>> {
        let mut merged: BTreeMap<&str, &UniformValue> = BTreeMap::new();
        for resource in bound.of_kind(ResourceKind::Uniform) {
            let Some(GpuPayload::Uniform(values)) = self.cache.get(resource.id()).map(|e| &e.payload) else {
                continue;
            };
            for (name, value) in values {
                if merged.insert(name.as_str(), value).is_some() {
                    log::debug!(
                        "plugin `{}`: uniform `{name}` overridden by resource {}",
                        self.plugin,
                        resource.id()
                    );
                }
            }
        }

        let packed = std140::pack(&self.program.desc.uniforms, &merged)
            .map_err(|e| Error::mismatch(self.plugin, format!("uniform `{}`", e.uniform), e.reason))?;

        for name in packed.missing {
            if self.warned.insert(format!("{}/{name}", self.plugin)) {
                log::debug!("plugin `{}`: uniform `{name}` not provided; using zeros", self.plugin);
            }
        }
        Ok(packed.bytes)
    }

    fn textures(&self, bound: &BoundState<'_>) -> Result<Vec<Option<TextureHandle>>> {
        let mut merged = BTreeMap::new();
        for payload in self.payloads(bound, ResourceKind::Texture) {
            if let GpuPayload::Texture(textures) = payload {
                merged.extend(textures.iter().map(|(name, t)| (name.as_str(), *t)));
            }
        }

        self.program
            .desc
            .textures
            .iter()
            .map(|decl| match merged.get(decl.name.as_str()) {
                Some(t) if t.dimension != decl.dimension => Err(Error::mismatch(
                    self.plugin,
                    format!("texture `{}`", decl.name),
                    format!("declared {:?}, bound {:?}", decl.dimension, t.dimension),
                )),
                Some(t) => Ok(Some(t.handle)),
                None => Ok(None),
            })
            .collect()
    }
}

struct VertexInputs {
    buffers: Vec<BufferHandle>,
    count: u32,
}
