//! Draw composition.
//!
//! [`Renderer`] binds positional resources against the active plugin and
//! hands the resulting draws to a [`Backend`]. Resources are uploaded lazily
//! and cached by identity: a resource that is neither dirty nor newer than
//! its cached copy is never uploaded again.
//!
//! Backends:
//! - [`HeadlessBackend`]: records calls, no GPU (tests, tooling)
//! - `device::WgpuBackend`: wgpu on a window surface

mod backend;
mod cache;
mod headless;
mod pass;
mod renderer;
pub mod std140;
mod uniforms;

pub use backend::{
    Backend, BufferHandle, BufferUsage, ClearState, DrawCall, IndexRange, ProgramHandle, TextureHandle, TextureUpload,
    Topology,
};
pub use headless::{BackendCall, HeadlessBackend, RecordedDraw};
pub use pass::DrawPass;
pub use renderer::{RenderStats, Renderer, RendererConfig};

#[cfg(test)]
mod tests {
    use prism_value::Value;

    use super::*;
    use crate::error::Error;
    use crate::plugin::{Plugin, ProgramDesc, Schema, SlotDecl, TextureDimension, UniformType};
    use crate::resource::{image_value, Resource, ResourceKind, CUBE_FACES};

    struct TestPlugin {
        name: &'static str,
        schema: Schema,
    }

    impl TestPlugin {
        fn new(name: &'static str, slots: Vec<SlotDecl>) -> Self {
            Self { name, schema: Schema::new(slots) }
        }

        /// `[VertexData, IndexData, Uniform (required), Texture (optional)]`
        fn standard() -> Self {
            Self::new(
                "standard",
                vec![
                    SlotDecl::required("data", ResourceKind::VertexData),
                    SlotDecl::required("index", ResourceKind::IndexData),
                    SlotDecl::required("uniforms", ResourceKind::Uniform),
                    SlotDecl::optional("maps", ResourceKind::Texture),
                ],
            )
        }
    }

    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn schema(&self) -> &Schema {
            &self.schema
        }

        fn program(&self) -> ProgramDesc {
            ProgramDesc::new(self.name, "")
                .attribute("position", 3)
                .uniform("u_Color", UniformType::Vec3)
                .uniform("u_Strength", UniformType::Float)
                .texture("u_Albedo", TextureDimension::D2)
        }
    }

    fn renderer() -> Renderer<HeadlessBackend> {
        Renderer::new(HeadlessBackend::new(), RendererConfig::default())
    }

    fn triangle() -> Resource {
        Resource::vertex_data(Value::object([("position", Value::from([0, 0, 0, 1, 0, 0, 0, 1, 0]))])).unwrap()
    }

    fn indices() -> Resource {
        Resource::index_data([0, 1, 2]).unwrap()
    }

    fn uniforms(color: [f32; 3]) -> Resource {
        Resource::uniforms(Value::object([("u_Color", Value::from(color)), ("u_Strength", Value::from(1))])).unwrap()
    }

    fn albedo() -> Resource {
        Resource::textures(Value::object([("u_Albedo", image_value(1, 1, vec![255, 0, 0, 255]))])).unwrap()
    }

    fn read(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    fn draw_count(r: &Renderer<HeadlessBackend>) -> usize {
        r.backend().draws().count()
    }

    #[test]
    fn draws_with_optional_texture_absent() {
        let plugin = TestPlugin::standard();
        let (v, i, u) = (triangle(), indices(), uniforms([1.0, 0.5, 0.25]));
        let mut r = renderer();

        r.clear().unwrap().draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();

        let draw = r.backend().draws().next().unwrap().clone();
        assert_eq!(draw.textures, vec![None]);
        assert_eq!(draw.index.map(|i| i.count), Some(3));
        assert_eq!(draw.vertex_count, 3);
        assert_eq!(read(&draw.uniforms, 4), 0.5);
        assert_eq!(read(&draw.uniforms, 12), 1.0);
        assert_eq!(r.last_bound(), &[Some(v.id()), Some(i.id()), Some(u.id()), None]);
        assert_eq!(r.stats().skipped_slots, 1);
        assert!(matches!(r.backend().calls()[0], BackendCall::Clear(_)));
    }

    #[test]
    fn missing_required_slot_is_rejected_without_drawing() {
        let plugin = TestPlugin::standard();
        let (v, i, u) = (triangle(), indices(), uniforms([1.0, 1.0, 1.0]));
        let mut r = renderer();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        let before = r.last_bound().to_vec();

        let e = r.draw(&plugin, &[Some(&v), Some(&i), None, None]).err().unwrap();
        assert!(matches!(e, Error::SchemaMismatch { .. }));
        assert_eq!(draw_count(&r), 1);
        assert_eq!(r.last_bound(), before.as_slice());
        assert_eq!(r.stats().rejected, 1);

        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        assert_eq!(draw_count(&r), 2);
    }

    #[test]
    fn missing_required_slot_on_first_draw_issues_nothing() {
        let plugin = TestPlugin::standard();
        let (v, i) = (triangle(), indices());
        let mut r = renderer();
        assert!(matches!(r.draw(&plugin, &[Some(&v), Some(&i)]), Err(Error::SchemaMismatch { .. })));
        assert_eq!(draw_count(&r), 0);
        assert!(r.last_bound().is_empty());
    }

    #[test]
    fn wrong_kind_and_extra_slots_are_rejected() {
        let plugin = TestPlugin::standard();
        let (v, i, u) = (triangle(), indices(), uniforms([0.0; 3]));
        let mut r = renderer();

        assert!(matches!(r.draw(&plugin, &[Some(&v), Some(&u), Some(&u)]), Err(Error::SchemaMismatch { .. })));
        assert!(matches!(
            r.draw(&plugin, &[Some(&v), Some(&i), Some(&u), None, Some(&v)]),
            Err(Error::SchemaMismatch { .. })
        ));
        assert_eq!(draw_count(&r), 0);
    }

    #[test]
    fn unchanged_resources_are_not_uploaded_again() {
        let plugin = TestPlugin::standard();
        let (v, i, u) = (triangle(), indices(), uniforms([0.0; 3]));
        let mut r = renderer();

        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        let uploads = r.backend().upload_count();
        assert_eq!(r.stats().uploads, 3);
        assert!(!v.is_dirty() && !i.is_dirty() && !u.is_dirty());

        for _ in 0..5 {
            r.clear().unwrap().draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        }
        assert_eq!(r.backend().upload_count(), uploads);
        assert_eq!(r.stats().uploads, 3);
        assert_eq!(draw_count(&r), 6);
    }

    #[test]
    fn dirty_resources_are_rewritten_in_place() {
        let plugin = TestPlugin::standard();
        let (mut v, i, mut u) = (triangle(), indices(), uniforms([0.0; 3]));
        let mut r = renderer();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        let buffer = r.backend().draws().next().unwrap().vertex_buffers[0];

        v.set("position[0]", 9).unwrap();
        u.set("u_Color", [0.0, 2.0, 0.0]).unwrap();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();

        let last = r.backend().draws().last().unwrap().clone();
        assert_eq!(last.vertex_buffers[0], buffer);
        assert!(r.backend().calls().contains(&BackendCall::WriteBuffer { buffer, len: 36 }));
        assert_eq!(read(r.backend().buffer(buffer).unwrap(), 0), 9.0);
        assert_eq!(read(&last.uniforms, 4), 2.0);
        assert_eq!(r.stats().uploads, 5);
    }

    #[test]
    fn later_uniform_slot_wins_on_overlap() {
        let plugin = TestPlugin::new(
            "layered",
            vec![
                SlotDecl::required("data", ResourceKind::VertexData),
                SlotDecl::required("camera", ResourceKind::Uniform),
                SlotDecl::optional("material", ResourceKind::Uniform),
            ],
        );
        let v = triangle();
        let base = uniforms([1.0, 1.0, 1.0]);
        let over = Resource::uniforms(Value::object([("u_Color", Value::from([0.0, 0.0, 3.0]))])).unwrap();
        let mut r = renderer();

        r.draw(&plugin, &[Some(&v), Some(&base), Some(&over)]).unwrap();
        let draw = r.backend().draws().last().unwrap().clone();
        assert_eq!(read(&draw.uniforms, 0), 0.0);
        assert_eq!(read(&draw.uniforms, 8), 3.0);
        assert_eq!(read(&draw.uniforms, 12), 1.0);
        assert_eq!(draw.index, None);

        r.draw(&plugin, &[Some(&v), Some(&over), Some(&base)]).unwrap();
        let draw = r.backend().draws().last().unwrap().clone();
        assert_eq!(read(&draw.uniforms, 8), 1.0);
    }

    #[test]
    fn uniform_component_mismatch_is_schema_error() {
        let plugin = TestPlugin::standard();
        let (v, i) = (triangle(), indices());
        let u = Resource::uniforms(Value::object([("u_Color", Value::from([1, 1]))])).unwrap();
        let mut r = renderer();
        let e = r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).err().unwrap();
        assert!(matches!(e, Error::SchemaMismatch { ref location, .. } if location == "uniform `u_Color`"));
        assert_eq!(draw_count(&r), 0);
    }

    #[test]
    fn missing_attribute_is_schema_error() {
        let plugin = TestPlugin::standard();
        let v = Resource::vertex_data(Value::object([("normal", Value::from([0, 0, 1]))])).unwrap();
        let (i, u) = (indices(), uniforms([0.0; 3]));
        let mut r = renderer();
        assert!(matches!(r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]), Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn bound_texture_is_used_and_dimension_checked() {
        let plugin = TestPlugin::standard();
        let (v, i, u, t) = (triangle(), indices(), uniforms([0.0; 3]), albedo());
        let mut r = renderer();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u), Some(&t)]).unwrap();
        assert!(r.backend().draws().last().unwrap().textures[0].is_some());

        let faces: Vec<Value> = (0..CUBE_FACES).map(|_| image_value(1, 1, vec![0; 4])).collect();
        let cube = Resource::textures(Value::object([("u_Albedo", Value::Array(faces))])).unwrap();
        assert!(matches!(
            r.draw(&plugin, &[Some(&v), Some(&i), Some(&u), Some(&cube)]),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn context_loss_forces_full_reupload_after_recovery() {
        let plugin = TestPlugin::standard();
        let (v, i, u, t) = (triangle(), indices(), uniforms([0.0; 3]), albedo());
        let mut r = renderer();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u), Some(&t)]).unwrap();

        r.backend_mut().set_context_lost(true);
        assert_eq!(r.draw(&plugin, &[Some(&v), Some(&i), Some(&u), Some(&t)]).err(), Some(Error::ContextLost));
        assert!(r.is_context_lost());
        assert_eq!(r.clear().err(), Some(Error::ContextLost));

        r.recover(HeadlessBackend::new());
        r.clear().unwrap().draw(&plugin, &[Some(&v), Some(&i), Some(&u), Some(&t)]).unwrap();

        assert_eq!(r.active_plugin(), Some("standard"));
        assert_eq!(r.backend().upload_count(), 3);
        assert_eq!(draw_count(&r), 1);
        assert_eq!(r.stats().uploads, 8);
    }

    #[test]
    fn notified_context_loss_rejects_draws() {
        let plugin = TestPlugin::standard();
        let (v, i, u) = (triangle(), indices(), uniforms([0.0; 3]));
        let mut r = renderer();
        r.notify_context_lost();
        assert_eq!(r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).err(), Some(Error::ContextLost));
        assert_eq!(r.present().err(), Some(Error::ContextLost));
    }

    #[test]
    fn dispose_releases_gpu_objects() {
        let plugin = TestPlugin::standard();
        let (v, i, u, t) = (triangle(), indices(), uniforms([0.0; 3]), albedo());
        let mut r = renderer();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u), Some(&t)]).unwrap();
        assert_eq!(r.backend().live_buffers(), 2);
        assert_eq!(r.backend().live_textures(), 1);

        assert!(r.dispose(&v));
        assert!(r.dispose(&t));
        assert!(!r.dispose(&t));
        assert_eq!(r.backend().live_buffers(), 1);
        assert_eq!(r.backend().live_textures(), 0);

        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        assert_eq!(r.backend().live_buffers(), 2);
    }

    #[test]
    fn failed_upload_leaves_no_live_buffers() {
        let plugin = TestPlugin::standard();
        let v = Resource::vertex_data(Value::object([
            ("normal", Value::from([0, 0, 1, 0, 0, 1, 0, 0, 1])),
            ("position", Value::from([0, 0, 0, 1, 0, 0, 0, 1, 0])),
        ]))
        .unwrap();
        let (i, u) = (indices(), uniforms([0.0; 3]));
        let mut r = renderer();

        r.backend_mut().fail_creates_after(Some(1));
        assert!(matches!(r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]), Err(Error::Backend(_))));
        assert_eq!(r.backend().live_buffers(), 0);
        assert_eq!(draw_count(&r), 0);

        r.backend_mut().fail_creates_after(None);
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        assert_eq!(r.backend().live_buffers(), 3);
        assert!(r.dispose(&v));
        assert!(r.dispose(&i));
        assert_eq!(r.backend().live_buffers(), 0);
    }

    #[test]
    fn failed_texture_upload_releases_created_textures() {
        let plugin = TestPlugin::standard();
        let t = Resource::textures(Value::object([
            ("u_Albedo", image_value(1, 1, vec![255; 4])),
            ("u_Detail", image_value(1, 1, vec![0; 4])),
        ]))
        .unwrap();
        let (v, i, u) = (triangle(), indices(), uniforms([0.0; 3]));
        let mut r = renderer();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();

        r.backend_mut().fail_creates_after(Some(1));
        assert!(r.draw(&plugin, &[Some(&v), Some(&i), Some(&u), Some(&t)]).is_err());
        assert_eq!(r.backend().live_textures(), 0);
        assert!(!r.dispose(&t));
    }

    #[test]
    fn texture_uploads_are_validated() {
        let face = [0u8; 8];
        let mut upload = TextureUpload {
            label: None,
            width: 2,
            height: 1,
            dimension: TextureDimension::Cube,
            layers: vec![&face[..]; CUBE_FACES],
            filter: Default::default(),
            wrap: Default::default(),
        };
        assert!(matches!(upload.validate(u32::MAX), Err(Error::Backend(_))));

        upload.dimension = TextureDimension::D2;
        assert!(upload.validate(u32::MAX).is_err());
        upload.layers.truncate(1);
        assert!(upload.validate(u32::MAX).is_ok());
        assert!(upload.validate(1).is_err());
    }

    #[test]
    fn recovery_shuts_down_the_lost_backend_first() {
        let plugin = TestPlugin::standard();
        let (v, i, u) = (triangle(), indices(), uniforms([0.0; 3]));
        let mut r = renderer();
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        r.backend_mut().set_context_lost(true);

        let failed = r.recover_with(|| Err(Error::Backend("no adapter".to_string())));
        assert!(failed.is_err());
        assert!(r.is_context_lost());
        assert_eq!(r.backend().calls().last(), Some(&BackendCall::Shutdown));
        assert_eq!(r.backend().live_buffers(), 0);

        r.recover_with(|| Ok(HeadlessBackend::new())).unwrap();
        assert!(!r.is_context_lost());
        r.draw(&plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
        assert_eq!(draw_count(&r), 1);
    }

    #[test]
    fn switching_plugins_builds_each_program_once() {
        let a = TestPlugin::standard();
        let b = TestPlugin::new("other", a.schema().slots().to_vec());
        let (v, i, u) = (triangle(), indices(), uniforms([0.0; 3]));
        let mut r = renderer();

        for plugin in [&a, &b, &a, &b] {
            r.draw(plugin, &[Some(&v), Some(&i), Some(&u)]).unwrap();
            assert_eq!(r.active_plugin(), Some(plugin.name()));
        }
        let programs = r
            .backend()
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::CreateProgram(_)))
            .count();
        assert_eq!(programs, 2);
    }
}
