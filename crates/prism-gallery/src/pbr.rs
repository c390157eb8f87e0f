use prism_engine::plugin::{Plugin, ProgramDesc, Schema, SlotDecl, TextureDimension, UniformType};
use prism_engine::resource::{Resource, ResourceKind};
use prism_engine::{Error, Value};

use crate::assets::{self, EnvMaps};

const SHADER: &str = include_str!("shaders/pbr.wgsl");

/// Slot positions of [`PbrLighting`].
pub mod slot {
    pub const DATA: usize = 0;
    pub const INDEX: usize = 1;
    pub const BRDF: usize = 2;
    pub const ENV: usize = 3;
    pub const LIGHTS: usize = 4;
    pub const MATERIAL: usize = 5;
    pub const MATRIX: usize = 6;
    pub const OPTIONS: usize = 7;
    pub const COUNT: usize = 8;
}

/// Metallic/roughness shading with point lights and optional image-based
/// lighting.
///
/// The BRDF table and environment cubes are optional slots; until they are
/// bound the backend's white fallbacks are sampled and `u_IBL` should stay 0.
pub struct PbrLighting {
    schema: Schema,
    lights: usize,
}

impl PbrLighting {
    pub fn new(lights: usize) -> Self {
        let schema = Schema::new(vec![
            SlotDecl::required("data", ResourceKind::VertexData),
            SlotDecl::required("index", ResourceKind::IndexData),
            SlotDecl::optional("brdf", ResourceKind::Texture),
            SlotDecl::optional("env", ResourceKind::Texture),
            SlotDecl::required("pointLights", ResourceKind::Uniform),
            SlotDecl::required("materialImages", ResourceKind::Texture),
            SlotDecl::required("matrix", ResourceKind::Uniform),
            SlotDecl::required("options", ResourceKind::Uniform),
        ]);
        Self {
            schema,
            lights: lights.max(1),
        }
    }
}

impl Plugin for PbrLighting {
    fn name(&self) -> &str {
        "pbr-lighting"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn program(&self) -> ProgramDesc {
        let light = vec![
            ("direction".to_string(), UniformType::Vec3),
            ("strength".to_string(), UniformType::Float),
            ("color".to_string(), UniformType::Vec3),
        ];
        let shader = format!("const LIGHT_COUNT: u32 = {}u;\n{SHADER}", self.lights);

        ProgramDesc::new("pbr-lighting", shader)
            .attribute("a_Position", 3)
            .attribute("a_Normal", 3)
            .attribute("a_UV", 2)
            .uniform("u_MVPMatrix", UniformType::Mat4)
            .uniform("u_ModelMatrix", UniformType::Mat4)
            .uniform("u_Camera", UniformType::Vec3)
            .uniform("u_MetallicRoughnessValues", UniformType::Vec2)
            .uniform("u_IBL", UniformType::Float)
            .uniform(
                "u_Lights",
                UniformType::StructArray {
                    fields: light,
                    len: self.lights,
                },
            )
            .texture("u_BaseColorSampler", TextureDimension::D2)
            .texture("u_brdfLUT", TextureDimension::D2)
            .texture("u_DiffuseEnvSampler", TextureDimension::Cube)
            .texture("u_SpecularEnvSampler", TextureDimension::Cube)
    }
}

/// One white light per slot, shining from the camera side.
pub fn create_point_lights(count: usize) -> Value {
    let lights: Vec<Value> = (0..count.max(1))
        .map(|_| {
            Value::object([
                ("direction", Value::from([0.0, 0.0, 1.0])),
                ("strength", Value::from(1.0)),
                ("color", Value::from([1.0, 1.0, 1.0])),
            ])
        })
        .collect();
    Value::object([("u_Lights", Value::from(lights))])
}

pub fn create_material_images() -> Value {
    Value::object([("u_BaseColorSampler", assets::checker(256, 8, [230, 230, 230], [180, 60, 40]))])
}

/// The `brdf` slot resource. A table that fails the shape check is replaced
/// by the generated one.
pub fn create_brdf_texture(table: Value) -> Result<Resource, Error> {
    let wrap = |table| Resource::textures(Value::object([("u_brdfLUT", table)]));
    wrap(table).or_else(|e| {
        log::warn!("BRDF table rejected ({e}); using an analytic table");
        wrap(assets::fallback_brdf())
    })
}

/// The `env` slot resource, with the same fallback as [`create_brdf_texture`].
pub fn create_env_texture(maps: EnvMaps) -> Result<Resource, Error> {
    let wrap = |maps: EnvMaps| {
        Resource::textures(Value::object([
            ("u_DiffuseEnvSampler", Value::from(maps.diffuse)),
            ("u_SpecularEnvSampler", Value::from(maps.specular)),
        ]))
    };
    wrap(maps).or_else(|e| {
        log::warn!("environment maps rejected ({e}); using a generated sky");
        wrap(assets::fallback_env_maps())
    })
}

#[cfg(test)]
mod tests {
    use prism_engine::Error;
    use prism_engine::render::{HeadlessBackend, Renderer, RendererConfig, std140};
    use prism_engine::resource::{Resource, image_value};

    use super::*;
    use crate::geometry::create_ball;

    struct Page {
        data: Resource,
        index: Resource,
        lights: Resource,
        material: Resource,
        matrix: Resource,
        options: Resource,
    }

    impl Page {
        fn new() -> Self {
            let ball = create_ball(2.0, 8, 4);
            Self {
                data: Resource::vertex_data(ball.data).unwrap(),
                index: Resource::index_data(ball.index).unwrap(),
                lights: Resource::uniforms(create_point_lights(1)).unwrap(),
                material: Resource::textures(create_material_images()).unwrap(),
                matrix: Resource::uniforms(Value::object([
                    ("u_Camera", Value::from([0.0, 0.0, 10.0])),
                    ("u_ModelMatrix", Value::from(glam::Mat4::IDENTITY.to_cols_array())),
                    ("u_MVPMatrix", Value::from(glam::Mat4::IDENTITY.to_cols_array())),
                ]))
                .unwrap(),
                options: Resource::uniforms(Value::object([
                    ("u_MetallicRoughnessValues", Value::from([0.0, 0.0])),
                    ("u_IBL", Value::from(0.0)),
                ]))
                .unwrap(),
            }
        }

        fn slots<'a>(&'a self, brdf: Option<&'a Resource>, env: Option<&'a Resource>) -> Vec<Option<&'a Resource>> {
            vec![
                Some(&self.data),
                Some(&self.index),
                brdf,
                env,
                Some(&self.lights),
                Some(&self.material),
                Some(&self.matrix),
                Some(&self.options),
            ]
        }
    }

    #[test]
    fn uniform_block_matches_the_shader_struct() {
        let desc = PbrLighting::new(1).program();
        let layout = std140::layout(&desc.uniforms);
        assert_eq!(layout.offsets, vec![0, 64, 128, 144, 152, 160]);
        assert_eq!(layout.size, 192);
    }

    #[test]
    fn draws_before_and_after_environment_loads() {
        let plugin = PbrLighting::new(1);
        let page = Page::new();
        let mut renderer = Renderer::new(HeadlessBackend::new(), RendererConfig::default());

        renderer.clear().unwrap().draw(&plugin, &page.slots(None, None)).unwrap();
        let draw = renderer.backend().draws().last().cloned().unwrap();
        assert_eq!(draw.vertex_buffers.len(), 3);
        assert_eq!(draw.textures.len(), 4);
        assert!(draw.textures[0].is_some());
        assert!(draw.textures[1..].iter().all(Option::is_none));
        assert_eq!(renderer.stats().skipped_slots, 2);

        let face = || image_value(1, 1, vec![255; 4]);
        let brdf = Resource::textures(Value::object([("u_brdfLUT", face())])).unwrap();
        let env = Resource::textures(Value::object([
            ("u_DiffuseEnvSampler", Value::from(vec![face(); 6])),
            ("u_SpecularEnvSampler", Value::from(vec![face(); 6])),
        ]))
        .unwrap();

        renderer.clear().unwrap().draw(&plugin, &page.slots(Some(&brdf), Some(&env))).unwrap();
        let draw = renderer.backend().draws().last().cloned().unwrap();
        assert!(draw.textures.iter().all(Option::is_some));
    }

    #[test]
    fn light_color_edit_reaches_the_uniform_block() {
        let plugin = PbrLighting::new(1);
        let mut page = Page::new();
        let mut renderer = Renderer::new(HeadlessBackend::new(), RendererConfig::default());

        page.lights.set("u_Lights[0].color", [0.0, 0.5, 0.0]).unwrap();
        renderer.draw(&plugin, &page.slots(None, None)).unwrap();

        let draw = renderer.backend().draws().last().cloned().unwrap();
        // u_Lights at 160; color at +16.
        let green = f32::from_ne_bytes(draw.uniforms[180..184].try_into().unwrap());
        assert_eq!(green, 0.5);
    }

    #[test]
    fn emptied_light_list_still_draws() {
        let plugin = PbrLighting::new(1);
        let mut page = Page::new();
        let mut renderer = Renderer::new(HeadlessBackend::new(), RendererConfig::default());

        page.lights.set("u_Lights", Value::Array(Vec::new())).unwrap();
        renderer.draw(&plugin, &page.slots(None, None)).unwrap();
        let draw = renderer.backend().draws().last().cloned().unwrap();
        assert!(draw.uniforms[160..192].iter().all(|&b| b == 0));
    }

    #[test]
    fn rejected_loads_fall_back_to_generated_images() {
        let bad = image_value(4, 4, vec![0; 3]);
        let brdf = create_brdf_texture(bad.clone()).unwrap();
        assert_eq!(brdf.get("u_brdfLUT.width").unwrap().as_number(), Some(64.0));

        let maps = EnvMaps {
            diffuse: vec![bad.clone(); 6],
            specular: vec![bad; 5],
        };
        let env = create_env_texture(maps).unwrap();
        assert_eq!(env.get("u_SpecularEnvSampler").unwrap().as_array().map(<[Value]>::len), Some(6));
    }

    #[test]
    fn missing_options_abort_the_frame() {
        let plugin = PbrLighting::new(1);
        let page = Page::new();
        let mut renderer = Renderer::new(HeadlessBackend::new(), RendererConfig::default());

        let mut slots = page.slots(None, None);
        slots[slot::OPTIONS] = None;
        assert!(matches!(renderer.draw(&plugin, &slots), Err(Error::SchemaMismatch { .. })));
        assert_eq!(renderer.backend().draws().count(), 0);
    }
}
