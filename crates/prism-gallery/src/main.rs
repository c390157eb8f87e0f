//! PBR ball gallery page.
//!
//! Usage: `prism-gallery [ASSET_DIR]` (default `assets`). Expects
//! `ibl/brdfLUT.png` and `ibl/helipad/{diffuse,specular}_<face>.png`; both
//! are generated when missing.

mod assets;
mod geometry;
mod math;
mod pbr;

use std::path::PathBuf;

use anyhow::Result;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use prism_engine::core::{App, AppControl, FrameCtx};
use prism_engine::device::GpuInit;
use prism_engine::logging::{LoggingConfig, init_logging};
use prism_engine::render::RendererConfig;
use prism_engine::resource::Resource;
use prism_engine::window::{Runtime, RuntimeConfig};
use prism_engine::{Error, Value};

use crate::assets::{EnvMaps, Pending};
use crate::pbr::{PbrLighting, slot};

const BASE_EYE: [f32; 3] = [0.0, 0.0, 10.0];
const CENTER: [f32; 3] = [0.0, 0.0, 0.0];
const LIGHT_COUNT: usize = 1;

const LIGHT_COLORS: [[f32; 3]; 4] = [[1.0, 1.0, 1.0], [1.0, 0.85, 0.6], [0.6, 0.8, 1.0], [1.0, 0.4, 0.4]];

const HELP: &str = "\
  X/Y/Z (+Shift)   rotate model
  Left/Right       orbit camera
  M/N              metallic +/-
  R/F              roughness +/-
  I/K J/L U/O      light direction x/y/z
  Up/Down          light strength
  C                cycle light color
  Delete           simulate context loss
  Esc              quit";

/// Slider state of the page.
#[derive(Debug, Clone, PartialEq)]
struct Controls {
    rotate: [f32; 3],
    camera: f32,
    metallic: f32,
    roughness: f32,
    light_direction: [f32; 3],
    light_strength: f32,
    light_color: usize,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            rotate: [0.0; 3],
            camera: 0.0,
            metallic: 0.0,
            roughness: 0.0,
            light_direction: [0.0, 0.0, 1.0],
            light_strength: 1.0,
            light_color: 0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Changes {
    matrices: bool,
    options: bool,
    lights: bool,
}

struct Gallery {
    plugin: PbrLighting,

    data: Resource,
    index: Resource,
    matrix: Resource,
    lights: Resource,
    material: Resource,
    options: Resource,
    brdf: Option<Resource>,
    env: Option<Resource>,

    pending_brdf: Pending<Value>,
    pending_env: Pending<EnvMaps>,

    controls: Controls,
    changes: Changes,
    shift_held: bool,
    aspect: f32,
    lose_context: bool,
}

impl Gallery {
    fn new(asset_dir: PathBuf) -> Result<Self> {
        let plugin = PbrLighting::new(LIGHT_COUNT);
        let ball = geometry::create_ball(2.0, 64, 32);
        let model = math::compute_model_mat(0.0, 0.0, 0.0);

        let matrix = Resource::uniforms(Value::object([
            ("u_Camera", Value::from(BASE_EYE)),
            ("u_ModelMatrix", Value::from(model)),
            ("u_MVPMatrix", Value::from(math::compute_mvp_mat(&model, BASE_EYE, CENTER, 1.0))),
        ]))?
        .with_label("matrix");

        let options = Resource::uniforms(Value::object([
            ("u_MetallicRoughnessValues", Value::from([0.0, 0.0])),
            ("u_IBL", Value::from(0.0)),
        ]))?
        .with_label("options");

        let ibl = asset_dir.join("ibl");
        let brdf_path = ibl.join("brdfLUT.png");
        let env_dir = ibl.join("helipad");

        Ok(Self {
            data: Resource::vertex_data(ball.data)?.with_label("ball"),
            index: Resource::index_data(ball.index)?.with_label("ball indices"),
            lights: Resource::uniforms(pbr::create_point_lights(LIGHT_COUNT))?.with_label("point lights"),
            material: Resource::textures(pbr::create_material_images())?.with_label("material"),
            matrix,
            options,
            brdf: None,
            env: None,
            pending_brdf: assets::spawn_load("BRDF table", move || assets::brdf_or_fallback(brdf_path)),
            pending_env: assets::spawn_load("environment maps", move || assets::env_maps_or_fallback(env_dir)),
            plugin,
            controls: Controls::default(),
            shift_held: false,
            changes: Changes {
                matrices: true,
                ..Changes::default()
            },
            aspect: 1.0,
            lose_context: false,
        })
    }

    fn on_key(&mut self, code: KeyCode, shift: bool) -> AppControl {
        const STEP: f32 = 5.0;
        const FINE: f32 = 0.05;
        let sign = if shift { -1.0 } else { 1.0 };
        let c = &mut self.controls;

        match code {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::KeyX => c.rotate[0] += sign * STEP,
            KeyCode::KeyY => c.rotate[1] += sign * STEP,
            KeyCode::KeyZ => c.rotate[2] += sign * STEP,
            KeyCode::ArrowLeft => c.camera -= STEP,
            KeyCode::ArrowRight => c.camera += STEP,
            KeyCode::KeyM => c.metallic = (c.metallic + FINE).min(1.0),
            KeyCode::KeyN => c.metallic = (c.metallic - FINE).max(0.0),
            KeyCode::KeyR => c.roughness = (c.roughness + FINE).min(1.0),
            KeyCode::KeyF => c.roughness = (c.roughness - FINE).max(0.0),
            KeyCode::KeyI => c.light_direction[1] += 0.1,
            KeyCode::KeyK => c.light_direction[1] -= 0.1,
            KeyCode::KeyJ => c.light_direction[0] -= 0.1,
            KeyCode::KeyL => c.light_direction[0] += 0.1,
            KeyCode::KeyU => c.light_direction[2] -= 0.1,
            KeyCode::KeyO => c.light_direction[2] += 0.1,
            KeyCode::ArrowUp => c.light_strength += 0.1,
            KeyCode::ArrowDown => c.light_strength = (c.light_strength - 0.1).max(0.0),
            KeyCode::KeyC => c.light_color = (c.light_color + 1) % LIGHT_COLORS.len(),
            KeyCode::Delete => self.lose_context = true,
            _ => return AppControl::Continue,
        }

        match code {
            KeyCode::KeyX | KeyCode::KeyY | KeyCode::KeyZ | KeyCode::ArrowLeft | KeyCode::ArrowRight => {
                self.changes.matrices = true;
            }
            KeyCode::KeyM | KeyCode::KeyN | KeyCode::KeyR | KeyCode::KeyF => self.changes.options = true,
            KeyCode::Delete => {}
            _ => self.changes.lights = true,
        }
        AppControl::Continue
    }

    /// Turns finished loads into texture resources.
    fn poll_loads(&mut self) -> Result<(), Error> {
        if let Some(table) = self.pending_brdf.poll() {
            self.brdf = Some(pbr::create_brdf_texture(table)?.with_label("brdf"));
        }
        if let Some(maps) = self.pending_env.poll() {
            self.env = Some(pbr::create_env_texture(maps)?.with_label("environment"));
        }

        let ibl = if self.brdf.is_some() && self.env.is_some() { 1.0 } else { 0.0 };
        if self.options.get("u_IBL")?.as_number() != Some(ibl) {
            self.options.set("u_IBL", ibl)?;
        }
        Ok(())
    }

    /// Writes changed controls into their resources.
    fn apply_changes(&mut self) -> Result<(), Error> {
        let c = &self.controls;
        let changes = std::mem::take(&mut self.changes);

        if changes.matrices {
            let [rx, ry, rz] = c.rotate;
            let model = math::compute_model_mat(rx, ry, rz);
            let eye = math::compute_eye(BASE_EYE, c.camera);
            self.matrix
                .set("u_ModelMatrix", model)?
                .set("u_Camera", eye)?
                .set("u_MVPMatrix", math::compute_mvp_mat(&model, eye, CENTER, self.aspect))?;
        }

        if changes.options {
            self.options.set("u_MetallicRoughnessValues", [c.metallic, c.roughness])?;
        }

        if changes.lights {
            for i in 0..LIGHT_COUNT {
                self.lights
                    .set(&format!("u_Lights[{i}].direction"), c.light_direction)?
                    .set(&format!("u_Lights[{i}].strength"), c.light_strength)?
                    .set(&format!("u_Lights[{i}].color"), LIGHT_COLORS[c.light_color])?;
            }
        }
        Ok(())
    }

    fn render(&self, ctx: &mut FrameCtx<'_, '_>) -> Result<(), Error> {
        ctx.renderer.clear()?.draw(&self.plugin, &self.slots())?;
        ctx.present()
    }

    fn slots(&self) -> [Option<&Resource>; slot::COUNT] {
        let mut slots = [None; slot::COUNT];
        slots[slot::DATA] = Some(&self.data);
        slots[slot::INDEX] = Some(&self.index);
        slots[slot::BRDF] = self.brdf.as_ref();
        slots[slot::ENV] = self.env.as_ref();
        slots[slot::LIGHTS] = Some(&self.lights);
        slots[slot::MATERIAL] = Some(&self.material);
        slots[slot::MATRIX] = Some(&self.matrix);
        slots[slot::OPTIONS] = Some(&self.options);
        slots
    }
}

impl App for Gallery {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.on_key(*code, self.shift_held),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift_held = modifiers.state().shift_key();
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let aspect = ctx.window.aspect();
        if aspect != self.aspect {
            self.aspect = aspect;
            self.changes.matrices = true;
        }

        if let Err(e) = self.poll_loads().and_then(|()| self.apply_changes()) {
            log::warn!("control update rejected: {e}");
        }

        if std::mem::take(&mut self.lose_context) {
            ctx.renderer.notify_context_lost();
            return AppControl::Continue;
        }

        match self.render(ctx) {
            Ok(()) => AppControl::Continue,
            Err(Error::ContextLost) => {
                log::debug!("frame dropped: context lost");
                AppControl::Continue
            }
            Err(e @ Error::Backend(_)) => {
                log::error!("{e}");
                AppControl::Exit
            }
            Err(e) => {
                log::warn!("frame dropped: {e}");
                AppControl::Continue
            }
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let asset_dir = std::env::args().nth(1).map_or_else(|| PathBuf::from("assets"), PathBuf::from);
    log::info!("assets from {}\n{HELP}", asset_dir.display());

    let gallery = Gallery::new(asset_dir)?;
    let config = RuntimeConfig {
        title: "prism · PBR ball".to_string(),
        renderer: RendererConfig {
            clear_color: [0.05, 0.05, 0.07, 1.0],
            ..RendererConfig::default()
        },
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), gallery)
}
