use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::plugin::Plugin;
use crate::resource::{Resource, ResourceId};

use super::backend::{Backend, ClearState};
use super::cache::ResourceCache;
use super::pass::{ActiveProgram, DrawPass};

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// RGBA the output is cleared to.
    pub clear_color: [f64; 4],
    pub clear_depth: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
        }
    }
}

/// Cumulative counters since the renderer was created.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RenderStats {
    /// Resources uploaded (or re-uploaded) to the backend.
    pub uploads: u64,
    /// Draw calls issued to the backend.
    pub draws: u64,
    /// `draw` calls rejected before or during issue.
    pub rejected: u64,
    /// Absent optional slots skipped by successful draws.
    pub skipped_slots: u64,
}

/// Composes resources and one active plugin into draws.
///
/// Typical frame:
///
/// ```ignore
/// renderer.clear()?.draw(&plugin, &[Some(&vertices), Some(&indices), Some(&uniforms), None])?;
/// renderer.present()?;
/// ```
pub struct Renderer<B: Backend> {
    backend: B,
    config: RendererConfig,

    /// Name of the attached plugin; `attach` is the only writer.
    active: Option<String>,
    programs: HashMap<String, ActiveProgram>,

    cache: ResourceCache,
    last_bound: Vec<Option<ResourceId>>,
    stats: RenderStats,
    context_lost: bool,

    warned: HashSet<String>,
}

impl<B: Backend> Renderer<B> {
    pub fn new(backend: B, config: RendererConfig) -> Self {
        Self {
            backend,
            config,
            active: None,
            programs: HashMap::new(),
            cache: ResourceCache::default(),
            last_bound: Vec::new(),
            stats: RenderStats::default(),
            context_lost: false,
            warned: HashSet::new(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn set_clear_color(&mut self, color: [f64; 4]) {
        self.config.clear_color = color;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Resource ids of the last successful draw, one entry per slot.
    pub fn last_bound(&self) -> &[Option<ResourceId>] {
        &self.last_bound
    }

    pub fn active_plugin(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Resets the output to the configured clear color and depth.
    pub fn clear(&mut self) -> Result<&mut Self> {
        self.check_context()?;
        let state = ClearState {
            color: self.config.clear_color,
            depth: self.config.clear_depth,
        };
        self.guard(|backend| backend.clear(state))?;
        Ok(self)
    }

    /// Makes `plugin` the active plugin, building its program on first use.
    pub fn attach(&mut self, plugin: &dyn Plugin) -> Result<()> {
        self.check_context()?;
        let name = plugin.name();

        if !self.programs.contains_key(name) {
            let desc = plugin.program();
            let handle = self.guard(|backend| backend.create_program(&desc))?;
            log::debug!("built program `{}` for plugin `{name}`", desc.label);
            self.programs.insert(name.to_string(), ActiveProgram { handle, desc });
        }

        if self.active.as_deref() != Some(name) {
            log::debug!("attached plugin `{name}`");
            self.active = Some(name.to_string());
        }
        Ok(())
    }

    /// Binds `slots` against `plugin` and issues its draw.
    ///
    /// `None` slots are absent resources. On error nothing is drawn and the
    /// state of the last successful draw is kept; the renderer stays usable.
    pub fn draw(&mut self, plugin: &dyn Plugin, slots: &[Option<&Resource>]) -> Result<&mut Self> {
        self.check_context()?;
        if self.active.as_deref() != Some(plugin.name()) || !self.programs.contains_key(plugin.name()) {
            self.attach(plugin)?;
        }

        let bound = match plugin.bind(slots) {
            Ok(bound) => bound,
            Err(e) => {
                self.stats.rejected += 1;
                return Err(e);
            }
        };

        let Some(program) = self.programs.get(plugin.name()) else {
            return Err(Error::Backend(format!("no program for plugin `{}`", plugin.name())));
        };

        let mut pass = DrawPass {
            plugin: plugin.name(),
            program,
            backend: &mut self.backend,
            cache: &mut self.cache,
            stats: &mut self.stats,
            warned: &mut self.warned,
        };

        if let Err(e) = plugin.issue_draw(&mut pass, &bound) {
            self.stats.rejected += 1;
            if e == Error::ContextLost || self.backend.is_context_lost() {
                self.lose_context();
            }
            return Err(e);
        }

        self.stats.skipped_slots += bound.absent() as u64;
        self.last_bound = bound.ids();
        Ok(self)
    }

    /// Submits the frame.
    pub fn present(&mut self) -> Result<()> {
        self.check_context()?;
        self.guard(|backend| backend.present())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }

    /// Releases the GPU objects held for `resource`.
    ///
    /// The resource itself stays valid; a later draw uploads it again.
    pub fn dispose(&mut self, resource: &Resource) -> bool {
        let released = self.cache.release(&mut self.backend, resource.id());
        if released {
            log::debug!("released GPU objects of resource {}", resource.id());
        }
        released
    }

    pub fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    /// Marks the context as lost. Every cached handle is dropped.
    pub fn notify_context_lost(&mut self) {
        self.lose_context();
    }

    /// Installs a fresh backend after a context loss.
    ///
    /// The active plugin is kept; its program is rebuilt and every resource
    /// is uploaded again on the next draw.
    pub fn recover(&mut self, backend: B) {
        self.backend.shutdown();
        self.install(backend);
    }

    /// Shuts the lost backend down, then builds its replacement with `make`.
    ///
    /// The old backend's surface is gone before `make` runs, so `make` may
    /// create a new one for the same window. When `make` fails the renderer
    /// stays lost and the call can be retried.
    pub fn recover_with<F>(&mut self, make: F) -> Result<()>
    where
        F: FnOnce() -> Result<B>,
    {
        self.lose_context();
        self.backend.shutdown();
        let backend = make()?;
        self.install(backend);
        Ok(())
    }

    fn install(&mut self, backend: B) {
        self.backend = backend;
        self.cache.forget_all();
        self.programs.clear();
        self.context_lost = false;
        log::info!("rendering context recovered");
    }

    fn check_context(&mut self) -> Result<()> {
        if !self.context_lost && self.backend.is_context_lost() {
            self.lose_context();
        }
        if self.context_lost {
            return Err(Error::ContextLost);
        }
        Ok(())
    }

    fn lose_context(&mut self) {
        if !self.context_lost {
            log::warn!("rendering context lost; dropping {} cached resources", self.cache.len());
        }
        self.context_lost = true;
        self.cache.forget_all();
        self.programs.clear();
    }

    /// Runs a backend call, switching to the lost state when it reports loss.
    fn guard<T>(&mut self, f: impl FnOnce(&mut B) -> Result<T>) -> Result<T> {
        let result = f(&mut self.backend);
        if matches!(result, Err(Error::ContextLost)) {
            self.lose_context();
        }
        result
    }
}
