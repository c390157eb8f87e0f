//! Rendering strategies.
//!
//! A [`Plugin`] declares the positional resource slots it consumes
//! ([`Schema`]), the GPU program it runs ([`ProgramDesc`]) and how a bound
//! set of resources becomes a draw ([`Plugin::issue_draw`]).

mod program;
mod schema;

pub use program::{AttributeDecl, ProgramDesc, TextureDecl, TextureDimension, UniformDecl, UniformType};
pub use schema::{BoundState, Schema, SlotDecl};

use crate::error::Result;
use crate::render::{DrawPass, Topology};
use crate::resource::Resource;

/// A pluggable rendering strategy.
///
/// Plugins are identified by [`name`](Plugin::name): the renderer builds the
/// program once per name and treats a draw with a different name as a
/// plugin switch.
pub trait Plugin {
    fn name(&self) -> &str;

    /// Declared slots, in positional order.
    fn schema(&self) -> &Schema;

    /// Program built by the backend the first time the plugin is attached.
    fn program(&self) -> ProgramDesc;

    /// Matches positional resources against [`schema`](Plugin::schema).
    fn bind<'r>(&self, resources: &[Option<&'r Resource>]) -> Result<BoundState<'r>> {
        self.schema().bind(self.name(), resources)
    }

    /// Issues the GPU work for one bound state.
    ///
    /// The default composes every bound resource into a single triangle-list
    /// draw, indexed when index data is bound.
    fn issue_draw(&self, pass: &mut DrawPass<'_>, bound: &BoundState<'_>) -> Result<()> {
        pass.draw_bound(bound, Topology::TriangleList)
    }
}
