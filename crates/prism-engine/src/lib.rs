//! Prism engine.
//!
//! Typed GPU resources over [`prism_value::Value`] payloads, plugins that
//! declare which resources they consume, and a renderer that composes both
//! into draws on a wgpu surface (or a headless recorder).
//!
//! ```ignore
//! let mut uniforms = Resource::uniforms(Value::object([("u_Color", Value::from([1.0, 0.0, 0.0]))]))?;
//! uniforms.set("u_Color[1]", 0.5)?;
//!
//! renderer.clear()?.draw(&plugin, &[Some(&vertices), Some(&indices), Some(&uniforms), None])?;
//! renderer.present()?;
//! ```

pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod render;
pub mod resource;
pub mod time;
pub mod window;

pub use error::{Error, Result};
pub use prism_value::{Path, PathError, Value};
