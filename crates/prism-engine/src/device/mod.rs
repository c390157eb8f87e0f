//! wgpu device, window surface and the [`Backend`](crate::render::Backend)
//! built on them.

mod backend;
mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use backend::WgpuBackend;
pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
