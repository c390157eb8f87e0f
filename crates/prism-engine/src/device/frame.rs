/// An acquired surface texture plus the encoder recording into it.
///
/// Holding a frame blocks acquisition of the next one; pass it to
/// [`Gpu::present`](super::Gpu::present) as soon as recording is done.
pub struct GpuFrame {
    /// Swapchain texture for this frame.
    pub surface_texture: wgpu::SurfaceTexture,
    /// Render target view of `surface_texture`.
    pub view: wgpu::TextureView,
    /// Records this frame's passes.
    pub encoder: wgpu::CommandEncoder,
}
