use winit::window::{CursorIcon, Window, WindowId};

use crate::device::WgpuBackend;
use crate::error::Result;
use crate::render::Renderer;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// The window a frame is rendered into.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Width over height; 1.0 while the window is minimized.
    pub fn aspect(&self) -> f32 {
        match self.size() {
            (w, h) if w > 0 && h > 0 => w as f32 / h as f32,
            _ => 1.0,
        }
    }

    pub fn set_cursor(&self, cursor: CursorIcon) {
        self.window.set_cursor(cursor);
    }
}

/// Everything `App::on_frame` may touch.
///
/// `'a` is the callback; `'w` is the window borrow held by the backend.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub renderer: &'a mut Renderer<WgpuBackend<'w>>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Presents whatever the renderer recorded this frame.
    pub fn present(&mut self) -> Result<()> {
        self.window.window.pre_present_notify();
        self.renderer.present()
    }
}
