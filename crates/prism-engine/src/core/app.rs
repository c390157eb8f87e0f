use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;

/// What the runtime does after an app callback returns.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    /// Keep running.
    Continue,
    /// Close every window and leave the event loop.
    Exit,
}

/// Callbacks the window runtime drives.
pub trait App {
    /// Raw winit events, before the runtime handles resize and close.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Once per redraw of each window. Clear, draw and present here.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
