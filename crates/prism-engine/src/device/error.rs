/// What the caller should do after a surface acquisition failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was reconfigured; the next frame may succeed.
    Reconfigured,
    /// Transient failure; drop this frame.
    SkipFrame,
    /// Unrecoverable (out of memory).
    Fatal,
}
