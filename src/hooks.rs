// src/hooks.rs

//! The consumer-supplied rendering contract.

/// Hooks a consumer implements to draw into a [`crate::surface::Surface`].
///
/// The surface guarantees that the correct context is current when either
/// hook runs and that `swap_buffers` follows every [`render`](Self::render).
/// Failures inside a hook are the consumer's responsibility; the surface
/// neither catches nor reclassifies them.
pub trait RenderHooks {
    /// Called once after context activation and again after every resize.
    ///
    /// This is the place to establish the projection matrix and any other
    /// dimension-dependent GL state. The viewport has already been set to
    /// `(0, 0, width, height)` when this runs.
    fn initialize(&mut self, width: u16, height: u16);

    /// Called once per redraw cycle to draw the frame.
    fn render(&mut self);
}
