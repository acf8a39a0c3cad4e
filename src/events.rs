// src/events.rs

//! Window events consumed from the host GUI toolkit.
//!
//! The host translates its native notifications (Tk-style `<Map>`,
//! `<Configure>`, `<Expose>`, ... or their equivalents) into
//! [`SurfaceEvent`]s and feeds them to
//! [`Surface::handle_event`](crate::surface::Surface::handle_event) on the
//! GUI thread.

use crate::platform::{VisualId, WindowHandle};
use crate::scheduler::CallbackId;

/// An event delivered by the host toolkit to drive the surface lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The window became visible on screen. Carries the native window handle
    /// (captured once; immutable for the mapped interval) and, when the host
    /// exposes one, the identifier of the visual it assigned to the window.
    Map {
        handle: WindowHandle,
        visual_id: Option<VisualId>,
    },
    /// The window was resized to the given dimensions in pixels.
    Configure { width_px: u16, height_px: u16 },
    /// Part of the window needs repainting.
    Expose,
    /// The window is no longer visible. The context is destroyed; a later
    /// re-map creates a fresh one.
    Unmap,
    /// The host widget is being torn down for good.
    Destroy,
    /// A deferred redraw callback registered with the host fired.
    RedrawFired { id: CallbackId },
}
