// src/platform/mod.rs

//! The per-platform rendering-context strategy.
//!
//! Each target OS has exactly one [`ContextProvider`] implementation (GLX on
//! X11, WGL on Windows, CGL on macOS), chosen once at startup by
//! [`default_provider`]. A provider instance is exclusively owned by one
//! surface and holds at most one native context at a time; re-creation always
//! goes through [`ContextProvider::destroy_context`] first.
//!
//! The negotiation algorithm has the same shape on every platform, with
//! platform-specific parameters: query the context-API version, take the
//! legacy single-visual path below the modern threshold, otherwise enumerate
//! candidate configurations and prefer the one whose identifier matches the
//! visual the host toolkit already assigned to the window. The deterministic
//! matching step is [`select_config_index`].

use crate::error::ContextError;
use bitflags::bitflags;
use log::debug;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod glx;

#[cfg(target_os = "windows")]
pub mod wgl;

#[cfg(target_os = "macos")]
pub mod cgl;

#[cfg(test)]
pub mod mock;


/// An opaque native window handle (an X11 window XID, a Win32 `HWND`, or the
/// platform equivalent), as reported by the host toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// The identifier of a pixel format / visual / framebuffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId(pub u64);

/// The native window a context is bound to, captured at map time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBinding {
    pub handle: WindowHandle,
    /// The visual/format identifier the host toolkit assigned to the window,
    /// when the host exposes one. Used to steer negotiation toward a
    /// configuration compatible with the existing window.
    pub visual_id: Option<VisualId>,
}

bitflags! {
    /// Capabilities requested from pixel-format negotiation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormatFlags: u32 {
        /// RGBA color (as opposed to color-index rendering).
        const RGBA            = 1 << 0;
        /// A front and a back buffer.
        const DOUBLE_BUFFER   = 1 << 1;
        /// Usable for rendering to an on-screen window.
        const WINDOW_DRAWABLE = 1 << 2;
    }
}

/// The attribute set handed to a platform's negotiation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRequest {
    pub flags: FormatFlags,
    /// Minimum bits per color channel.
    pub min_channel_bits: u8,
    /// Minimum depth-buffer bits.
    pub min_depth_bits: u8,
}

impl FormatRequest {
    /// The minimal attribute set used on the legacy single-visual path:
    /// RGBA, double-buffered, at least 4 bits per channel, 16-bit depth.
    pub const LEGACY: FormatRequest = FormatRequest {
        flags: FormatFlags::RGBA.union(FormatFlags::DOUBLE_BUFFER),
        min_channel_bits: 4,
        min_depth_bits: 16,
    };

    /// The broader attribute set used when enumerating framebuffer
    /// configurations: window-drawable, RGBA-renderable, double-buffered,
    /// at least 1 bit per channel.
    pub const ENUMERATION: FormatRequest = FormatRequest {
        flags: FormatFlags::RGBA
            .union(FormatFlags::DOUBLE_BUFFER)
            .union(FormatFlags::WINDOW_DRAWABLE),
        min_channel_bits: 1,
        min_depth_bits: 0,
    };
}

/// The negotiated pixel-format descriptor of a live context.
///
/// Immutable once the context is created: resizing never renegotiates, it
/// only updates the viewport and re-runs the consumer's `initialize` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    /// Total color bits (summed across channels).
    pub color_bits: u8,
    /// Depth-buffer bits.
    pub depth_bits: u8,
    /// Whether the format is double-buffered. When `false`, swap-buffers is
    /// a no-op rather than an error.
    pub double_buffer: bool,
    /// The identifier of the chosen configuration, when the platform
    /// exposes one.
    pub visual_id: Option<VisualId>,
}

/// Vendor/renderer/version strings and the extension list of a live context.
///
/// Intended for debugging and bug reports, not for control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub extensions: Vec<String>,
}

impl ContextInfo {
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }
}

/// Uniform lifecycle contract over the three native context-management APIs.
///
/// A provider is driven exclusively from the single GUI thread; the native
/// APIs bind the context to the thread that activated it. The owning surface
/// gates every call on its mapped flag, so a provider never sees operations
/// for a window that is not on screen. Providers additionally treat every
/// operation except creation as a no-op while no context exists, which keeps
/// [`destroy_context`](Self::destroy_context) idempotent.
pub trait ContextProvider {
    /// Negotiates a pixel format, creates the native context against
    /// `window`, and binds it as current on the calling thread.
    ///
    /// Fails with [`ContextError::Negotiation`] when zero candidate
    /// configurations exist and [`ContextError::Creation`] when the native
    /// creation call reports a non-success status. An inexact visual match
    /// is not a failure: the provider falls back to the first enumerated
    /// configuration and logs a warning.
    fn create_context(&mut self, window: &WindowBinding) -> Result<PixelFormat, ContextError>;

    /// Binds the context to the calling thread's GL state. No-op without a
    /// context.
    fn make_current(&mut self, window: &WindowBinding);

    /// Presents the back buffer. No-op without a context, and a no-op (not
    /// an error) when the negotiated format is single-buffered.
    fn swap_buffers(&mut self, window: &WindowBinding);

    /// Sets the viewport of the current context to `(0, 0, width, height)`.
    fn resize_viewport(&mut self, width: u16, height: u16);

    /// Releases all native resources of the context. Idempotent.
    fn destroy_context(&mut self);

    /// Whether a live context exists.
    fn has_context(&self) -> bool;

    /// The immutable descriptor negotiated at creation, while the context
    /// lives.
    fn pixel_format(&self) -> Option<&PixelFormat>;

    /// Vendor/renderer/version diagnostics of the live context.
    fn context_info(&self) -> Option<ContextInfo>;
}

/// Picks a configuration from `candidates`.
///
/// The configuration whose identifier equals `ideal` wins; otherwise the
/// first enumerated one does. Returns `None` when there are no candidates at
/// all. The second element reports whether the match was exact — an inexact
/// pick is the degrade-gracefully case the caller should log.
///
/// The tie-break is deliberately not attribute-scored: exact identifier
/// match, else index 0, keeps the choice deterministic across drivers.
pub fn select_config_index(ideal: Option<VisualId>, candidates: &[VisualId]) -> Option<(usize, bool)> {
    if candidates.is_empty() {
        return None;
    }
    if let Some(ideal) = ideal {
        if let Some(index) = candidates.iter().position(|&id| id == ideal) {
            debug!(
                "matched host visual {:?} at configuration index {}",
                ideal, index
            );
            return Some((index, true));
        }
    }
    Some((0, false))
}

/// Constructs the context provider for the target OS.
#[cfg(all(unix, not(target_os = "macos")))]
pub fn default_provider() -> Result<Box<dyn ContextProvider>, ContextError> {
    Ok(Box::new(glx::GlxContextProvider::new()?))
}

/// Constructs the context provider for the target OS.
#[cfg(target_os = "windows")]
pub fn default_provider() -> Result<Box<dyn ContextProvider>, ContextError> {
    Ok(Box::new(wgl::WglContextProvider::new()))
}

/// Constructs the context provider for the target OS.
#[cfg(target_os = "macos")]
pub fn default_provider() -> Result<Box<dyn ContextProvider>, ContextError> {
    Ok(Box::new(cgl::CglContextProvider::new()))
}
