// src/lib.rs

//! Embeds a hardware-accelerated OpenGL rendering surface inside a portable,
//! event-driven desktop GUI toolkit.
//!
//! Three mutually incompatible native context-management APIs (X11/GLX,
//! Win32/WGL, macOS/CGL) hide behind one uniform lifecycle contract,
//! [`platform::ContextProvider`], selected once at startup. The host toolkit
//! feeds window events (map, configure, expose, unmap) to a
//! [`surface::Surface`], which owns the context lifecycle; redraws are driven
//! cooperatively through the host loop's deferred-callback facility via
//! [`scheduler::RedrawScheduler`], never a blocking wait. The consumer
//! supplies the actual GL drawing through [`hooks::RenderHooks`].
//!
//! Everything runs on the single GUI thread; the native APIs bind a context
//! to the thread that activated it.
//!
//! ```no_run
//! use glframe::config::SurfaceConfig;
//! use glframe::events::SurfaceEvent;
//! use glframe::hooks::RenderHooks;
//! use glframe::platform::{self, WindowHandle};
//! use glframe::scheduler::{CallbackId, HostScheduler};
//! use glframe::surface::Surface;
//! use std::time::Duration;
//!
//! struct Spinner;
//!
//! impl RenderHooks for Spinner {
//!     fn initialize(&mut self, _width: u16, _height: u16) {
//!         // Projection and viewport-dependent state.
//!     }
//!     fn render(&mut self) {
//!         // GL drawing for one frame.
//!     }
//! }
//!
//! // The host toolkit's deferred-callback facility (Tk `after`, a GLib
//! // timeout, ...), adapted to the HostScheduler trait.
//! struct Timers;
//!
//! impl HostScheduler for Timers {
//!     fn schedule(&mut self, _delay: Duration) -> CallbackId {
//!         CallbackId(1)
//!     }
//!     fn cancel(&mut self, _id: CallbackId) {}
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SurfaceConfig {
//!     animate_interval_ms: 16,
//!     ..Default::default()
//! };
//! let provider = platform::default_provider()?;
//! let mut surface = Surface::new(&config, provider, Box::new(Spinner), Box::new(Timers));
//!
//! // The host delivers its window notifications as surface events.
//! surface.handle_event(SurfaceEvent::Map {
//!     handle: WindowHandle(0x2600001),
//!     visual_id: None,
//! })?;
//! surface.handle_event(SurfaceEvent::Expose)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod hooks;
pub mod platform;
pub mod scheduler;
pub mod surface;

pub use config::SurfaceConfig;
pub use error::ContextError;
pub use events::SurfaceEvent;
pub use hooks::RenderHooks;
pub use platform::{ContextInfo, ContextProvider, PixelFormat, VisualId, WindowHandle};
pub use scheduler::{CallbackId, HostScheduler};
pub use surface::{LifecycleState, Surface};
