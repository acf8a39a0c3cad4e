// src/surface/mod.rs

//! The rendering surface and its lifecycle state machine.
//!
//! A [`Surface`] owns exactly one native window binding and, while mapped,
//! exactly one rendering context obtained from its [`ContextProvider`]. The
//! host GUI toolkit drives it by translating native window notifications
//! into [`SurfaceEvent`]s; the surface reacts by creating, using, and
//! destroying the context in a strict order: the pending redraw callback is
//! always cancelled before the context is destroyed, and a destroyed context
//! is never reused — re-mapping creates a fresh one.
//!
//! Everything runs on the single GUI thread. The underlying context APIs
//! bind the context to the thread that activated it, so no other thread may
//! ever touch surface state.

#[cfg(test)]
mod tests;

use crate::config::SurfaceConfig;
use crate::error::ContextError;
use crate::events::SurfaceEvent;
use crate::hooks::RenderHooks;
use crate::platform::{ContextInfo, ContextProvider, PixelFormat, WindowBinding};
use crate::scheduler::{HostScheduler, RedrawScheduler};
use log::{debug, error, info, trace, warn};
use std::time::Duration;

/// Lifecycle states of a [`Surface`].
///
/// `Creating` is transient: it exists only while a map event is being
/// processed. `Failed` and `Destroyed` are terminal; no context operation is
/// ever attempted from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No window on screen and no context.
    Unmapped,
    /// A map event is being processed; the context is being negotiated.
    Creating,
    /// Context live, window mapped, redraws possible.
    Active,
    /// Context creation failed. Terminal.
    Failed,
    /// The host widget was torn down. Terminal.
    Destroyed,
}

/// A hardware-accelerated rendering surface embedded in a host GUI toolkit.
pub struct Surface {
    width: u16,
    height: u16,
    animate_interval_ms: u64,
    state: LifecycleState,
    window: Option<WindowBinding>,
    mapped: bool,
    initialized: bool,
    provider: Box<dyn ContextProvider>,
    hooks: Box<dyn RenderHooks>,
    scheduler: RedrawScheduler,
    render_count: u64,
}

impl Surface {
    /// Builds a surface from its construction-time configuration, the
    /// platform context provider, the consumer's render hooks, and the host
    /// loop's deferred-callback facility.
    ///
    /// The surface starts `Unmapped`; nothing touches the native APIs until
    /// the host delivers a map event.
    pub fn new(
        config: &SurfaceConfig,
        provider: Box<dyn ContextProvider>,
        hooks: Box<dyn RenderHooks>,
        host: Box<dyn HostScheduler>,
    ) -> Self {
        Surface {
            width: config.width,
            height: config.height,
            animate_interval_ms: config.animate_interval_ms,
            state: LifecycleState::Unmapped,
            window: None,
            mapped: false,
            initialized: false,
            provider,
            hooks,
            scheduler: RedrawScheduler::new(host),
            render_count: 0,
        }
    }

    /// Processes one host event.
    ///
    /// Only a map event can fail, and only with a fatal
    /// [`ContextError`]; the surface is then in the terminal `Failed` state
    /// and silently ignores everything that follows.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Result<(), ContextError> {
        trace!("surface event: {:?} (state: {:?})", event, self.state);
        match event {
            SurfaceEvent::Map { handle, visual_id } => self.on_map(WindowBinding {
                handle,
                visual_id,
            }),
            SurfaceEvent::Configure {
                width_px,
                height_px,
            } => {
                self.on_configure(width_px, height_px);
                Ok(())
            }
            SurfaceEvent::Expose => {
                self.on_expose();
                Ok(())
            }
            SurfaceEvent::RedrawFired { id } => {
                if self.scheduler.acknowledge(id) {
                    self.draw_frame();
                }
                Ok(())
            }
            SurfaceEvent::Unmap => {
                self.on_unmap();
                Ok(())
            }
            SurfaceEvent::Destroy => {
                self.on_destroy();
                Ok(())
            }
        }
    }

    fn on_map(&mut self, binding: WindowBinding) -> Result<(), ContextError> {
        if self.state != LifecycleState::Unmapped {
            warn!("ignoring map event in state {:?}", self.state);
            return Ok(());
        }
        info!(
            "mapping surface onto window {:?} (visual {:?})",
            binding.handle, binding.visual_id
        );
        self.state = LifecycleState::Creating;
        self.mapped = true;

        match self.provider.create_context(&binding) {
            Ok(format) => {
                debug!("context active with pixel format {:?}", format);
                self.window = Some(binding);
                self.state = LifecycleState::Active;
                self.hooks.initialize(self.width, self.height);
                self.initialized = true;
                Ok(())
            }
            Err(e) => {
                error!("context creation failed: {}", e);
                self.state = LifecycleState::Failed;
                Err(e)
            }
        }
    }

    fn on_configure(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        if self.state != LifecycleState::Active || !self.mapped {
            trace!("resize to {}x{} recorded while inactive", width, height);
            return;
        }
        let window = match self.window {
            Some(window) => window,
            None => return,
        };
        // Resize re-establishes the projection; it never recreates the
        // context.
        self.provider.make_current(&window);
        self.provider.resize_viewport(width, height);
        self.hooks.initialize(width, height);
    }

    fn on_expose(&mut self) {
        if self.state != LifecycleState::Active || !self.mapped {
            trace!("ignoring expose in state {:?}", self.state);
            return;
        }
        // An immediate redraw supersedes whatever was scheduled.
        self.scheduler.cancel_pending();
        self.draw_frame();
    }

    fn on_unmap(&mut self) {
        // Ordering is load-bearing: cancel the deferred callback first so it
        // can never fire against a destroyed context.
        self.scheduler.cancel_pending();
        self.provider.destroy_context();
        self.window = None;
        self.mapped = false;
        self.initialized = false;
        match self.state {
            LifecycleState::Failed | LifecycleState::Destroyed => {}
            _ => {
                info!("surface unmapped; context released");
                self.state = LifecycleState::Unmapped;
            }
        }
    }

    fn on_destroy(&mut self) {
        self.scheduler.cancel_pending();
        self.provider.destroy_context();
        self.window = None;
        self.mapped = false;
        self.initialized = false;
        if self.state != LifecycleState::Destroyed {
            info!("surface destroyed");
            self.state = LifecycleState::Destroyed;
        }
    }

    /// One complete redraw cycle: make-current, render, swap, optionally
    /// re-arm the animation callback.
    fn draw_frame(&mut self) {
        if self.state != LifecycleState::Active || !self.mapped {
            return;
        }
        let window = match self.window {
            Some(window) => window,
            None => return,
        };
        self.provider.make_current(&window);
        self.hooks.render();
        self.provider.swap_buffers(&window);
        self.render_count += 1;
        if self.animate_interval_ms > 0 {
            self.scheduler
                .arm(Duration::from_millis(self.animate_interval_ms));
        }
    }

    /// Current dimensions in pixels.
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of completed redraw cycles. Monotonically non-decreasing.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Updates the animation interval. Takes effect when the current cycle
    /// next re-arms; setting `0` stops self-rescheduling after the pending
    /// callback (if any) fires or is cancelled.
    pub fn set_animate_interval_ms(&mut self, interval_ms: u64) {
        self.animate_interval_ms = interval_ms;
    }

    /// The negotiated pixel format, while a context exists.
    pub fn pixel_format(&self) -> Option<&PixelFormat> {
        self.provider.pixel_format()
    }

    /// Vendor/renderer/version diagnostics of the live context. Intended for
    /// debugging, not control flow.
    pub fn context_info(&self) -> Option<ContextInfo> {
        self.provider.context_info()
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("state", &self.state)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mapped", &self.mapped)
            .field("initialized", &self.initialized)
            .field("animate_interval_ms", &self.animate_interval_ms)
            .finish()
    }
}
