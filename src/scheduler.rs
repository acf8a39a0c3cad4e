// src/scheduler.rs

//! Cooperative redraw scheduling over the host loop's deferred callbacks.
//!
//! Everything here runs on the single GUI thread. "Waiting" for the next
//! animation frame is a deferred re-invocation registered with the host
//! event loop, never a blocking sleep, so the loop stays responsive to other
//! events between frames.

use log::{trace, warn};
use std::time::Duration;

/// Identifies one outstanding deferred callback registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

/// The deferred-callback facility a host GUI toolkit must provide.
///
/// `schedule` registers a callback to fire after `delay`; the host delivers
/// the firing back to the surface as a
/// [`SurfaceEvent::RedrawFired`](crate::events::SurfaceEvent::RedrawFired)
/// carrying the returned id. `cancel` revokes a not-yet-fired callback.
/// Cancellation is synchronous and immediate: nothing else can run
/// concurrently on the GUI thread.
pub trait HostScheduler {
    /// Registers a deferred callback and returns its cancellation handle.
    fn schedule(&mut self, delay: Duration) -> CallbackId;

    /// Revokes a previously scheduled callback. Cancelling an id that has
    /// already fired is a no-op.
    fn cancel(&mut self, id: CallbackId);
}

/// Tracks the single outstanding redraw request for one surface.
///
/// Invariant: at most one scheduled callback exists at any instant. Any
/// transition that can invalidate the rendering context (unmap, teardown,
/// an expose-triggered immediate redraw) cancels the outstanding request
/// before optionally issuing a new one.
pub struct RedrawScheduler {
    host: Box<dyn HostScheduler>,
    pending: Option<CallbackId>,
}

impl RedrawScheduler {
    pub fn new(host: Box<dyn HostScheduler>) -> Self {
        RedrawScheduler {
            host,
            pending: None,
        }
    }

    /// Schedules the next redraw, superseding any outstanding request.
    pub fn arm(&mut self, delay: Duration) {
        self.cancel_pending();
        let id = self.host.schedule(delay);
        trace!("armed redraw callback {:?} in {:?}", id, delay);
        self.pending = Some(id);
    }

    /// Cancels the outstanding request, if any. Idempotent.
    pub fn cancel_pending(&mut self) {
        if let Some(id) = self.pending.take() {
            trace!("cancelling pending redraw callback {:?}", id);
            self.host.cancel(id);
        }
    }

    /// Records that a host callback fired. Returns `true` when `id` is the
    /// outstanding request (which is then cleared); a stale id from an
    /// already superseded request is ignored.
    pub fn acknowledge(&mut self, id: CallbackId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            warn!(
                "ignoring stale redraw callback {:?} (pending: {:?})",
                id, self.pending
            );
            false
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl std::fmt::Debug for RedrawScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedrawScheduler")
            .field("pending", &self.pending)
            .finish()
    }
}
