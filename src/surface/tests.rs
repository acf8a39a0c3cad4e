// src/surface/tests.rs

use super::{LifecycleState, Surface};
use crate::config::SurfaceConfig;
use crate::error::ContextError;
use crate::events::SurfaceEvent;
use crate::hooks::RenderHooks;
use crate::platform::mock::{MockContextProvider, TraceEvent, TraceLog};
use crate::platform::{VisualId, WindowHandle};
use crate::scheduler::{CallbackId, HostScheduler};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

// --- Test doubles -----------------------------------------------------------

#[derive(Default)]
struct HostState {
    next_id: u64,
    outstanding: Vec<u64>,
    max_outstanding: usize,
}

impl HostState {
    /// Simulates the host timer firing the oldest deferred callback.
    fn fire_next(&mut self) -> Option<CallbackId> {
        if self.outstanding.is_empty() {
            return None;
        }
        Some(CallbackId(self.outstanding.remove(0)))
    }
}

/// A host-loop double that records scheduling traffic into the shared trace.
struct FakeHost {
    state: Rc<RefCell<HostState>>,
    log: TraceLog,
}

impl HostScheduler for FakeHost {
    fn schedule(&mut self, _delay: Duration) -> CallbackId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.outstanding.push(id);
        state.max_outstanding = state.max_outstanding.max(state.outstanding.len());
        self.log.push(TraceEvent::Schedule { id });
        CallbackId(id)
    }

    fn cancel(&mut self, id: CallbackId) {
        self.state.borrow_mut().outstanding.retain(|&o| o != id.0);
        self.log.push(TraceEvent::Cancel { id: id.0 });
    }
}

#[derive(Default)]
struct HookCalls {
    initialize: Vec<(u16, u16)>,
    renders: u64,
}

struct RecordingHooks {
    calls: Rc<RefCell<HookCalls>>,
}

impl RenderHooks for RecordingHooks {
    fn initialize(&mut self, width: u16, height: u16) {
        self.calls.borrow_mut().initialize.push((width, height));
    }

    fn render(&mut self) {
        self.calls.borrow_mut().renders += 1;
    }
}

struct Fixture {
    surface: Surface,
    log: TraceLog,
    host: Rc<RefCell<HostState>>,
    hooks: Rc<RefCell<HookCalls>>,
}

fn fixture_with(interval_ms: u64, provider: MockContextProvider, log: TraceLog) -> Fixture {
    let host = Rc::new(RefCell::new(HostState::default()));
    let hooks = Rc::new(RefCell::new(HookCalls::default()));
    let config = SurfaceConfig {
        width: 640,
        height: 480,
        animate_interval_ms: interval_ms,
    };
    let surface = Surface::new(
        &config,
        Box::new(provider),
        Box::new(RecordingHooks {
            calls: Rc::clone(&hooks),
        }),
        Box::new(FakeHost {
            state: Rc::clone(&host),
            log: log.clone(),
        }),
    );
    Fixture {
        surface,
        log,
        host,
        hooks,
    }
}

fn fixture(interval_ms: u64) -> Fixture {
    let log = TraceLog::new();
    let provider = MockContextProvider::new(log.clone());
    fixture_with(interval_ms, provider, log)
}

fn map_event() -> SurfaceEvent {
    SurfaceEvent::Map {
        handle: WindowHandle(0x2600001),
        visual_id: Some(VisualId(0x21)),
    }
}

fn creations(log: &TraceLog) -> usize {
    log.count(|e| matches!(e, TraceEvent::CreateContext { .. }))
}

// --- Lifecycle --------------------------------------------------------------

#[test_log::test]
fn it_should_create_a_context_exactly_once_per_map() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    fx.surface
        .handle_event(SurfaceEvent::Configure {
            width_px: 300,
            height_px: 200,
        })
        .unwrap();

    assert_eq!(creations(&fx.log), 1);
    assert_eq!(fx.surface.state(), LifecycleState::Active);
}

#[test_log::test]
fn it_should_ignore_a_second_map_while_active() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(map_event()).unwrap();

    assert_eq!(creations(&fx.log), 1);
}

#[test_log::test]
fn it_should_create_a_distinct_context_after_remap() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Unmap).unwrap();
    assert_eq!(fx.surface.state(), LifecycleState::Unmapped);

    fx.surface.handle_event(map_event()).unwrap();

    let events = fx.log.events();
    assert_eq!(
        events,
        vec![
            TraceEvent::CreateContext { generation: 1 },
            TraceEvent::DestroyContext,
            TraceEvent::CreateContext { generation: 2 },
        ]
    );
}

#[test_log::test]
fn it_should_initialize_once_on_activation_with_configured_dimensions() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();

    assert!(fx.surface.is_initialized());
    assert_eq!(fx.hooks.borrow().initialize, vec![(640, 480)]);
}

#[test_log::test]
fn it_should_enter_the_failed_state_when_creation_fails() {
    let log = TraceLog::new();
    let provider = MockContextProvider::new(log.clone()).with_creation_failure();
    let mut fx = fixture_with(0, provider, log);

    let result = fx.surface.handle_event(map_event());
    assert!(matches!(result, Err(ContextError::Creation(_))));
    assert_eq!(fx.surface.state(), LifecycleState::Failed);
    assert!(!fx.surface.is_initialized());

    // The failed state is terminal: nothing reaches the provider any more.
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    fx.surface
        .handle_event(SurfaceEvent::Configure {
            width_px: 100,
            height_px: 100,
        })
        .unwrap();
    fx.surface.handle_event(map_event()).unwrap();
    assert!(fx.log.events().is_empty());
    assert_eq!(fx.surface.state(), LifecycleState::Failed);
}

#[test_log::test]
fn it_should_destroy_the_context_on_destroy_and_ignore_later_events() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Destroy).unwrap();

    assert_eq!(fx.surface.state(), LifecycleState::Destroyed);
    assert_eq!(fx.log.count(|e| matches!(e, TraceEvent::DestroyContext)), 1);

    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    assert_eq!(creations(&fx.log), 1);
    assert_eq!(fx.surface.state(), LifecycleState::Destroyed);
}

// --- Resize -----------------------------------------------------------------

#[test_log::test]
fn it_should_pass_resize_dimensions_downstream_exactly_once() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface
        .handle_event(SurfaceEvent::Configure {
            width_px: 300,
            height_px: 200,
        })
        .unwrap();

    let viewports: Vec<_> = fx
        .log
        .events()
        .into_iter()
        .filter(|e| matches!(e, TraceEvent::Viewport { .. }))
        .collect();
    assert_eq!(viewports, vec![TraceEvent::Viewport { width: 300, height: 200 }]);
    // initialize: once on activation, once per resize. Never zero, never
    // twice for one event.
    assert_eq!(fx.hooks.borrow().initialize, vec![(640, 480), (300, 200)]);
    assert_eq!(fx.surface.size(), (300, 200));
    assert_eq!(creations(&fx.log), 1);
}

#[test_log::test]
fn it_should_record_but_not_apply_a_resize_while_unmapped() {
    let mut fx = fixture(0);
    fx.surface
        .handle_event(SurfaceEvent::Configure {
            width_px: 800,
            height_px: 600,
        })
        .unwrap();

    assert_eq!(fx.surface.size(), (800, 600));
    assert!(fx.log.events().is_empty());
    assert!(fx.hooks.borrow().initialize.is_empty());

    // The recorded size feeds the first initialize after mapping.
    fx.surface.handle_event(map_event()).unwrap();
    assert_eq!(fx.hooks.borrow().initialize, vec![(800, 600)]);
}

// --- Redraw and mapping gates ----------------------------------------------

#[test_log::test]
fn it_should_redraw_in_order_on_expose() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();

    let events = fx.log.events();
    assert_eq!(
        events,
        vec![
            TraceEvent::CreateContext { generation: 1 },
            TraceEvent::MakeCurrent,
            TraceEvent::SwapBuffers,
        ]
    );
    assert_eq!(fx.hooks.borrow().renders, 1);
    assert_eq!(fx.surface.render_count(), 1);
}

#[test_log::test]
fn it_should_not_touch_the_context_while_unmapped() {
    let mut fx = fixture(0);
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    assert!(fx.log.events().is_empty());

    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Unmap).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();

    // No make-current or swap after the context died.
    let destroy_at = fx
        .log
        .position(|e| matches!(e, TraceEvent::DestroyContext))
        .unwrap();
    let events = fx.log.events();
    assert!(events[destroy_at + 1..]
        .iter()
        .all(|e| !matches!(e, TraceEvent::MakeCurrent | TraceEvent::SwapBuffers)));
    assert_eq!(fx.hooks.borrow().renders, 0);
}

#[test_log::test]
fn it_should_clear_initialized_on_unmap() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    assert!(fx.surface.is_initialized());

    fx.surface.handle_event(SurfaceEvent::Unmap).unwrap();
    assert!(!fx.surface.is_initialized());
    assert!(!fx.surface.is_mapped());
}

// --- Scheduling -------------------------------------------------------------

#[test_log::test]
fn it_should_not_rearm_without_an_animation_interval() {
    let mut fx = fixture(0);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();

    assert_eq!(fx.log.count(|e| matches!(e, TraceEvent::Schedule { .. })), 0);
    assert!(fx.host.borrow().outstanding.is_empty());
}

#[test_log::test]
fn it_should_rearm_after_each_animated_redraw() {
    // Scenario: interval of 1 ms and negligible render cost. Each fired
    // callback produces exactly one redraw and one re-arm, so after T
    // firings the counter reads T plus the initial expose.
    let mut fx = fixture(1);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    assert_eq!(fx.surface.render_count(), 1);

    let mut last = fx.surface.render_count();
    for _ in 0..10 {
        let id = fx.host.borrow_mut().fire_next().unwrap();
        fx.surface
            .handle_event(SurfaceEvent::RedrawFired { id })
            .unwrap();
        assert!(fx.surface.render_count() >= last);
        last = fx.surface.render_count();
    }

    assert_eq!(fx.surface.render_count(), 11);
    assert_eq!(fx.hooks.borrow().renders, 11);
    assert_eq!(
        fx.log.count(|e| matches!(e, TraceEvent::Schedule { .. })),
        11
    );
}

#[test_log::test]
fn it_should_keep_at_most_one_outstanding_callback() {
    let mut fx = fixture(1);
    fx.surface.handle_event(map_event()).unwrap();
    // Expose storms and timer firings interleaved.
    for _ in 0..5 {
        fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    }
    for _ in 0..3 {
        let id = fx.host.borrow_mut().fire_next().unwrap();
        fx.surface
            .handle_event(SurfaceEvent::RedrawFired { id })
            .unwrap();
    }
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();

    assert_eq!(fx.host.borrow().max_outstanding, 1);
}

#[test_log::test]
fn it_should_cancel_the_pending_callback_on_expose_before_redrawing() {
    let mut fx = fixture(1);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();

    let events = fx.log.events();
    let cancel_at = events
        .iter()
        .position(|e| matches!(e, TraceEvent::Cancel { id: 1 }))
        .unwrap();
    let second_draw_at = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, TraceEvent::MakeCurrent))
        .map(|(i, _)| i)
        .nth(1)
        .unwrap();
    assert!(cancel_at < second_draw_at);
    assert_eq!(fx.host.borrow().outstanding.len(), 1);
}

#[test_log::test]
fn it_should_ignore_stale_callback_ids() {
    let mut fx = fixture(1);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();

    fx.surface
        .handle_event(SurfaceEvent::RedrawFired {
            id: CallbackId(999),
        })
        .unwrap();

    assert_eq!(fx.surface.render_count(), 1);
    // The genuine pending callback is still honored afterwards.
    let id = fx.host.borrow_mut().fire_next().unwrap();
    fx.surface
        .handle_event(SurfaceEvent::RedrawFired { id })
        .unwrap();
    assert_eq!(fx.surface.render_count(), 2);
}

#[test_log::test]
fn it_should_cancel_the_pending_redraw_before_destroying_on_unmap() {
    // Scenario: an unmap arrives while an animation callback is pending.
    let mut fx = fixture(1);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();
    assert!(!fx.host.borrow().outstanding.is_empty());

    fx.surface.handle_event(SurfaceEvent::Unmap).unwrap();

    let cancel_at = fx
        .log
        .position(|e| matches!(e, TraceEvent::Cancel { .. }))
        .unwrap();
    let destroy_at = fx
        .log
        .position(|e| matches!(e, TraceEvent::DestroyContext))
        .unwrap();
    assert!(cancel_at < destroy_at);
    assert!(fx.host.borrow().outstanding.is_empty());

    // A late firing of the cancelled id must not reach the dead context.
    fx.surface
        .handle_event(SurfaceEvent::RedrawFired { id: CallbackId(1) })
        .unwrap();
    let events = fx.log.events();
    assert!(events[destroy_at + 1..]
        .iter()
        .all(|e| !matches!(e, TraceEvent::MakeCurrent | TraceEvent::SwapBuffers)));
}

#[test_log::test]
fn it_should_stop_animating_when_the_interval_is_cleared() {
    let mut fx = fixture(1);
    fx.surface.handle_event(map_event()).unwrap();
    fx.surface.handle_event(SurfaceEvent::Expose).unwrap();

    fx.surface.set_animate_interval_ms(0);
    let id = fx.host.borrow_mut().fire_next().unwrap();
    fx.surface
        .handle_event(SurfaceEvent::RedrawFired { id })
        .unwrap();

    assert_eq!(fx.surface.render_count(), 2);
    assert!(fx.host.borrow().outstanding.is_empty());
}

// --- Diagnostics ------------------------------------------------------------

#[test_log::test]
fn it_should_expose_diagnostics_only_while_a_context_exists() {
    let mut fx = fixture(0);
    assert!(fx.surface.context_info().is_none());
    assert!(fx.surface.pixel_format().is_none());

    fx.surface.handle_event(map_event()).unwrap();
    let info = fx.surface.context_info().unwrap();
    assert_eq!(info.vendor, "Mock Vendor");
    assert_eq!(info.extension_count(), 2);
    let format = fx.surface.pixel_format().unwrap();
    assert!(format.double_buffer);
    assert_eq!(format.visual_id, Some(VisualId(0x21)));

    fx.surface.handle_event(SurfaceEvent::Unmap).unwrap();
    assert!(fx.surface.context_info().is_none());
}
