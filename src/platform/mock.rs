// src/platform/mock.rs

//! A scripted context provider for tests.
//!
//! `MockContextProvider` mirrors the shape of the real negotiation algorithm
//! (version query, legacy single-visual path, enumeration with host-visual
//! matching) against a scripted API version and candidate list, and records
//! every lifecycle call into a shared [`TraceLog`] so tests can assert on
//! ordering across the provider and the host scheduler.

use crate::error::ContextError;
use crate::platform::{
    select_config_index, ContextInfo, ContextProvider, PixelFormat, VisualId, WindowBinding,
};
use std::cell::RefCell;
use std::rc::Rc;

/// One recorded call, in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    CreateContext { generation: u32 },
    MakeCurrent,
    SwapBuffers,
    Viewport { width: u16, height: u16 },
    DestroyContext,
    Schedule { id: u64 },
    Cancel { id: u64 },
}

/// A shared, cloneable event trace. Single-threaded by design, like
/// everything else in this crate.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: Rc<RefCell<Vec<TraceEvent>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: TraceEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    /// Index of the first event matching `predicate`, if any.
    pub fn position<F: Fn(&TraceEvent) -> bool>(&self, predicate: F) -> Option<usize> {
        self.events.borrow().iter().position(|e| predicate(e))
    }

    pub fn count<F: Fn(&TraceEvent) -> bool>(&self, predicate: F) -> usize {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }
}

/// What the last negotiation did, for scenario assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiation {
    /// Whether the configuration-enumeration path ran (as opposed to the
    /// legacy single-visual path).
    pub enumerated: bool,
    /// Index of the chosen candidate (always 0 on the legacy path).
    pub chosen_index: usize,
    /// Whether the choice fell back to index 0 because nothing matched the
    /// host-assigned visual.
    pub degraded: bool,
}

pub struct MockContextProvider {
    api_version: (u32, u32),
    candidate_visuals: Vec<VisualId>,
    double_buffer: bool,
    fail_creation: bool,
    log: TraceLog,
    generation: u32,
    live_generation: Option<u32>,
    pixel_format: Option<PixelFormat>,
    last_negotiation: Option<Negotiation>,
}

impl MockContextProvider {
    pub fn new(log: TraceLog) -> Self {
        MockContextProvider {
            api_version: (1, 4),
            candidate_visuals: vec![VisualId(0x21)],
            double_buffer: true,
            fail_creation: false,
            log,
            generation: 0,
            live_generation: None,
            pixel_format: None,
            last_negotiation: None,
        }
    }

    /// Scripts the context-API version reported during negotiation.
    pub fn with_api_version(mut self, major: u32, minor: u32) -> Self {
        self.api_version = (major, minor);
        self
    }

    /// Scripts the enumerated candidate configurations.
    pub fn with_candidate_visuals(mut self, visuals: Vec<VisualId>) -> Self {
        self.candidate_visuals = visuals;
        self
    }

    /// Scripts a single-buffered negotiated format.
    pub fn with_single_buffer(mut self) -> Self {
        self.double_buffer = false;
        self
    }

    /// Scripts an unconditional creation failure.
    pub fn with_creation_failure(mut self) -> Self {
        self.fail_creation = true;
        self
    }

    pub fn last_negotiation(&self) -> Option<Negotiation> {
        self.last_negotiation
    }

    /// Generation number of the live context, if any. Each successful
    /// creation yields a fresh generation, so re-mapping is observable as a
    /// distinct instance.
    pub fn live_generation(&self) -> Option<u32> {
        self.live_generation
    }
}

impl ContextProvider for MockContextProvider {
    fn create_context(&mut self, window: &WindowBinding) -> Result<PixelFormat, ContextError> {
        if self.fail_creation {
            return Err(ContextError::Creation("scripted creation failure".to_string()));
        }

        let (major, minor) = self.api_version;
        let (negotiation, visual_id) = if major == 1 && minor < 3 {
            // Legacy single-visual path: no enumeration at all.
            (
                Negotiation {
                    enumerated: false,
                    chosen_index: 0,
                    degraded: false,
                },
                self.candidate_visuals.first().copied(),
            )
        } else {
            match select_config_index(window.visual_id, &self.candidate_visuals) {
                Some((index, exact)) => (
                    Negotiation {
                        enumerated: true,
                        chosen_index: index,
                        degraded: !exact,
                    },
                    Some(self.candidate_visuals[index]),
                ),
                None => {
                    return Err(ContextError::Negotiation(
                        "scripted enumeration returned zero configurations".to_string(),
                    ))
                }
            }
        };

        self.generation += 1;
        self.live_generation = Some(self.generation);
        self.last_negotiation = Some(negotiation);
        let format = PixelFormat {
            color_bits: 24,
            depth_bits: 16,
            double_buffer: self.double_buffer,
            visual_id,
        };
        self.pixel_format = Some(format);
        self.log.push(TraceEvent::CreateContext {
            generation: self.generation,
        });
        Ok(format)
    }

    fn make_current(&mut self, _window: &WindowBinding) {
        if self.live_generation.is_some() {
            self.log.push(TraceEvent::MakeCurrent);
        }
    }

    fn swap_buffers(&mut self, _window: &WindowBinding) {
        if self.live_generation.is_none() {
            return;
        }
        if !self.double_buffer {
            return;
        }
        self.log.push(TraceEvent::SwapBuffers);
    }

    fn resize_viewport(&mut self, width: u16, height: u16) {
        if self.live_generation.is_some() {
            self.log.push(TraceEvent::Viewport { width, height });
        }
    }

    fn destroy_context(&mut self) {
        if self.live_generation.take().is_some() {
            self.log.push(TraceEvent::DestroyContext);
        }
        self.pixel_format = None;
    }

    fn has_context(&self) -> bool {
        self.live_generation.is_some()
    }

    fn pixel_format(&self) -> Option<&PixelFormat> {
        self.pixel_format.as_ref()
    }

    fn context_info(&self) -> Option<ContextInfo> {
        self.live_generation?;
        Some(ContextInfo {
            vendor: "Mock Vendor".to_string(),
            renderer: "Mock Renderer".to_string(),
            version: "2.1 Mock".to_string(),
            extensions: vec![
                "MOCK_swap_control".to_string(),
                "MOCK_framebuffer_object".to_string(),
            ],
        })
    }
}
