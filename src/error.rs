// src/error.rs

//! Error taxonomy for the context lifecycle.
//!
//! Only genuinely fatal conditions appear here. Make-current or swap against
//! an unmapped window is an expected race during teardown and is handled as a
//! silent no-op by [`crate::surface::Surface`], never as an error. A
//! negotiation that cannot match the host-assigned visual exactly degrades to
//! the first enumerated configuration with a `warn!` diagnostic and likewise
//! never reaches this type.

use thiserror::Error;

/// A fatal failure while negotiating a pixel format or creating a native
/// rendering context.
///
/// Either variant moves the owning surface into its terminal `Failed` state;
/// no retry is attempted and no further context operations are issued.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Pixel-format/visual negotiation yielded zero candidate configurations.
    #[error("pixel format negotiation failed: {0}")]
    Negotiation(String),

    /// The underlying native creation call reported a non-success status.
    /// The message carries the platform diagnostic string.
    #[error("context creation failed: {0}")]
    Creation(String),
}
