// src/platform/glx/connection.rs

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::ptr;

use libc::c_int;
use x11::xlib;

/// An owned X11 display connection for the GLX provider.
///
/// Wraps the raw `*mut xlib::Display` and closes it on drop. The provider
/// holds exactly one of these for its whole lifetime; contexts come and go
/// against the same connection. This replaces the ambient process-global
/// library handle of older designs with an explicitly constructed, owned
/// resource.
#[derive(Debug)]
pub struct GlxDisplay {
    ptr: *mut xlib::Display,
    screen: c_int,
}

impl GlxDisplay {
    /// Opens a connection to the X server named by the `DISPLAY` environment
    /// variable and records its default screen.
    pub fn open() -> Result<Self> {
        // Passing NULL makes Xlib consult DISPLAY.
        let ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if ptr.is_null() {
            return Err(anyhow!(
                "failed to open X display; check the DISPLAY environment variable"
            ));
        }
        let screen = unsafe { xlib::XDefaultScreen(ptr) };
        debug!("opened X display {:p}, default screen {}", ptr, screen);
        Ok(GlxDisplay { ptr, screen })
    }

    /// The raw display pointer for Xlib/GLX calls.
    ///
    /// # Safety
    ///
    /// Valid only while this `GlxDisplay` is alive; callers must not hold the
    /// pointer across its drop.
    #[inline]
    pub fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }
}

impl Drop for GlxDisplay {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            info!("closing X display connection {:p}", self.ptr);
            // SAFETY: the pointer came from XOpenDisplay and is closed once.
            let status = unsafe { xlib::XCloseDisplay(self.ptr) };
            if status != 0 {
                warn!("XCloseDisplay returned non-zero status {}", status);
            }
            self.ptr = ptr::null_mut();
        }
    }
}
