// src/platform/glx/mod.rs
#![allow(non_snake_case)] // Allow non-snake case for X11/GLX types

//! GLX context provider for X11 hosts.
//!
//! Negotiation follows the GLX version reported by the server: below 1.3 the
//! legacy `glXChooseVisual` path picks a single visual and creates a context
//! directly against it; 1.3 and later enumerates framebuffer configurations
//! with `glXChooseFBConfig` and prefers the one whose visual id matches the
//! visual the host toolkit assigned to the window, falling back to the first
//! enumerated configuration with a warning when none matches.
//!
//! The extension-queried `GLX_ARB_create_context` profile-upgrade path is
//! intentionally absent: the first successfully negotiated context is final.

pub mod connection;

use crate::error::ContextError;
use crate::platform::{
    select_config_index, ContextInfo, ContextProvider, FormatRequest, PixelFormat, VisualId,
    WindowBinding,
};
use connection::GlxDisplay;
use log::{debug, info, trace, warn};
use std::ffi::CStr;
use std::os::raw::{c_int, c_uchar, c_uint, c_void};
use std::ptr;

use x11::glx;
use x11::xlib;

// glGetString/glViewport names from libGL; the build script links GL.
const GL_VENDOR: c_uint = 0x1F00;
const GL_RENDERER: c_uint = 0x1F01;
const GL_VERSION: c_uint = 0x1F02;
const GL_EXTENSIONS: c_uint = 0x1F03;

extern "C" {
    fn glGetString(name: c_uint) -> *const c_uchar;
    fn glViewport(x: c_int, y: c_int, width: c_int, height: c_int);
}

/// Attribute list for the legacy `glXChooseVisual` path.
fn visual_attribs(request: &FormatRequest) -> Vec<c_int> {
    let bits = request.min_channel_bits as c_int;
    let mut attribs = vec![glx::GLX_RGBA, glx::GLX_DOUBLEBUFFER];
    attribs.extend_from_slice(&[
        glx::GLX_RED_SIZE,
        bits,
        glx::GLX_GREEN_SIZE,
        bits,
        glx::GLX_BLUE_SIZE,
        bits,
        glx::GLX_DEPTH_SIZE,
        request.min_depth_bits as c_int,
        0,
    ]);
    attribs
}

/// Attribute list for the `glXChooseFBConfig` enumeration path.
fn fbconfig_attribs(request: &FormatRequest) -> Vec<c_int> {
    let bits = request.min_channel_bits as c_int;
    vec![
        glx::GLX_X_RENDERABLE,
        1,
        glx::GLX_DRAWABLE_TYPE,
        glx::GLX_WINDOW_BIT,
        glx::GLX_RENDER_TYPE,
        glx::GLX_RGBA_BIT,
        glx::GLX_RED_SIZE,
        bits,
        glx::GLX_GREEN_SIZE,
        bits,
        glx::GLX_BLUE_SIZE,
        bits,
        glx::GLX_DOUBLEBUFFER,
        1,
        0,
    ]
}

/// The GLX implementation of [`ContextProvider`].
///
/// Owns the X display connection for its whole lifetime and at most one GLX
/// context within it.
#[derive(Debug)]
pub struct GlxContextProvider {
    display: GlxDisplay,
    context: Option<glx::GLXContext>,
    pixel_format: Option<PixelFormat>,
}

impl GlxContextProvider {
    /// Opens the X display connection the provider will create contexts on.
    pub fn new() -> Result<Self, ContextError> {
        let display = GlxDisplay::open().map_err(|e| ContextError::Creation(e.to_string()))?;
        Ok(GlxContextProvider {
            display,
            context: None,
            pixel_format: None,
        })
    }

    /// Reads the negotiated attributes of a chosen visual.
    fn describe_visual(&self, visual: *mut xlib::XVisualInfo) -> PixelFormat {
        let dpy = self.display.raw();
        let mut red = 0;
        let mut green = 0;
        let mut blue = 0;
        let mut depth = 0;
        let mut double_buffer = 0;
        // SAFETY: display and visual are valid; glXGetConfig only writes the
        // out parameter.
        unsafe {
            glx::glXGetConfig(dpy, visual, glx::GLX_RED_SIZE, &mut red);
            glx::glXGetConfig(dpy, visual, glx::GLX_GREEN_SIZE, &mut green);
            glx::glXGetConfig(dpy, visual, glx::GLX_BLUE_SIZE, &mut blue);
            glx::glXGetConfig(dpy, visual, glx::GLX_DEPTH_SIZE, &mut depth);
            glx::glXGetConfig(dpy, visual, glx::GLX_DOUBLEBUFFER, &mut double_buffer);
        }
        let visual_id = unsafe { (*visual).visualid } as u64;
        PixelFormat {
            color_bits: (red + green + blue) as u8,
            depth_bits: depth as u8,
            double_buffer: double_buffer != 0,
            visual_id: Some(VisualId(visual_id)),
        }
    }

    /// Reads the negotiated attributes of a chosen framebuffer configuration.
    fn describe_fbconfig(&self, config: glx::GLXFBConfig) -> PixelFormat {
        let dpy = self.display.raw();
        let mut red = 0;
        let mut green = 0;
        let mut blue = 0;
        let mut depth = 0;
        let mut double_buffer = 0;
        let mut visual_id = 0;
        // SAFETY: display and config are valid; glXGetFBConfigAttrib only
        // writes the out parameter.
        unsafe {
            glx::glXGetFBConfigAttrib(dpy, config, glx::GLX_RED_SIZE, &mut red);
            glx::glXGetFBConfigAttrib(dpy, config, glx::GLX_GREEN_SIZE, &mut green);
            glx::glXGetFBConfigAttrib(dpy, config, glx::GLX_BLUE_SIZE, &mut blue);
            glx::glXGetFBConfigAttrib(dpy, config, glx::GLX_DEPTH_SIZE, &mut depth);
            glx::glXGetFBConfigAttrib(dpy, config, glx::GLX_DOUBLEBUFFER, &mut double_buffer);
            glx::glXGetFBConfigAttrib(dpy, config, glx::GLX_VISUAL_ID, &mut visual_id);
        }
        PixelFormat {
            color_bits: (red + green + blue) as u8,
            depth_bits: depth as u8,
            double_buffer: double_buffer != 0,
            visual_id: Some(VisualId(visual_id as u64)),
        }
    }

    /// Legacy GLX (< 1.3): one visual, one direct context, no enumeration.
    fn create_legacy(&mut self, window: &WindowBinding) -> Result<PixelFormat, ContextError> {
        let dpy = self.display.raw();
        let screen = self.display.screen();
        let mut attribs = visual_attribs(&FormatRequest::LEGACY);

        // SAFETY: attribs is a zero-terminated list; the display is valid.
        let visual = unsafe { glx::glXChooseVisual(dpy, screen, attribs.as_mut_ptr()) };
        if visual.is_null() {
            return Err(ContextError::Negotiation(
                "glXChooseVisual found no matching visual".to_string(),
            ));
        }

        // SAFETY: visual is non-null; a null share list and direct rendering
        // mirror the single-context-per-surface model.
        let context = unsafe { glx::glXCreateContext(dpy, visual, ptr::null_mut(), 1) };
        if context.is_null() {
            unsafe { xlib::XFree(visual as *mut c_void) };
            return Err(ContextError::Creation(
                "glXCreateContext returned a null context".to_string(),
            ));
        }

        let format = self.describe_visual(visual);
        // SAFETY: the visual info came from glXChooseVisual.
        unsafe { xlib::XFree(visual as *mut c_void) };

        // SAFETY: window handle and context are valid; binds on this thread.
        let drawable = window.handle.0 as glx::GLXDrawable;
        let bound = unsafe { glx::glXMakeCurrent(dpy, drawable, context) };
        if bound == 0 {
            warn!("glXMakeCurrent failed for freshly created legacy context");
        }

        self.context = Some(context);
        Ok(format)
    }

    /// GLX 1.3+: enumerate framebuffer configurations and match the visual
    /// the host toolkit assigned to the window.
    fn create_from_fbconfig(&mut self, window: &WindowBinding) -> Result<PixelFormat, ContextError> {
        let dpy = self.display.raw();
        let screen = self.display.screen();
        let attribs = fbconfig_attribs(&FormatRequest::ENUMERATION);

        let mut count: c_int = 0;
        // SAFETY: attribs is zero-terminated; count receives the number of
        // configurations in the returned array.
        let configs = unsafe { glx::glXChooseFBConfig(dpy, screen, attribs.as_ptr(), &mut count) };
        if configs.is_null() || count <= 0 {
            if !configs.is_null() {
                unsafe { xlib::XFree(configs as *mut c_void) };
            }
            return Err(ContextError::Negotiation(
                "glXChooseFBConfig found no framebuffer configurations".to_string(),
            ));
        }
        debug!("glXChooseFBConfig returned {} configurations", count);

        let mut candidates = Vec::with_capacity(count as usize);
        for i in 0..count as isize {
            // SAFETY: i is within the array returned by glXChooseFBConfig.
            let config = unsafe { *configs.offset(i) };
            let visual = unsafe { glx::glXGetVisualFromFBConfig(dpy, config) };
            if visual.is_null() {
                // Configurations without an associated visual cannot drive a
                // window drawable; keep indices aligned with a sentinel.
                candidates.push(VisualId(0));
                continue;
            }
            let id = unsafe { (*visual).visualid } as u64;
            unsafe { xlib::XFree(visual as *mut c_void) };
            candidates.push(VisualId(id));
        }

        let (index, exact) = match select_config_index(window.visual_id, &candidates) {
            Some(choice) => choice,
            None => {
                unsafe { xlib::XFree(configs as *mut c_void) };
                return Err(ContextError::Negotiation(
                    "framebuffer configuration list was empty".to_string(),
                ));
            }
        };
        if !exact {
            warn!(
                "no framebuffer configuration matches host visual {:?}; \
                 falling back to the first enumerated configuration",
                window.visual_id
            );
        }

        // SAFETY: index is within the enumerated array.
        let chosen = unsafe { *configs.offset(index as isize) };
        let format = self.describe_fbconfig(chosen);

        // SAFETY: chosen is valid; RGBA render type, no share list, direct.
        let context = unsafe {
            glx::glXCreateNewContext(dpy, chosen, glx::GLX_RGBA_TYPE, ptr::null_mut(), 1)
        };
        unsafe { xlib::XFree(configs as *mut c_void) };
        if context.is_null() {
            return Err(ContextError::Creation(
                "glXCreateNewContext returned a null context".to_string(),
            ));
        }

        // SAFETY: handle and context are valid; binds on this thread.
        let drawable = window.handle.0 as glx::GLXDrawable;
        let bound = unsafe { glx::glXMakeContextCurrent(dpy, drawable, drawable, context) };
        if bound == 0 {
            warn!("glXMakeContextCurrent failed for freshly created context");
        }

        // SAFETY: context is current on this thread.
        let direct = unsafe { glx::glXIsDirect(dpy, context) } != 0;
        info!("created GLX context (direct rendering: {})", direct);

        self.context = Some(context);
        Ok(format)
    }
}

impl ContextProvider for GlxContextProvider {
    fn create_context(&mut self, window: &WindowBinding) -> Result<PixelFormat, ContextError> {
        if self.context.is_some() {
            warn!("creating a context while one exists; destroying the old one first");
            self.destroy_context();
        }

        let dpy = self.display.raw();
        let mut major: c_int = 0;
        let mut minor: c_int = 0;
        // SAFETY: display is valid; out parameters receive the version.
        let ok = unsafe { glx::glXQueryVersion(dpy, &mut major, &mut minor) };
        if ok == 0 {
            return Err(ContextError::Creation(
                "glXQueryVersion failed; server does not speak GLX".to_string(),
            ));
        }
        info!("GLX version {}.{}", major, minor);

        let format = if major == 1 && minor < 3 {
            self.create_legacy(window)?
        } else {
            self.create_from_fbconfig(window)?
        };
        debug!("negotiated pixel format: {:?}", format);
        self.pixel_format = Some(format);
        Ok(format)
    }

    fn make_current(&mut self, window: &WindowBinding) {
        let context = match self.context {
            Some(context) => context,
            None => {
                trace!("make_current without a context; ignoring");
                return;
            }
        };
        // SAFETY: display, window handle, and context are valid.
        let drawable = window.handle.0 as glx::GLXDrawable;
        let bound = unsafe { glx::glXMakeCurrent(self.display.raw(), drawable, context) };
        if bound == 0 {
            warn!("glXMakeCurrent failed for window {:?}", window.handle);
        }
    }

    fn swap_buffers(&mut self, window: &WindowBinding) {
        if self.context.is_none() {
            trace!("swap_buffers without a context; ignoring");
            return;
        }
        if let Some(format) = &self.pixel_format {
            if !format.double_buffer {
                trace!("single-buffered format; swap_buffers is a no-op");
                return;
            }
        }
        // SAFETY: display and window handle are valid.
        let drawable = window.handle.0 as glx::GLXDrawable;
        unsafe { glx::glXSwapBuffers(self.display.raw(), drawable) };
    }

    fn resize_viewport(&mut self, width: u16, height: u16) {
        if self.context.is_none() {
            trace!("resize_viewport without a context; ignoring");
            return;
        }
        // SAFETY: a context is current on this thread.
        unsafe { glViewport(0, 0, width as c_int, height as c_int) };
    }

    fn destroy_context(&mut self) {
        if let Some(context) = self.context.take() {
            let dpy = self.display.raw();
            // SAFETY: unbind before destruction so the context is not current
            // anywhere when it dies.
            unsafe {
                glx::glXMakeCurrent(dpy, 0, ptr::null_mut());
                glx::glXDestroyContext(dpy, context);
            }
            info!("destroyed GLX context");
        }
        self.pixel_format = None;
    }

    fn has_context(&self) -> bool {
        self.context.is_some()
    }

    fn pixel_format(&self) -> Option<&PixelFormat> {
        self.pixel_format.as_ref()
    }

    fn context_info(&self) -> Option<ContextInfo> {
        if self.context.is_none() {
            return None;
        }
        Some(ContextInfo {
            vendor: gl_string(GL_VENDOR),
            renderer: gl_string(GL_RENDERER),
            version: gl_string(GL_VERSION),
            extensions: gl_string(GL_EXTENSIONS)
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        })
    }
}

impl Drop for GlxContextProvider {
    fn drop(&mut self) {
        // The display connection closes after the context it hosts.
        self.destroy_context();
    }
}

/// Reads a GL string from the current context; empty when unavailable.
fn gl_string(name: c_uint) -> String {
    // SAFETY: requires a current context, which the caller guarantees; a
    // null return is handled.
    let ptr = unsafe { glGetString(name) };
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr as *const _) }
        .to_string_lossy()
        .into_owned()
}
