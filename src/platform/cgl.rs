// src/platform/cgl.rs
#![allow(non_snake_case)] // Allow non-snake case for CGL types

//! CGL context provider for macOS hosts.
//!
//! CGL expresses the legacy-versus-modern split through the pixel-format
//! profile attribute instead of a runtime version query; this provider always
//! requests the legacy profile, which is the behavior the rest of the crate
//! specifies (the first successfully negotiated context is final). The
//! negotiated format is single-buffered, so swap-buffers is a documented
//! no-op on this platform.

use crate::error::ContextError;
use crate::platform::{
    ContextInfo, ContextProvider, FormatRequest, PixelFormat, WindowBinding,
};
use log::{debug, info, trace, warn};
use std::ffi::CStr;
use std::os::raw::{c_int, c_uchar, c_uint};
use std::ptr;

use ::cgl::{
    kCGLPFAColorSize, kCGLPFADepthSize, kCGLPFAOpenGLProfile, CGLChoosePixelFormat,
    CGLContextObj, CGLCreateContext, CGLDestroyContext, CGLDestroyPixelFormat,
    CGLPixelFormatAttribute, CGLPixelFormatObj, CGLSetCurrentContext,
};

/// Profile value selecting a renderer compatible with the legacy GL pipeline.
const KCGL_OGLP_VERSION_LEGACY: CGLPixelFormatAttribute = 0x1000;
/// Deprecated but still honored attribute restricting formats to
/// window-capable renderers; kept for parity with the other platforms'
/// window-drawable requirement.
const KCGL_PFA_WINDOW: CGLPixelFormatAttribute = 80;

const GL_VENDOR: c_uint = 0x1F00;
const GL_RENDERER: c_uint = 0x1F01;
const GL_VERSION: c_uint = 0x1F02;
const GL_EXTENSIONS: c_uint = 0x1F03;

#[link(name = "OpenGL", kind = "framework")]
extern "C" {
    fn glGetString(name: c_uint) -> *const c_uchar;
    fn glViewport(x: c_int, y: c_int, width: c_int, height: c_int);
}

/// Attribute list for `CGLChoosePixelFormat`, zero-terminated.
fn pixel_format_attribs(request: &FormatRequest) -> [CGLPixelFormatAttribute; 9] {
    [
        kCGLPFAOpenGLProfile,
        KCGL_OGLP_VERSION_LEGACY,
        KCGL_PFA_WINDOW,
        1,
        kCGLPFAColorSize,
        (request.min_channel_bits as CGLPixelFormatAttribute).saturating_mul(3).max(24),
        kCGLPFADepthSize,
        request.min_depth_bits.max(16) as CGLPixelFormatAttribute,
        0,
    ]
}

/// The CGL implementation of [`ContextProvider`].
#[derive(Debug)]
pub struct CglContextProvider {
    context: Option<CGLContextObj>,
    pixel_format: Option<PixelFormat>,
}

impl CglContextProvider {
    pub fn new() -> Self {
        CglContextProvider {
            context: None,
            pixel_format: None,
        }
    }
}

impl Default for CglContextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for CglContextProvider {
    fn create_context(&mut self, _window: &WindowBinding) -> Result<PixelFormat, ContextError> {
        if self.context.is_some() {
            warn!("creating a context while one exists; destroying the old one first");
            self.destroy_context();
        }

        let attribs = pixel_format_attribs(&FormatRequest::LEGACY);
        let mut format_obj: CGLPixelFormatObj = ptr::null_mut();
        let mut count: c_int = 0;
        // SAFETY: attribs is zero-terminated; out parameters receive the
        // chosen format object and the candidate count.
        let err = unsafe { CGLChoosePixelFormat(attribs.as_ptr(), &mut format_obj, &mut count) };
        if err != 0 || count == 0 || format_obj.is_null() {
            return Err(ContextError::Negotiation(format!(
                "CGLChoosePixelFormat found no pixel formats (status {}, candidates {})",
                err, count
            )));
        }
        debug!("CGLChoosePixelFormat returned {} candidates", count);

        let mut context: CGLContextObj = ptr::null_mut();
        // SAFETY: format_obj is valid; no share context.
        let err = unsafe { CGLCreateContext(format_obj, ptr::null_mut(), &mut context) };
        // SAFETY: the format object is no longer needed once the context
        // exists (or creation failed).
        unsafe { CGLDestroyPixelFormat(format_obj) };
        if err != 0 || context.is_null() {
            return Err(ContextError::Creation(format!(
                "CGLCreateContext failed with status {}",
                err
            )));
        }

        // SAFETY: binds the fresh context on this thread.
        let err = unsafe { CGLSetCurrentContext(context) };
        if err != 0 {
            warn!("CGLSetCurrentContext failed with status {}", err);
        }

        // The requested format is single-buffered; swap stays a no-op.
        let format = PixelFormat {
            color_bits: 24,
            depth_bits: 16,
            double_buffer: false,
            visual_id: None,
        };
        info!("created CGL context (legacy profile)");

        self.context = Some(context);
        self.pixel_format = Some(format);
        Ok(format)
    }

    fn make_current(&mut self, _window: &WindowBinding) {
        let context = match self.context {
            Some(context) => context,
            None => {
                trace!("make_current without a context; ignoring");
                return;
            }
        };
        // SAFETY: context is valid while held.
        let err = unsafe { CGLSetCurrentContext(context) };
        if err != 0 {
            warn!("CGLSetCurrentContext failed with status {}", err);
        }
    }

    fn swap_buffers(&mut self, _window: &WindowBinding) {
        // The negotiated format is single-buffered; presenting is implicit.
        trace!("single-buffered CGL format; swap_buffers is a no-op");
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
            // SAFETY: unbind before destruction; the context was created here.
            unsafe {
                CGLSetCurrentContext(ptr::null_mut());
                CGLDestroyContext(context);
            }
            info!("destroyed CGL context");
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

impl Drop for CglContextProvider {
    fn drop(&mut self) {
        self.destroy_context();
    }
}

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
