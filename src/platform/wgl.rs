// src/platform/wgl.rs
#![allow(non_snake_case)] // Allow non-snake case for Win32 types

//! WGL context provider for Win32 hosts.
//!
//! WGL has no runtime API-version query comparable to `glXQueryVersion`;
//! the discriminator between the two negotiation paths is whether the device
//! context can enumerate pixel formats at all. When `DescribePixelFormat`
//! reports an enumerable set, the provider walks it and prefers the format
//! identifier the host already assigned to the window (`GetPixelFormat`),
//! falling back to the first acceptable entry with a warning. When the set is
//! empty the legacy `ChoosePixelFormat` path picks one format against the
//! minimal descriptor, mirroring the single-visual path on GLX.

use crate::error::ContextError;
use crate::platform::{
    select_config_index, ContextInfo, ContextProvider, FormatFlags, FormatRequest, PixelFormat,
    VisualId, WindowBinding,
};
use log::{debug, info, trace, warn};
use std::ffi::CStr;
use std::mem;
use std::os::raw::{c_int, c_uchar, c_uint};
use std::ptr;

use winapi::shared::windef::{HDC, HGLRC, HWND};
use winapi::um::wingdi::{
    ChoosePixelFormat, DescribePixelFormat, GetPixelFormat, SetPixelFormat, SwapBuffers,
    wglCreateContext, wglDeleteContext, wglMakeCurrent, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW,
    PFD_MAIN_PLANE, PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
};
use winapi::um::winuser::{GetDC, ReleaseDC};

const GL_VENDOR: c_uint = 0x1F00;
const GL_RENDERER: c_uint = 0x1F01;
const GL_VERSION: c_uint = 0x1F02;
const GL_EXTENSIONS: c_uint = 0x1F03;

#[link(name = "opengl32")]
extern "system" {
    fn glGetString(name: c_uint) -> *const c_uchar;
    fn glViewport(x: c_int, y: c_int, width: c_int, height: c_int);
}

/// Builds the descriptor used both for legacy choosing and as the template
/// checked against enumerated formats.
fn descriptor_for(request: &FormatRequest) -> PIXELFORMATDESCRIPTOR {
    // SAFETY: PIXELFORMATDESCRIPTOR is a plain C struct; zeroed is valid.
    let mut pfd: PIXELFORMATDESCRIPTOR = unsafe { mem::zeroed() };
    pfd.nSize = mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;
    pfd.nVersion = 1;
    pfd.dwFlags = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL;
    if request.flags.contains(FormatFlags::DOUBLE_BUFFER) {
        pfd.dwFlags |= PFD_DOUBLEBUFFER;
    }
    pfd.iPixelType = PFD_TYPE_RGBA;
    pfd.cColorBits = request.min_channel_bits.saturating_mul(3).max(24);
    pfd.cDepthBits = request.min_depth_bits.max(16);
    pfd.iLayerType = PFD_MAIN_PLANE;
    pfd
}

/// The WGL implementation of [`ContextProvider`].
#[derive(Debug)]
pub struct WglContextProvider {
    /// The window and device context the live rendering context is bound to.
    device: Option<(HWND, HDC)>,
    context: Option<HGLRC>,
    pixel_format: Option<PixelFormat>,
}

impl WglContextProvider {
    pub fn new() -> Self {
        WglContextProvider {
            device: None,
            context: None,
            pixel_format: None,
        }
    }

    /// Enumerates the device's pixel formats and returns the identifiers of
    /// those satisfying `request`, in enumeration order.
    fn enumerate_formats(&self, hdc: HDC, request: &FormatRequest) -> Vec<VisualId> {
        let size = mem::size_of::<PIXELFORMATDESCRIPTOR>() as c_uint;
        // SAFETY: a null descriptor pointer asks for the format count only.
        let count = unsafe { DescribePixelFormat(hdc, 1, size, ptr::null_mut()) };
        if count <= 0 {
            return Vec::new();
        }
        debug!("device context enumerates {} pixel formats", count);

        let mut required = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL;
        if request.flags.contains(FormatFlags::DOUBLE_BUFFER) {
            required |= PFD_DOUBLEBUFFER;
        }

        let mut candidates = Vec::new();
        for index in 1..=count {
            // SAFETY: descriptor is a valid out parameter for the query.
            let mut pfd: PIXELFORMATDESCRIPTOR = unsafe { mem::zeroed() };
            let ok = unsafe { DescribePixelFormat(hdc, index, size, &mut pfd) };
            if ok == 0 {
                continue;
            }
            if pfd.dwFlags & required != required {
                continue;
            }
            if pfd.iPixelType != PFD_TYPE_RGBA {
                continue;
            }
            if pfd.cColorBits < request.min_channel_bits.saturating_mul(3) {
                continue;
            }
            candidates.push(VisualId(index as u64));
        }
        candidates
    }

    /// Legacy path: let GDI choose one format against the minimal descriptor.
    fn choose_legacy(&self, hdc: HDC) -> Result<c_int, ContextError> {
        let pfd = descriptor_for(&FormatRequest::LEGACY);
        // SAFETY: hdc and descriptor are valid.
        let index = unsafe { ChoosePixelFormat(hdc, &pfd) };
        if index == 0 {
            return Err(ContextError::Negotiation(
                "ChoosePixelFormat found no matching pixel format".to_string(),
            ));
        }
        Ok(index)
    }
}

impl Default for WglContextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for WglContextProvider {
    fn create_context(&mut self, window: &WindowBinding) -> Result<PixelFormat, ContextError> {
        if self.context.is_some() {
            warn!("creating a context while one exists; destroying the old one first");
            self.destroy_context();
        }

        let hwnd = window.handle.0 as HWND;
        // SAFETY: the host guarantees the handle names a live window.
        let hdc = unsafe { GetDC(hwnd) };
        if hdc.is_null() {
            return Err(ContextError::Creation(
                "GetDC returned a null device context".to_string(),
            ));
        }

        let candidates = self.enumerate_formats(hdc, &FormatRequest::ENUMERATION);
        let index = if candidates.is_empty() {
            // No enumerable formats; legacy single-format path.
            match self.choose_legacy(hdc) {
                Ok(index) => index,
                Err(e) => {
                    unsafe { ReleaseDC(hwnd, hdc) };
                    return Err(e);
                }
            }
        } else {
            // SAFETY: hdc is valid; a zero return means no format assigned.
            let assigned = unsafe { GetPixelFormat(hdc) };
            let ideal = window.visual_id.or(if assigned > 0 {
                Some(VisualId(assigned as u64))
            } else {
                None
            });
            // The candidate list is non-empty here, so a choice exists.
            let (position, exact) =
                select_config_index(ideal, &candidates).unwrap_or((0, false));
            if !exact {
                warn!(
                    "no pixel format matches the host-assigned identifier {:?}; \
                     falling back to the first enumerated format",
                    ideal
                );
            }
            candidates[position].0 as c_int
        };

        let size = mem::size_of::<PIXELFORMATDESCRIPTOR>() as c_uint;
        let mut pfd: PIXELFORMATDESCRIPTOR = unsafe { mem::zeroed() };
        // SAFETY: index came from enumeration or ChoosePixelFormat.
        unsafe { DescribePixelFormat(hdc, index, size, &mut pfd) };
        // SAFETY: hdc, index, and descriptor are valid. SetPixelFormat may
        // only succeed once per window; the host assigning one earlier is
        // the exact-match case above.
        let set = unsafe { SetPixelFormat(hdc, index, &pfd) };
        if set == 0 {
            warn!("SetPixelFormat failed for format {}; continuing", index);
        }

        // SAFETY: hdc carries a pixel format now.
        let context = unsafe { wglCreateContext(hdc) };
        if context.is_null() {
            unsafe { ReleaseDC(hwnd, hdc) };
            return Err(ContextError::Creation(
                "wglCreateContext returned a null context".to_string(),
            ));
        }
        // SAFETY: binds the fresh context on this thread.
        let bound = unsafe { wglMakeCurrent(hdc, context) };
        if bound == 0 {
            warn!("wglMakeCurrent failed for freshly created context");
        }

        let format = PixelFormat {
            color_bits: pfd.cColorBits,
            depth_bits: pfd.cDepthBits,
            double_buffer: pfd.dwFlags & PFD_DOUBLEBUFFER != 0,
            visual_id: Some(VisualId(index as u64)),
        };
        info!("created WGL context with pixel format {}", index);

        self.device = Some((hwnd, hdc));
        self.context = Some(context);
        self.pixel_format = Some(format);
        Ok(format)
    }

    fn make_current(&mut self, _window: &WindowBinding) {
        let (context, hdc) = match (self.context, self.device) {
            (Some(context), Some((_, hdc))) => (context, hdc),
            _ => {
                trace!("make_current without a context; ignoring");
                return;
            }
        };
        // SAFETY: hdc and context are the pair created together.
        let bound = unsafe { wglMakeCurrent(hdc, context) };
        if bound == 0 {
            warn!("wglMakeCurrent failed");
        }
    }

    fn swap_buffers(&mut self, _window: &WindowBinding) {
        let hdc = match self.device {
            Some((_, hdc)) if self.context.is_some() => hdc,
            _ => {
                trace!("swap_buffers without a context; ignoring");
                return;
            }
        };
        if let Some(format) = &self.pixel_format {
            if !format.double_buffer {
                trace!("single-buffered format; swap_buffers is a no-op");
                return;
            }
        }
        // SAFETY: hdc is valid while the device pair is held.
        unsafe { SwapBuffers(hdc) };
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
            // SAFETY: unbind before deletion; the context was created here.
            unsafe {
                wglMakeCurrent(ptr::null_mut(), ptr::null_mut());
                wglDeleteContext(context);
            }
            info!("destroyed WGL context");
        }
        if let Some((hwnd, hdc)) = self.device.take() {
            // SAFETY: releasing the DC obtained at creation time.
            unsafe { ReleaseDC(hwnd, hdc) };
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

impl Drop for WglContextProvider {
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
