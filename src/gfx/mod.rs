// src/gfx/mod.rs

//! The graphics backend seam.
//!
//! Rendering is split across two threads. The render worker drives a
//! [`RenderBackend`]: it configures the surface and views, fills the debug
//! text, and submits frames. The window thread drives the matching
//! [`BackendService`], whose non-blocking `service_once` hands submitted
//! frames to a [`Canvas`] (the window) for presentation and reports when the
//! worker side has gone away.
//!
//! [`create`] builds the concrete software pair used by the application.

pub mod context;
pub mod text;

pub use context::{create, Context, Service};
pub use text::{DebugText, TextImage};

use crate::color::Rgba;
use anyhow::Result;
use bitflags::bitflags;
use std::time::Duration;

/// Identifies a view (a render target region with its own clear state).
pub type ViewId = u16;

/// The view the application clears and draws its overlay into.
pub const CLEAR_VIEW: ViewId = 0;

bitflags! {
    /// Debug overlays drawn on top of a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DebugFlags: u32 {
        /// The application's debug text grid.
        const TEXT = 1 << 0;
        /// The backend's statistics panel, replacing the text grid.
        const STATS = 1 << 1;
    }
}

bitflags! {
    /// Flags applied when the backbuffer is (re)created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResetFlags: u32 {
        const VSYNC = 1 << 0;
    }
}

/// Opaque native surface identity, copied to the worker at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceHandle {
    /// Native display connection, as an address. Zero when there is none.
    pub display: usize,
    /// Native window id. Zero is never a valid window.
    pub window: u64,
}

impl SurfaceHandle {
    pub fn is_valid(&self) -> bool {
        self.window != 0
    }
}

/// Result of one `service_once` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// The worker side is alive; more frames may follow.
    HasContext,
    /// The worker side shut down or was dropped. Sticky.
    NoContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clear colour and rectangle of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewTarget {
    pub id: ViewId,
    pub clear_color: Rgba,
    pub rect: ViewRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackendStats {
    /// Frames submitted so far.
    pub frames_submitted: u64,
    /// Wall time between the last two submissions.
    pub cpu_frame_time: Duration,
    pub width: u32,
    pub height: u32,
    pub text_cols: u16,
    pub text_rows: u16,
}

impl BackendStats {
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.cpu_frame_time.as_secs_f64();
        if secs > 0.0 {
            1.0 / secs
        } else {
            0.0
        }
    }
}

/// Everything needed to present one submitted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub number: u64,
    pub width: u32,
    pub height: u32,
    pub reset: ResetFlags,
    pub views: Vec<ViewTarget>,
    pub debug: DebugFlags,
    /// The resolved overlay: the statistics panel when `STATS` is set,
    /// otherwise the application's debug text.
    pub text: DebugText,
    pub stats: BackendStats,
}

impl Frame {
    pub fn view(&self, id: ViewId) -> Option<&ViewTarget> {
        self.views.iter().find(|v| v.id == id)
    }
}

/// Worker-side backend interface.
pub trait RenderBackend {
    /// Binds the backend to a native surface. Called once, before anything else.
    fn init(&mut self, surface: SurfaceHandle, width: u32, height: u32, reset: ResetFlags)
        -> Result<()>;

    /// Recreates the backbuffer for a new size.
    fn reconfigure_surface(&mut self, width: u32, height: u32, reset: ResetFlags);

    /// Sets `view` to clear to `clear_color` over the whole backbuffer.
    fn set_output_target(&mut self, view: ViewId, clear_color: Rgba);

    fn set_debug(&mut self, flags: DebugFlags);

    fn debug_text(&mut self) -> &mut DebugText;

    fn stats(&self) -> BackendStats;

    /// Submits the current frame. Returns its frame number.
    fn submit_frame(&mut self) -> Result<u64>;

    /// Tears the backend down. Called after the final submission.
    fn shutdown(&mut self);
}

/// Window-side backend interface.
pub trait BackendService {
    /// Presents at most one pending frame on `canvas` without blocking.
    fn service_once(&mut self, canvas: &mut dyn Canvas) -> ServiceStatus;
}

/// Something a frame can be presented on.
pub trait Canvas {
    fn present(&mut self, frame: &Frame) -> Result<()>;
}
