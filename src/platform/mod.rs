// src/platform/mod.rs

//! Native windowing layer.
//!
//! The window lives on the pump thread. It produces [`WindowEvent`]s, owns
//! the close-requested flag, and presents frames handed over by the gfx
//! service (it is a [`Canvas`]). The render worker only ever sees a copy of
//! its [`SurfaceHandle`].

pub mod headless;
#[cfg(feature = "x11")]
pub mod x11;

pub use headless::{HeadlessWindow, Journal, JournalEntry};

use crate::gfx::{Canvas, SurfaceHandle};
use crate::keys::KeySymbol;
use anyhow::Result;

/// Events reported by a native window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// A keyboard key was pressed or released.
    Key { symbol: KeySymbol, pressed: bool },
    /// The client area changed size, in pixels.
    Resized { width: u32, height: u32 },
    /// The user asked to close the window.
    CloseRequested,
    FocusGained,
    FocusLost,
    /// Part of the window needs repainting.
    Exposed,
}

/// A window owned by the pump thread.
pub trait NativeWindow: Canvas {
    /// Returns every event queued since the last call, without blocking.
    fn poll_events(&mut self) -> Result<Vec<WindowEvent>>;

    /// True once a close was requested, by the user or by `request_close`.
    fn close_requested(&self) -> bool;

    fn request_close(&mut self);

    /// Opaque identity of the drawable surface, handed to the renderer.
    fn surface_handle(&self) -> SurfaceHandle;

    /// Current client area size in pixels.
    fn inner_size(&self) -> (u32, u32);

    /// Releases the native window. Calling it again does nothing.
    fn destroy(&mut self) -> Result<()>;
}
