// src/platform/x11/connection.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::ptr;

use libc::c_int;
use x11::xlib;

/// Owns an Xlib `Display` pointer and closes it on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    /// Opens the display named by `DISPLAY`.
    fn open() -> Result<Self> {
        // SAFETY: passing NULL makes Xlib read the DISPLAY environment variable.
        let display_ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display_ptr.is_null() {
            Err(anyhow!(
                "Failed to open X display. Check DISPLAY environment variable or X server status."
            ))
        } else {
            debug!("X display opened: {:p}", display_ptr);
            Ok(Self { ptr: display_ptr })
        }
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        info!("Closing X11 display connection: {:p}", self.ptr);
        // SAFETY: `ptr` came from a successful XOpenDisplay and is closed once.
        let status = unsafe { xlib::XCloseDisplay(self.ptr) };
        if status != 0 {
            warn!(
                "XCloseDisplay returned non-zero status: {}. Display may not have closed cleanly.",
                status
            );
        }
    }
}

/// Connection to the X server plus the default screen and its visual.
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: c_int,
    visual: *mut xlib::Visual,
    depth: c_int,
}

impl Connection {
    pub fn open() -> Result<Self> {
        info!("Establishing X11 server connection.");
        let managed_display = ManagedDisplay::open()?;
        let display = managed_display.ptr;

        // SAFETY: `display` is a valid, open display for the calls below.
        let (screen, visual, depth) = unsafe {
            let screen = xlib::XDefaultScreen(display);
            (
                screen,
                xlib::XDefaultVisual(display, screen),
                xlib::XDefaultDepth(display, screen),
            )
        };
        if visual.is_null() {
            // ManagedDisplay's Drop closes the display.
            return Err(anyhow!(
                "Failed to get default visual for screen {}.",
                screen
            ));
        }
        if depth < 24 {
            warn!(
                "Default visual depth is {}; colours assume a 24-bit TrueColor visual.",
                depth
            );
        }
        debug!("Default screen {}, visual {:p}, depth {}", screen, visual, depth);

        Ok(Connection {
            managed_display,
            screen,
            visual,
            depth,
        })
    }

    /// The raw display pointer. Valid for the lifetime of `self`.
    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.ptr
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }

    #[inline]
    pub fn visual(&self) -> *mut xlib::Visual {
        self.visual
    }

    #[inline]
    pub fn depth(&self) -> c_int {
        self.depth
    }

    /// Sends buffered requests to the server.
    pub fn flush(&self) {
        // SAFETY: the display is open while `self` exists.
        unsafe { xlib::XFlush(self.display()) };
    }
}
