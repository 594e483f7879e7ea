// src/platform/x11/mod.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

//! Native X11 window (Xlib).
//!
//! Presentation is deliberately simple: the clear view's rectangle is filled
//! with its clear colour and the debug text is drawn run by run with the core
//! `fixed` font, each run placed on the 8x16 debug text grid.

pub mod connection;
pub mod event;

use self::connection::Connection;
use self::event::{process_pending_events, WindowGeometry, WmAtoms};
use crate::color::{Rgba, TextAttr};
use crate::config::WindowConfig;
use crate::gfx::text::{CELL_HEIGHT, CELL_WIDTH};
use crate::gfx::{Canvas, Frame, SurfaceHandle, CLEAR_VIEW};
use crate::platform::{NativeWindow, WindowEvent};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, trace, warn};
use std::ffi::CString;
use std::mem;
use std::ptr;

use libc::{c_char, c_int, c_uint};
use x11::xlib;

const FONT_NAME: &[u8] = b"fixed\0";

pub struct X11Window {
    /// `None` once the window was destroyed.
    connection: Option<Connection>,
    id: xlib::Window,
    gc: xlib::GC,
    font: *mut xlib::XFontStruct,
    atoms: WmAtoms,
    geometry: WindowGeometry,
    close_requested: bool,
}

impl X11Window {
    pub fn new(config: &WindowConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            bail!(
                "cannot create a {}x{} window",
                config.width,
                config.height
            );
        }
        let connection = Connection::open().context("Failed to connect to the X server")?;
        let display = connection.display();
        let screen = connection.screen();
        info!(
            "Creating X11 window '{}': {}x{}px",
            config.title, config.width, config.height
        );

        // SAFETY: `display` is open; the attributes struct is fully initialised
        // by `mem::zeroed` plus the fields named in the value mask.
        let id = unsafe {
            let root_window = xlib::XRootWindow(display, screen);
            let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
            attributes.background_pixel = xlib::XBlackPixel(display, screen);
            attributes.event_mask = xlib::ExposureMask
                | xlib::KeyPressMask
                | xlib::KeyReleaseMask
                | xlib::StructureNotifyMask
                | xlib::FocusChangeMask;
            xlib::XCreateWindow(
                display,
                root_window,
                0,
                0,
                config.width as c_uint,
                config.height as c_uint,
                0,
                connection.depth(),
                xlib::InputOutput as c_uint,
                connection.visual(),
                xlib::CWBackPixel | xlib::CWEventMask,
                &mut attributes,
            )
        };
        if id == 0 {
            return Err(anyhow!("XCreateWindow failed"));
        }

        // SAFETY: `display` and `id` are valid for all calls below.
        let atoms = unsafe {
            WmAtoms {
                protocols: xlib::XInternAtom(
                    display,
                    b"WM_PROTOCOLS\0".as_ptr() as *const c_char,
                    xlib::False,
                ),
                delete_window: xlib::XInternAtom(
                    display,
                    b"WM_DELETE_WINDOW\0".as_ptr() as *const c_char,
                    xlib::False,
                ),
            }
        };
        if atoms.protocols != 0 && atoms.delete_window != 0 {
            let mut protocols = [atoms.delete_window];
            // SAFETY: `protocols` outlives the call.
            unsafe { xlib::XSetWMProtocols(display, id, protocols.as_mut_ptr(), 1) };
            debug!("WM_PROTOCOLS (WM_DELETE_WINDOW) registered.");
        } else {
            warn!("Failed to get WM_DELETE_WINDOW or WM_PROTOCOLS atom. Window close events might not be received.");
        }

        let title = CString::new(config.title.replace('\0', ""))
            .context("Failed to create CString for window title")?;
        // SAFETY: `title` outlives the call.
        unsafe { xlib::XStoreName(display, id, title.as_ptr() as *mut c_char) };

        // SAFETY: a zeroed XGCValues with an empty value mask is valid.
        let gc = unsafe {
            let mut gc_values: xlib::XGCValues = mem::zeroed();
            xlib::XCreateGC(display, id, 0, &mut gc_values)
        };
        if gc.is_null() {
            // SAFETY: the window was created above and is destroyed once.
            unsafe { xlib::XDestroyWindow(display, id) };
            return Err(anyhow!("XCreateGC failed for window ID {}", id));
        }

        // SAFETY: FONT_NAME is NUL-terminated; a null result is handled.
        let font = unsafe { xlib::XLoadQueryFont(display, FONT_NAME.as_ptr() as *const c_char) };
        if font.is_null() {
            warn!("Core font 'fixed' is unavailable; debug text will not be drawn.");
        } else {
            // SAFETY: `font` is a valid font struct for this display.
            unsafe { xlib::XSetFont(display, gc, (*font).fid) };
        }

        // SAFETY: `display` and `id` are valid.
        unsafe { xlib::XMapWindow(display, id) };
        connection.flush();
        info!("X11 window {} mapped.", id);

        Ok(X11Window {
            connection: Some(connection),
            id,
            gc,
            font,
            atoms,
            geometry: WindowGeometry {
                width: config.width,
                height: config.height,
            },
            close_requested: false,
        })
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| anyhow!("X11 window {} was already destroyed", self.id))
    }

    fn fill(&self, connection: &Connection, color: Rgba, x: i32, y: i32, w: u32, h: u32) {
        // SAFETY: the display, window and GC are valid while `connection` is.
        unsafe {
            xlib::XSetForeground(connection.display(), self.gc, color.to_rgb24() as u64);
            xlib::XFillRectangle(connection.display(), self.id, self.gc, x, y, w, h);
        }
    }

    fn draw_text(&self, connection: &Connection, frame: &Frame) {
        if self.font.is_null() {
            return;
        }
        // SAFETY: `font` is non-null and owned by this window.
        let ascent = unsafe { (*self.font).ascent }.clamp(0, CELL_HEIGHT as c_int);
        for row in 0..frame.text.rows() {
            for run in frame.text.runs(row) {
                let x = (run.col as u32 * CELL_WIDTH) as c_int;
                let y = (run.row as u32 * CELL_HEIGHT) as c_int;
                let cells = run.text.chars().count() as u32;
                if run.attr.has_background() {
                    self.fill(
                        connection,
                        run.attr.bg().to_rgba(),
                        x,
                        y,
                        cells * CELL_WIDTH,
                        CELL_HEIGHT,
                    );
                }
                self.draw_run(connection, run.attr, x, y + ascent, &run.text);
            }
        }
    }

    fn draw_run(&self, connection: &Connection, attr: TextAttr, x: c_int, baseline: c_int, text: &str) {
        // Core fonts are indexed by Latin-1 code points.
        let bytes: Vec<u8> = text
            .chars()
            .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
            .collect();
        // SAFETY: `bytes` outlives the call; the length matches the buffer.
        unsafe {
            xlib::XSetForeground(
                connection.display(),
                self.gc,
                attr.fg().to_rgba().to_rgb24() as u64,
            );
            xlib::XDrawString(
                connection.display(),
                self.id,
                self.gc,
                x,
                baseline,
                bytes.as_ptr() as *const c_char,
                bytes.len() as c_int,
            );
        }
    }
}

impl Canvas for X11Window {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let connection = self.connection()?;
        trace!("X11Window: Presenting frame {}", frame.number);
        if let Some(view) = frame.view(CLEAR_VIEW) {
            self.fill(
                connection,
                view.clear_color,
                view.rect.x as c_int,
                view.rect.y as c_int,
                view.rect.width,
                view.rect.height,
            );
        }
        self.draw_text(connection, frame);
        connection.flush();
        Ok(())
    }
}

impl NativeWindow for X11Window {
    fn poll_events(&mut self) -> Result<Vec<WindowEvent>> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| anyhow!("poll on a destroyed X11 window"))?;
        let events = process_pending_events(connection, &self.atoms, &mut self.geometry);
        if events.contains(&WindowEvent::CloseRequested) {
            self.request_close();
        }
        Ok(events)
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn request_close(&mut self) {
        if !self.close_requested {
            info!("X11Window: Close requested");
            self.close_requested = true;
        }
    }

    fn surface_handle(&self) -> SurfaceHandle {
        SurfaceHandle {
            display: self
                .connection
                .as_ref()
                .map_or(0, |c| c.display() as usize),
            window: self.id as u64,
        }
    }

    fn inner_size(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    fn destroy(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };
        let display = connection.display();
        info!("Destroying X11 window (ID: {}).", self.id);
        // SAFETY: font, GC and window were created on this display and are
        // released exactly once, before the display is closed.
        unsafe {
            if !self.font.is_null() {
                xlib::XFreeFont(display, self.font);
                self.font = ptr::null_mut();
            }
            xlib::XFreeGC(display, self.gc);
            xlib::XDestroyWindow(display, self.id);
            xlib::XFlush(display);
        }
        drop(connection);
        Ok(())
    }
}

impl Drop for X11Window {
    fn drop(&mut self) {
        if self.connection.is_some() {
            warn!("X11Window dropped without destroy(); releasing it now.");
            if let Err(e) = self.destroy() {
                warn!("Failed to destroy X11 window: {:#}", e);
            }
        }
    }
}
