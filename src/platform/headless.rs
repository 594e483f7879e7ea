// src/platform/headless.rs

//! A window without a display.
//!
//! `HeadlessWindow` replays scripted event batches, one batch per poll, and
//! records every presented frame and lifecycle step in a shareable
//! [`Journal`]. The binary uses it when no native window is available; tests
//! use it to drive the pump end to end.

use crate::gfx::{Canvas, DebugFlags, Frame, SurfaceHandle};
use crate::platform::{NativeWindow, WindowEvent};
use anyhow::{bail, Result};
use log::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

/// One recorded step in a headless window's life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Presented {
        number: u64,
        width: u32,
        height: u32,
        debug: DebugFlags,
        /// First row of the presented debug text.
        headline: String,
    },
    CloseRequested,
    Destroyed,
}

/// Shared record of what a headless window did. Clones share the entries.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, entry: JournalEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn presented_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|e| matches!(e, JournalEntry::Presented { .. }))
            .count()
    }
}

pub struct HeadlessWindow {
    title: String,
    width: u32,
    height: u32,
    surface: SurfaceHandle,
    script: VecDeque<Vec<WindowEvent>>,
    close_after_frames: Option<u64>,
    presented: u64,
    close_requested: bool,
    destroyed: bool,
    journal: Journal,
}

impl HeadlessWindow {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("cannot create a {}x{} headless window", width, height);
        }
        let surface = SurfaceHandle {
            display: 0,
            window: NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed),
        };
        info!(
            "HeadlessWindow: Created '{}' ({}x{}, id {})",
            title, width, height, surface.window
        );
        Ok(HeadlessWindow {
            title: title.to_string(),
            width,
            height,
            surface,
            script: VecDeque::new(),
            close_after_frames: None,
            presented: 0,
            close_requested: false,
            destroyed: false,
            journal: Journal::new(),
        })
    }

    /// Queues a batch of events, delivered together by one `poll_events`.
    /// A scripted `Resized` also updates the window's own size when polled.
    pub fn with_events(mut self, batch: Vec<WindowEvent>) -> Self {
        self.script.push_back(batch);
        self
    }

    /// Requests close once `frames` frames were presented. Zero disables it.
    pub fn with_close_after_frames(mut self, frames: u64) -> Self {
        self.close_after_frames = (frames > 0).then_some(frames);
        self
    }

    /// Replaces the surface identity, e.g. with an invalid one in tests.
    pub fn with_surface(mut self, surface: SurfaceHandle) -> Self {
        self.surface = surface;
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }
}

impl Canvas for HeadlessWindow {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        if self.destroyed {
            bail!("present on a destroyed headless window");
        }
        trace!(
            "HeadlessWindow: Presenting frame {} ({}x{})",
            frame.number,
            frame.width,
            frame.height
        );
        self.journal.record(JournalEntry::Presented {
            number: frame.number,
            width: frame.width,
            height: frame.height,
            debug: frame.debug,
            headline: frame.text.row_text(0),
        });
        self.presented += 1;
        if let Some(limit) = self.close_after_frames {
            if self.presented >= limit && !self.close_requested {
                debug!("HeadlessWindow: Frame limit {} reached", limit);
                self.request_close();
            }
        }
        Ok(())
    }
}

impl NativeWindow for HeadlessWindow {
    fn poll_events(&mut self) -> Result<Vec<WindowEvent>> {
        if self.destroyed {
            bail!("poll on a destroyed headless window");
        }
        let batch = self.script.pop_front().unwrap_or_default();
        for event in &batch {
            match *event {
                WindowEvent::Resized { width, height } => {
                    self.width = width;
                    self.height = height;
                }
                WindowEvent::CloseRequested => self.request_close(),
                _ => {}
            }
        }
        Ok(batch)
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn request_close(&mut self) {
        if !self.close_requested {
            info!("HeadlessWindow: Close requested");
            self.close_requested = true;
            self.journal.record(JournalEntry::CloseRequested);
        }
    }

    fn surface_handle(&self) -> SurfaceHandle {
        self.surface
    }

    fn inner_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.journal.record(JournalEntry::Destroyed);
        info!(
            "HeadlessWindow: Destroyed after {} presented frames",
            self.presented
        );
        Ok(())
    }
}
