// src/gfx/context.rs
//! Software gfx backend: a worker-side `Context` and a window-side `Service`.
//!
//! Threading model:
//! - `Context` lives on the render worker and builds `Frame`s
//! - `Service` lives on the window thread and presents them
//! - One-slot handoff: at most one submitted frame waits for presentation,
//!   so a second submission blocks until the window caught up
//! - Teardown travels through the same handoff, after the last frame

use super::text::{DebugText, CELL_HEIGHT, CELL_WIDTH};
use super::{
    BackendService, BackendStats, Canvas, DebugFlags, Frame, RenderBackend, ResetFlags,
    ServiceStatus, SurfaceHandle, ViewId, ViewRect, ViewTarget,
};
use crate::color::{Rgba, TextAttr};
use anyhow::{bail, Result};
use log::*;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TryRecvError};
use std::time::{Duration, Instant};

/// Message carried by the handoff.
enum Submission {
    Frame(Box<Frame>),
    Shutdown,
}

/// Creates a connected backend pair.
pub fn create() -> (Context, Service) {
    let (tx, rx) = sync_channel(1);
    (
        Context {
            tx: Some(tx),
            surface: None,
            width: 0,
            height: 0,
            reset: ResetFlags::empty(),
            views: Vec::new(),
            debug: DebugFlags::empty(),
            text: DebugText::new(0, 0),
            frames_submitted: 0,
            last_submit: None,
            cpu_frame_time: Duration::ZERO,
            service_gone: false,
        },
        Service {
            rx,
            context_gone: false,
            frames_presented: 0,
        },
    )
}

/// Worker half of the software backend.
pub struct Context {
    tx: Option<SyncSender<Submission>>,
    surface: Option<SurfaceHandle>,
    width: u32,
    height: u32,
    reset: ResetFlags,
    views: Vec<ViewTarget>,
    debug: DebugFlags,
    text: DebugText,
    frames_submitted: u64,
    last_submit: Option<Instant>,
    cpu_frame_time: Duration,
    service_gone: bool,
}

impl Context {
    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    fn full_rect(&self) -> ViewRect {
        ViewRect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    /// Builds the overlay shown instead of the debug text when `STATS` is set.
    fn stats_panel(&self, stats: &BackendStats) -> DebugText {
        let mut panel = DebugText::for_surface(self.width, self.height);
        let header = TextAttr::new(0x0f, 0x01);
        let body = TextAttr::new(0x0b, 0x00);
        panel.print(0, 0, header, " Stats ");
        let lines = [
            format!("Frame: {}", stats.frames_submitted),
            format!(
                "CPU frame time: {:7.3} [ms]",
                stats.cpu_frame_time.as_secs_f64() * 1000.0
            ),
            format!("Frame rate: {:7.1} [fps]", stats.frames_per_second()),
            format!(
                "Backbuffer {}W x {}H in pixels, {}x{} pixel cells",
                stats.width, stats.height, CELL_WIDTH, CELL_HEIGHT
            ),
            format!(
                "Debug text {}W x {}H in characters",
                stats.text_cols, stats.text_rows
            ),
        ];
        for (row, line) in lines.iter().enumerate() {
            panel.print(1, row as u16 + 1, body, line);
        }
        panel
    }
}

impl RenderBackend for Context {
    fn init(
        &mut self,
        surface: SurfaceHandle,
        width: u32,
        height: u32,
        reset: ResetFlags,
    ) -> Result<()> {
        if self.surface.is_some() {
            bail!("gfx context is already initialized");
        }
        if self.tx.is_none() {
            bail!("gfx context was shut down");
        }
        if !surface.is_valid() {
            bail!("invalid surface handle {:?}", surface);
        }
        if width == 0 || height == 0 {
            bail!("surface size {}x{} is empty", width, height);
        }
        self.surface = Some(surface);
        self.width = width;
        self.height = height;
        self.reset = reset;
        self.text.resize_for_surface(width, height);
        info!(
            "gfx: Context initialized on window {:#x}, {}x{}, reset {:?}",
            surface.window, width, height, reset
        );
        Ok(())
    }

    fn reconfigure_surface(&mut self, width: u32, height: u32, reset: ResetFlags) {
        debug!(
            "gfx: Reconfiguring surface {}x{} -> {}x{}",
            self.width, self.height, width, height
        );
        self.width = width;
        self.height = height;
        self.reset = reset;
        self.text.resize_for_surface(width, height);
    }

    fn set_output_target(&mut self, view: ViewId, clear_color: Rgba) {
        let rect = self.full_rect();
        match self.views.iter_mut().find(|v| v.id == view) {
            Some(target) => {
                target.clear_color = clear_color;
                target.rect = rect;
            }
            None => self.views.push(ViewTarget {
                id: view,
                clear_color,
                rect,
            }),
        }
    }

    fn set_debug(&mut self, flags: DebugFlags) {
        if flags != self.debug {
            debug!("gfx: Debug flags {:?} -> {:?}", self.debug, flags);
        }
        self.debug = flags;
    }

    fn debug_text(&mut self) -> &mut DebugText {
        &mut self.text
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            frames_submitted: self.frames_submitted,
            cpu_frame_time: self.cpu_frame_time,
            width: self.width,
            height: self.height,
            text_cols: self.text.cols(),
            text_rows: self.text.rows(),
        }
    }

    fn submit_frame(&mut self) -> Result<u64> {
        if self.surface.is_none() {
            bail!("submit_frame called before init");
        }
        let Some(tx) = self.tx.as_ref() else {
            bail!("submit_frame called after shutdown");
        };

        let now = Instant::now();
        if let Some(last) = self.last_submit {
            self.cpu_frame_time = now.duration_since(last);
        }
        self.last_submit = Some(now);

        let number = self.frames_submitted;
        let stats = self.stats();
        let text = if self.debug.contains(DebugFlags::STATS) {
            self.stats_panel(&stats)
        } else {
            self.text.clone()
        };
        let frame = Frame {
            number,
            width: self.width,
            height: self.height,
            reset: self.reset,
            views: self.views.clone(),
            debug: self.debug,
            text,
            stats,
        };

        trace!("gfx: Submitting frame {}", number);
        if tx.send(Submission::Frame(Box::new(frame))).is_err() && !self.service_gone {
            warn!("gfx: Window side is gone, frames are no longer presented");
            self.service_gone = true;
        }
        self.frames_submitted += 1;
        Ok(number)
    }

    fn shutdown(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        if tx.send(Submission::Shutdown).is_err() {
            debug!("gfx: Window side already gone at shutdown");
        }
        info!(
            "gfx: Context shut down after {} frames",
            self.frames_submitted
        );
    }
}

/// Window half of the software backend.
pub struct Service {
    rx: Receiver<Submission>,
    context_gone: bool,
    frames_presented: u64,
}

impl Service {
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl BackendService for Service {
    fn service_once(&mut self, canvas: &mut dyn Canvas) -> ServiceStatus {
        if self.context_gone {
            return ServiceStatus::NoContext;
        }
        match self.rx.try_recv() {
            Ok(Submission::Frame(frame)) => {
                if let Err(e) = canvas.present(&frame) {
                    warn!("gfx: Failed to present frame {}: {:#}", frame.number, e);
                }
                self.frames_presented += 1;
                ServiceStatus::HasContext
            }
            Ok(Submission::Shutdown) => {
                info!("gfx: Context shut down, service has no context");
                self.context_gone = true;
                ServiceStatus::NoContext
            }
            Err(TryRecvError::Empty) => ServiceStatus::HasContext,
            Err(TryRecvError::Disconnected) => {
                info!("gfx: Context dropped without shutdown, service has no context");
                self.context_gone = true;
                ServiceStatus::NoContext
            }
        }
    }
}

#[cfg(test)]
mod tests;
