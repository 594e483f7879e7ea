// src/worker.rs
//! Render worker - owns all render state and advances frames.
//!
//! Threading model:
//! - Owns: the worker half of the gfx backend, `RenderState`, the overlay
//! - Receives: `Event`s from the window thread over the SPSC queue
//! - Never touches the window; only a copy of its `SurfaceHandle`
//!
//! Each step drains the queue, applies events in order, redraws the overlay
//! and submits exactly one frame. The step that applies `Exit` still submits
//! its frame; the worker then shuts the backend down.

use crate::app::{EXIT_FAILURE, EXIT_OK};
use crate::color::Rgba;
use crate::config::Config;
use crate::event::Event;
use crate::gfx::{RenderBackend, ResetFlags, SurfaceHandle, CLEAR_VIEW};
use crate::keys::KeySymbol;
use crate::overlay::Overlay;
use crate::queue::{Consumer, TryRecvError};
use anyhow::{Context, Result};
use log::*;

/// Everything the worker needs from the window thread, copied at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerArgs {
    pub surface: SurfaceHandle,
    pub width: u32,
    pub height: u32,
    pub clear_color: Rgba,
    pub reset: ResetFlags,
    pub stats_toggle_key: KeySymbol,
}

impl WorkerArgs {
    pub fn from_config(surface: SurfaceHandle, width: u32, height: u32, config: &Config) -> Self {
        let reset = if config.render.vsync {
            ResetFlags::VSYNC
        } else {
            ResetFlags::empty()
        };
        WorkerArgs {
            surface,
            width,
            height,
            clear_color: config.render.clear_color,
            reset,
            stats_toggle_key: config.render.stats_toggle_key,
        }
    }
}

/// Worker-local render state. Only the worker mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub width: u32,
    pub height: u32,
    pub show_stats: bool,
    pub terminate_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Terminated,
}

pub struct Worker<B: RenderBackend> {
    backend: B,
    events: Consumer<Event>,
    args: WorkerArgs,
    state: RenderState,
    overlay: Overlay,
    phase: Phase,
}

impl<B: RenderBackend> Worker<B> {
    /// Initializes the backend and sets up the default view.
    ///
    /// On failure the backend is dropped here, which the window side
    /// observes as "no context".
    pub fn start(mut backend: B, events: Consumer<Event>, args: WorkerArgs) -> Result<Self> {
        backend
            .init(args.surface, args.width, args.height, args.reset)
            .context("Failed to initialize render backend")?;
        backend.set_output_target(CLEAR_VIEW, args.clear_color);
        info!(
            "Worker: Backend initialized at {}x{}",
            args.width, args.height
        );

        Ok(Worker {
            backend,
            events,
            args,
            state: RenderState {
                width: args.width,
                height: args.height,
                show_stats: false,
                terminate_requested: false,
            },
            overlay: Overlay::new(args.stats_toggle_key),
            phase: Phase::Active,
        })
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs one iteration: apply pending events, redraw, submit one frame.
    pub fn step(&mut self) -> Result<Phase> {
        if self.phase == Phase::Terminated {
            return Ok(Phase::Terminated);
        }

        self.apply_pending_events();

        let stats = self.backend.stats();
        let (width, height) = (self.state.width, self.state.height);
        self.overlay
            .refresh(self.backend.debug_text(), width, height, &stats);
        self.backend
            .set_debug(Overlay::debug_flags(self.state.show_stats));
        let number = self
            .backend
            .submit_frame()
            .context("Failed to submit frame")?;
        trace!("Worker: Submitted frame {}", number);

        if self.state.terminate_requested {
            info!("Worker: Final frame {} submitted", number);
            self.phase = Phase::Terminated;
        }
        Ok(self.phase)
    }

    /// Steps until termination, then shuts the backend down.
    pub fn run(mut self) -> i32 {
        debug!("Worker: Entering render loop");
        loop {
            match self.step() {
                Ok(Phase::Active) => {}
                Ok(Phase::Terminated) => break,
                Err(e) => {
                    error!("Worker: {:#}", e);
                    self.backend.shutdown();
                    return EXIT_FAILURE;
                }
            }
        }
        self.finish()
    }

    /// Shuts the backend down. Must follow the final `step`.
    pub fn finish(mut self) -> i32 {
        self.backend.shutdown();
        info!("Worker: Backend shut down");
        EXIT_OK
    }

    fn apply_pending_events(&mut self) {
        loop {
            match self.events.try_pop() {
                Ok(event) => {
                    self.apply(event);
                    if self.state.terminate_requested {
                        // Anything queued after Exit stays queued.
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Worker: Event queue disconnected without Exit, terminating");
                    self.state.terminate_requested = true;
                    break;
                }
            }
        }
    }

    fn apply(&mut self, event: Event) {
        trace!("Worker: Applying {:?}", event);
        match event {
            Event::Key { code, pressed } => {
                if pressed && code == self.args.stats_toggle_key {
                    self.state.show_stats = !self.state.show_stats;
                    debug!("Worker: show_stats = {}", self.state.show_stats);
                }
            }
            Event::Resize { width, height } => {
                self.backend
                    .reconfigure_surface(width, height, self.args.reset);
                self.backend
                    .set_output_target(CLEAR_VIEW, self.args.clear_color);
                self.state.width = width;
                self.state.height = height;
                debug!("Worker: Surface resized to {}x{}", width, height);
            }
            Event::Exit => {
                info!("Worker: Exit received");
                self.state.terminate_requested = true;
            }
        }
    }
}

/// Thread body of the render worker. Returns the worker's exit status.
pub fn run_worker<B: RenderBackend>(backend: B, events: Consumer<Event>, args: WorkerArgs) -> i32 {
    match Worker::start(backend, events, args) {
        Ok(worker) => worker.run(),
        Err(e) => {
            error!("Worker: {:#}", e);
            EXIT_FAILURE
        }
    }
}
