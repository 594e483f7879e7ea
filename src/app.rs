// src/app.rs
//! Application wiring: threads, the shutdown handshake and exit statuses.
//!
//! Shutdown ordering:
//! 1. The pump sees close requested and pushes `Exit`.
//! 2. The worker applies it, submits its final frame and shuts the backend
//!    down; the teardown marker follows that frame through the handoff.
//! 3. The pump presents the frame, then sees "no context".
//! 4. The worker thread is joined, and only then is the window destroyed.

use crate::config::{Config, ThreadingMode};
use crate::event::Event;
use crate::gfx::{self, RenderBackend};
use crate::platform::NativeWindow;
use crate::pump::{Pump, PumpSettings, PumpState};
use crate::queue::{spsc_queue, Consumer};
use crate::worker::{run_worker, Phase, Worker, WorkerArgs};
use anyhow::{Context, Result};
use log::*;
use std::thread::{self, JoinHandle};

/// Graceful shutdown.
pub const EXIT_OK: i32 = 0;
/// Backend initialisation or window creation failed.
pub const EXIT_FAILURE: i32 = 1;
/// The render worker panicked.
pub const EXIT_WORKER_PANICKED: i32 = 101;

pub const WORKER_THREAD_NAME: &str = "render-worker";

/// Handle to the render worker thread.
pub struct WorkerHandle {
    thread_handle: JoinHandle<i32>,
}

impl WorkerHandle {
    pub fn spawn<B>(backend: B, events: Consumer<Event>, args: WorkerArgs) -> Result<Self>
    where
        B: RenderBackend + Send + 'static,
    {
        info!("WorkerHandle: Spawning {} thread", WORKER_THREAD_NAME);
        let thread_handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(backend, events, args))
            .context("Failed to spawn render worker thread")?;
        Ok(WorkerHandle { thread_handle })
    }

    /// Waits for the worker and returns its exit status.
    pub fn join(self) -> i32 {
        match self.thread_handle.join() {
            Ok(status) => {
                info!("WorkerHandle: Worker exited with status {}", status);
                status
            }
            Err(_) => {
                error!("WorkerHandle: Render worker panicked");
                EXIT_WORKER_PANICKED
            }
        }
    }
}

/// Runs the application on `window` in the configured threading mode and
/// destroys the window afterwards. Returns the process exit status.
pub fn run<W: NativeWindow>(window: &mut W, config: &Config) -> Result<i32> {
    match config.render.threading {
        ThreadingMode::Dual => run_dual_threaded(window, config),
        ThreadingMode::Single => run_single_threaded(window, config),
    }
}

/// Pump on the calling thread, rendering on a spawned worker thread.
pub fn run_dual_threaded<W: NativeWindow>(window: &mut W, config: &Config) -> Result<i32> {
    let (width, height) = window.inner_size();
    let args = WorkerArgs::from_config(window.surface_handle(), width, height, config);
    let (producer, consumer) = spsc_queue();
    let (context, mut service) = gfx::create();

    let worker = match WorkerHandle::spawn(context, consumer, args) {
        Ok(worker) => worker,
        Err(e) => {
            destroy_window(window);
            return Err(e);
        }
    };

    let pump_result = Pump::new(
        &mut *window,
        &mut service,
        producer,
        PumpSettings::from_config(&config.pump),
    )
    .run();
    // Unblocks a worker still waiting to hand over a frame.
    drop(service);

    let status = worker.join();
    destroy_window(window);
    pump_result.context("Window pump failed")?;
    Ok(status)
}

/// Pump and worker interleaved on the calling thread.
pub fn run_single_threaded<W: NativeWindow>(window: &mut W, config: &Config) -> Result<i32> {
    let (width, height) = window.inner_size();
    let args = WorkerArgs::from_config(window.surface_handle(), width, height, config);
    let (producer, consumer) = spsc_queue();
    let (context, mut service) = gfx::create();

    let (mut worker, mut status) = match Worker::start(context, consumer, args) {
        Ok(worker) => (Some(worker), EXIT_OK),
        Err(e) => {
            error!("Worker: {:#}", e);
            (None, EXIT_FAILURE)
        }
    };

    let mut pump = Pump::new(
        &mut *window,
        &mut service,
        producer,
        PumpSettings::from_config(&config.pump),
    );
    let pump_result = loop {
        match pump.tick() {
            Ok(PumpState::Finished) => break Ok(pump.stats()),
            Ok(_) => {}
            Err(e) => break Err(e),
        }
        // The tick above presented the previous frame, so the handoff has
        // room for this step's submission or the teardown marker.
        worker = match worker.take() {
            Some(mut w) if w.phase() == Phase::Active => match w.step() {
                Ok(_) => Some(w),
                Err(e) => {
                    error!("Worker: {:#}", e);
                    status = EXIT_FAILURE;
                    None
                }
            },
            Some(w) => {
                status = w.finish();
                None
            }
            None => None,
        };
    };
    drop(pump);
    drop(worker);
    drop(service);

    destroy_window(window);
    let stats = pump_result.context("Window pump failed")?;
    info!("Single-threaded run finished, {:?}", stats);
    Ok(status)
}

fn destroy_window<W: NativeWindow>(window: &mut W) {
    if let Err(e) = window.destroy() {
        warn!("Failed to destroy window: {:#}", e);
    }
}
