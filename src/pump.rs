// src/pump.rs
//! Window pump - the window thread's side of the render loop.
//!
//! Threading model:
//! - Owns: the producer half of the event queue
//! - Borrows: the native window and the window half of the gfx backend
//! - Busy loop while running; idle sleeps only while draining
//!
//! Lifecycle: `Running` forwards window events and services the backend
//! until a close is requested, then pushes `Exit` and moves to `Draining`.
//! `Draining` keeps servicing until the backend reports no context, which
//! means the worker submitted its last frame and shut down.

use crate::config::PumpConfig;
use crate::event::Event;
use crate::gfx::{BackendService, ServiceStatus};
use crate::keys::KeySymbol;
use crate::platform::{NativeWindow, WindowEvent};
use crate::queue::Producer;
use anyhow::{Context, Result};
use log::*;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpSettings {
    /// A pressed Escape key asks the window to close.
    pub close_on_escape: bool,
    /// "No context" while running counts as a close request.
    pub exit_when_worker_gone: bool,
    pub drain_idle_sleep: Duration,
}

impl PumpSettings {
    pub fn from_config(config: &PumpConfig) -> Self {
        PumpSettings {
            close_on_escape: config.close_on_escape,
            exit_when_worker_gone: config.exit_when_worker_gone,
            drain_idle_sleep: Duration::from_micros(config.drain_idle_sleep_us),
        }
    }
}

impl Default for PumpSettings {
    fn default() -> Self {
        Self::from_config(&PumpConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Running,
    Draining,
    Finished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub ticks: u64,
    pub events_forwarded: u64,
    pub events_ignored: u64,
    pub service_calls: u64,
}

pub struct Pump<'a, W: NativeWindow, S: BackendService> {
    window: &'a mut W,
    service: &'a mut S,
    events: Producer<Event>,
    settings: PumpSettings,
    state: PumpState,
    stats: PumpStats,
}

impl<'a, W: NativeWindow, S: BackendService> Pump<'a, W, S> {
    pub fn new(
        window: &'a mut W,
        service: &'a mut S,
        events: Producer<Event>,
        settings: PumpSettings,
    ) -> Self {
        Pump {
            window,
            service,
            events,
            settings,
            state: PumpState::Running,
            stats: PumpStats::default(),
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    /// Advances the pump by one iteration.
    pub fn tick(&mut self) -> Result<PumpState> {
        self.stats.ticks += 1;
        match self.state {
            PumpState::Running => {
                forward_events(
                    &mut *self.window,
                    &self.events,
                    self.settings.close_on_escape,
                    &mut self.stats,
                )?;
                let status = self.service();
                if self.window.close_requested() {
                    info!("Pump: Close requested, sending Exit to worker");
                    self.begin_drain();
                } else if status == ServiceStatus::NoContext && self.settings.exit_when_worker_gone {
                    warn!("Pump: Render worker is gone, closing window");
                    self.window.request_close();
                    self.begin_drain();
                }
            }
            PumpState::Draining => {
                if self.service() == ServiceStatus::NoContext {
                    info!("Pump: Backend reports no context, drain finished");
                    self.state = PumpState::Finished;
                } else if !self.settings.drain_idle_sleep.is_zero() {
                    thread::sleep(self.settings.drain_idle_sleep);
                }
            }
            PumpState::Finished => {}
        }
        Ok(self.state)
    }

    /// Ticks until `Finished`.
    pub fn run(mut self) -> Result<PumpStats> {
        debug!("Pump: Entering main loop");
        while self.tick()? != PumpState::Finished {}
        info!("Pump: Finished, {:?}", self.stats);
        Ok(self.stats)
    }

    fn begin_drain(&mut self) {
        self.events.push(Event::Exit);
        self.state = PumpState::Draining;
    }

    fn service(&mut self) -> ServiceStatus {
        self.stats.service_calls += 1;
        self.service.service_once(&mut *self.window)
    }
}

/// Polls the window once and pushes every translatable event.
pub(crate) fn forward_events<W: NativeWindow>(
    window: &mut W,
    events: &Producer<Event>,
    close_on_escape: bool,
    stats: &mut PumpStats,
) -> Result<()> {
    let batch = window
        .poll_events()
        .context("Failed to poll window events")?;
    for window_event in batch {
        if close_on_escape
            && window_event
                == (WindowEvent::Key {
                    symbol: KeySymbol::Escape,
                    pressed: true,
                })
        {
            debug!("Pump: Escape pressed, requesting close");
            window.request_close();
        }
        match Event::from_window_event(&window_event) {
            Some(event) => {
                trace!("Pump: Forwarding {:?}", event);
                events.push(event);
                stats.events_forwarded += 1;
            }
            None => {
                trace!("Pump: Ignoring {:?}", window_event);
                stats.events_ignored += 1;
            }
        }
    }
    Ok(())
}
