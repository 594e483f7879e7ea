//! render-pump library crate.
//!
//! A window-owning pump thread and a render worker thread joined by an
//! unbounded single-producer/single-consumer event queue, with a shutdown
//! handshake that tears the renderer down before the window.

pub mod app;
pub mod color;
pub mod config;
pub mod event;
pub mod gfx;
pub mod keys;
pub mod overlay;
pub mod platform;
pub mod pump;
pub mod queue;
pub mod worker;
