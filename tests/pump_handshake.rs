// tests/pump_handshake.rs
//
// End-to-end runs of the pump, the worker thread and the shutdown handshake
// against a headless window.

use render_pump::app::{self, EXIT_FAILURE, EXIT_OK};
use render_pump::config::{Config, ThreadingMode};
use render_pump::gfx::{DebugFlags, SurfaceHandle};
use render_pump::keys::KeySymbol;
use render_pump::platform::{HeadlessWindow, JournalEntry, WindowEvent};

fn config(threading: ThreadingMode) -> Config {
    let mut config = Config::default();
    config.window.headless = true;
    config.render.threading = threading;
    config.pump.drain_idle_sleep_us = 0;
    config
}

fn scenario_window() -> HeadlessWindow {
    HeadlessWindow::new("handshake", 1024, 768)
        .unwrap()
        .with_events(vec![
            WindowEvent::Resized {
                width: 1280,
                height: 720,
            },
            WindowEvent::Key {
                symbol: KeySymbol::F1,
                pressed: true,
            },
            WindowEvent::Key {
                symbol: KeySymbol::F1,
                pressed: false,
            },
            WindowEvent::CloseRequested,
        ])
}

fn last_presented(entries: &[JournalEntry]) -> Option<&JournalEntry> {
    entries
        .iter()
        .rev()
        .find(|e| matches!(e, JournalEntry::Presented { .. }))
}

fn assert_scenario_outcome(threading: ThreadingMode) {
    let mut window = scenario_window();
    let journal = window.journal();

    let status = app::run(&mut window, &config(threading)).unwrap();
    assert_eq!(status, EXIT_OK);

    let entries = journal.entries();
    match last_presented(&entries) {
        Some(JournalEntry::Presented {
            width,
            height,
            debug,
            headline,
            ..
        }) => {
            assert_eq!((*width, *height), (1280, 720));
            assert_eq!(*debug, DebugFlags::STATS);
            assert_eq!(headline, " Stats");
        }
        other => panic!("expected a presented frame, got {:?}", other),
    }
    // The window goes away last, after every presented frame.
    assert_eq!(entries.last(), Some(&JournalEntry::Destroyed));
    assert_eq!(
        entries
            .iter()
            .filter(|e| **e == JournalEntry::Destroyed)
            .count(),
        1
    );
}

#[test_log::test]
fn dual_threaded_resize_toggle_close() {
    assert_scenario_outcome(ThreadingMode::Dual);
}

#[test_log::test]
fn single_threaded_resize_toggle_close() {
    assert_scenario_outcome(ThreadingMode::Single);
}

#[test_log::test]
fn init_failure_exits_with_failure_and_still_shuts_down() {
    for threading in [ThreadingMode::Dual, ThreadingMode::Single] {
        let mut window = HeadlessWindow::new("broken", 640, 480)
            .unwrap()
            .with_surface(SurfaceHandle::default());
        let journal = window.journal();

        let status = app::run(&mut window, &config(threading)).unwrap();
        assert_eq!(status, EXIT_FAILURE);
        assert_eq!(journal.presented_count(), 0);
        assert_eq!(
            journal.entries(),
            vec![JournalEntry::CloseRequested, JournalEntry::Destroyed]
        );
    }
}

#[test_log::test]
fn frame_limit_closes_the_headless_window() {
    let mut window = HeadlessWindow::new("limited", 320, 240)
        .unwrap()
        .with_close_after_frames(5);
    let journal = window.journal();

    let status = app::run(&mut window, &config(ThreadingMode::Dual)).unwrap();
    assert_eq!(status, EXIT_OK);
    assert!(journal.presented_count() >= 5);

    let entries = journal.entries();
    let frame_numbers: Vec<u64> = entries
        .iter()
        .filter_map(|e| match e {
            JournalEntry::Presented { number, .. } => Some(*number),
            _ => None,
        })
        .collect();
    // Every submitted frame is presented once, in order.
    let expected: Vec<u64> = (0..frame_numbers.len() as u64).collect();
    assert_eq!(frame_numbers, expected);
}

#[test_log::test]
fn escape_key_closes_the_window() {
    let mut window = HeadlessWindow::new("escape", 320, 240)
        .unwrap()
        .with_events(vec![])
        .with_events(vec![WindowEvent::Key {
            symbol: KeySymbol::Escape,
            pressed: true,
        }]);
    let journal = window.journal();

    let status = app::run(&mut window, &config(ThreadingMode::Dual)).unwrap();
    assert_eq!(status, EXIT_OK);
    assert!(journal.entries().contains(&JournalEntry::CloseRequested));
    assert_eq!(journal.entries().last(), Some(&JournalEntry::Destroyed));
}
