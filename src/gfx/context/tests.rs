// src/gfx/context/tests.rs

use super::*;
use crate::color::TextAttr;
use anyhow::anyhow;

#[derive(Default)]
struct RecordingCanvas {
    frames: Vec<Frame>,
    fail: bool,
}

impl Canvas for RecordingCanvas {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        if self.fail {
            return Err(anyhow!("canvas is broken"));
        }
        Ok(())
    }
}

fn surface() -> SurfaceHandle {
    SurfaceHandle {
        display: 0,
        window: 42,
    }
}

#[test_log::test]
fn init_rejects_bad_surfaces_and_double_init() {
    let (mut ctx, _service) = create();
    assert!(ctx
        .init(SurfaceHandle::default(), 640, 480, ResetFlags::VSYNC)
        .is_err());
    assert!(ctx.init(surface(), 0, 480, ResetFlags::VSYNC).is_err());
    assert!(!ctx.is_initialized());

    ctx.init(surface(), 640, 480, ResetFlags::VSYNC).unwrap();
    assert!(ctx.is_initialized());
    assert_eq!((ctx.debug_text().cols(), ctx.debug_text().rows()), (80, 30));
    assert!(ctx.init(surface(), 640, 480, ResetFlags::VSYNC).is_err());
}

#[test]
fn submit_before_init_is_an_error() {
    let (mut ctx, _service) = create();
    assert!(ctx.submit_frame().is_err());
}

#[test_log::test]
fn frames_reach_the_canvas_then_shutdown_reports_no_context() {
    let (mut ctx, mut service) = create();
    let mut canvas = RecordingCanvas::default();
    ctx.init(surface(), 320, 240, ResetFlags::VSYNC).unwrap();
    ctx.set_output_target(0, Rgba(0x303030ff));
    ctx.set_debug(DebugFlags::TEXT);
    ctx.debug_text().print(0, 0, TextAttr::DEFAULT, "hello");

    assert_eq!(service.service_once(&mut canvas), ServiceStatus::HasContext);
    assert_eq!(ctx.submit_frame().unwrap(), 0);
    assert_eq!(service.service_once(&mut canvas), ServiceStatus::HasContext);
    assert_eq!(canvas.frames.len(), 1);

    let frame = &canvas.frames[0];
    assert_eq!((frame.width, frame.height), (320, 240));
    assert_eq!(frame.text.row_text(0), "hello");
    let view = frame.view(0).unwrap();
    assert_eq!(view.clear_color, Rgba(0x303030ff));
    assert_eq!(view.rect.width, 320);

    assert_eq!(ctx.submit_frame().unwrap(), 1);
    // The handoff holds one submission; make room for the teardown marker.
    assert_eq!(service.service_once(&mut canvas), ServiceStatus::HasContext);
    assert_eq!(canvas.frames.len(), 2);
    ctx.shutdown();
    assert_eq!(service.service_once(&mut canvas), ServiceStatus::NoContext);
    assert_eq!(service.service_once(&mut canvas), ServiceStatus::NoContext);
    assert_eq!(service.frames_presented(), 2);
    assert!(ctx.submit_frame().is_err());
}

#[test]
fn dropped_context_means_no_context() {
    let (ctx, mut service) = create();
    let mut canvas = RecordingCanvas::default();
    drop(ctx);
    assert_eq!(service.service_once(&mut canvas), ServiceStatus::NoContext);
    assert!(canvas.frames.is_empty());
}

#[test]
fn stats_mode_replaces_the_debug_text() {
    let (mut ctx, mut service) = create();
    let mut canvas = RecordingCanvas::default();
    ctx.init(surface(), 800, 600, ResetFlags::empty()).unwrap();
    ctx.debug_text().print(0, 0, TextAttr::DEFAULT, "user text");
    ctx.set_debug(DebugFlags::STATS);
    ctx.submit_frame().unwrap();
    service.service_once(&mut canvas);

    let frame = &canvas.frames[0];
    assert!(frame.debug.contains(DebugFlags::STATS));
    assert_eq!(frame.text.row_text(0), " Stats");
    assert_eq!(frame.text.row_text(1), " Frame: 0");
    assert!(frame.text.row_text(4).contains("Backbuffer 800W x 600H"));
}

#[test]
fn resize_updates_views_once_reapplied() {
    let (mut ctx, _service) = create();
    ctx.init(surface(), 100, 100, ResetFlags::VSYNC).unwrap();
    ctx.set_output_target(0, Rgba(0xff0000ff));
    ctx.reconfigure_surface(1280, 720, ResetFlags::VSYNC);
    ctx.set_output_target(0, Rgba(0xff0000ff));
    let stats = ctx.stats();
    assert_eq!((stats.width, stats.height), (1280, 720));
    assert_eq!((stats.text_cols, stats.text_rows), (160, 45));
    assert_eq!(ctx.views.len(), 1);
    assert_eq!(ctx.views[0].rect.height, 720);
}

#[test_log::test]
fn presentation_errors_do_not_stop_servicing() {
    let (mut ctx, mut service) = create();
    let mut canvas = RecordingCanvas {
        fail: true,
        ..Default::default()
    };
    ctx.init(surface(), 64, 64, ResetFlags::empty()).unwrap();
    ctx.submit_frame().unwrap();
    assert_eq!(service.service_once(&mut canvas), ServiceStatus::HasContext);
    ctx.submit_frame().unwrap();
    assert_eq!(service.service_once(&mut canvas), ServiceStatus::HasContext);
    assert_eq!(canvas.frames.len(), 2);
}

#[test_log::test]
fn submitting_to_a_dead_service_drops_frames() {
    let (mut ctx, service) = create();
    ctx.init(surface(), 64, 64, ResetFlags::empty()).unwrap();
    drop(service);
    assert_eq!(ctx.submit_frame().unwrap(), 0);
    assert_eq!(ctx.submit_frame().unwrap(), 1);
    ctx.shutdown();
}
