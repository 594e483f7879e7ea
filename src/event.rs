// src/event.rs

//! Control messages that cross from the window thread to the render worker.

use crate::keys::KeySymbol;
use crate::platform::WindowEvent;

/// One message on the event queue.
///
/// Events are plain values: they are moved into the queue by the pump and
/// moved out by the worker, which observes each exactly once in push order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A key changed state.
    Key { code: KeySymbol, pressed: bool },
    /// The window's client area changed size, in pixels.
    Resize { width: u32, height: u32 },
    /// The window is closing; the worker renders one more frame and stops.
    Exit,
}

impl Event {
    /// Translates a native window event into a queue message.
    ///
    /// Returns `None` for events the worker has no use for (modifier-only
    /// key changes, focus changes, exposure, and the close request, which
    /// the pump handles itself).
    pub fn from_window_event(event: &WindowEvent) -> Option<Event> {
        match *event {
            WindowEvent::Key { symbol, .. } if symbol.is_modifier() => None,
            WindowEvent::Key { symbol, pressed } => Some(Event::Key {
                code: symbol,
                pressed,
            }),
            WindowEvent::Resized { width, height } => Some(Event::Resize { width, height }),
            WindowEvent::CloseRequested
            | WindowEvent::FocusGained
            | WindowEvent::FocusLost
            | WindowEvent::Exposed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_and_resize_translate() {
        assert_eq!(
            Event::from_window_event(&WindowEvent::Key {
                symbol: KeySymbol::F1,
                pressed: true
            }),
            Some(Event::Key {
                code: KeySymbol::F1,
                pressed: true
            })
        );
        assert_eq!(
            Event::from_window_event(&WindowEvent::Resized {
                width: 640,
                height: 480
            }),
            Some(Event::Resize {
                width: 640,
                height: 480
            })
        );
    }

    #[test]
    fn window_bookkeeping_events_are_not_forwarded() {
        for event in [
            WindowEvent::CloseRequested,
            WindowEvent::FocusGained,
            WindowEvent::FocusLost,
            WindowEvent::Exposed,
        ] {
            assert_eq!(Event::from_window_event(&event), None);
        }
    }

    #[test]
    fn modifier_only_key_changes_are_not_forwarded() {
        for (symbol, pressed) in [
            (KeySymbol::Shift, true),
            (KeySymbol::Control, false),
            (KeySymbol::Alt, true),
            (KeySymbol::Super, true),
        ] {
            assert_eq!(
                Event::from_window_event(&WindowEvent::Key { symbol, pressed }),
                None
            );
        }
        assert!(Event::from_window_event(&WindowEvent::Key {
            symbol: KeySymbol::Char('a'),
            pressed: true
        })
        .is_some());
    }
}
