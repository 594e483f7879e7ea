// src/platform/x11/event.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use crate::keys::KeySymbol;
use crate::platform::WindowEvent;

use log::{debug, info, trace};
use std::mem;

use libc::c_uint;
use x11::{keysym, xlib};

/// Atoms needed to recognise the window manager's close request.
#[derive(Debug, Clone, Copy)]
pub struct WmAtoms {
    pub protocols: xlib::Atom,
    pub delete_window: xlib::Atom,
}

/// Last known client area size, used to drop ConfigureNotify events that
/// only moved the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: u32,
    pub height: u32,
}

/// Drains every pending X event without blocking and translates the ones
/// the application cares about.
pub fn process_pending_events(
    connection: &Connection,
    atoms: &WmAtoms,
    geometry: &mut WindowGeometry,
) -> Vec<WindowEvent> {
    let mut window_events = Vec::new();
    let display = connection.display();

    // SAFETY: `display` is valid while `connection` is alive. XPending does
    // not block, and XNextEvent is only called when an event is queued.
    while unsafe { xlib::XPending(display) } > 0 {
        let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
        unsafe { xlib::XNextEvent(display, &mut xevent) };

        // SAFETY: `type_` is the common discriminant of the XEvent union.
        let event_type = unsafe { xevent.type_ };

        match event_type {
            xlib::Expose => {
                // SAFETY: `event_type` is Expose.
                let expose_event = unsafe { xevent.expose };
                // Only the last Expose of a series matters.
                if expose_event.count == 0 {
                    trace!("XEvent: Expose on window {}", expose_event.window);
                    window_events.push(WindowEvent::Exposed);
                }
            }
            xlib::ConfigureNotify => {
                // SAFETY: `event_type` is ConfigureNotify.
                let configure_event = unsafe { xevent.configure };
                let width = configure_event.width.max(0) as u32;
                let height = configure_event.height.max(0) as u32;
                if (width, height) != (geometry.width, geometry.height) {
                    debug!(
                        "XEvent: ConfigureNotify (resize from {}x{} to {}x{}) on window {}",
                        geometry.width, geometry.height, width, height, configure_event.window
                    );
                    *geometry = WindowGeometry { width, height };
                    window_events.push(WindowEvent::Resized { width, height });
                } else {
                    trace!(
                        "XEvent: ConfigureNotify (no size change) on window {}",
                        configure_event.window
                    );
                }
            }
            xlib::KeyPress | xlib::KeyRelease => {
                // SAFETY: `event_type` is KeyPress or KeyRelease; XLookupKeysym
                // reads the key event and returns the unshifted keysym.
                let key_event = unsafe { &mut xevent.key };
                let x_keysym = unsafe { xlib::XLookupKeysym(key_event, 0) };
                let symbol = xkeysym_to_keysymbol(x_keysym);
                let pressed = event_type == xlib::KeyPress;
                trace!(
                    "XEvent: {} (symbol: {:?}, keysym: {:X}) on window {}",
                    if pressed { "KeyPress" } else { "KeyRelease" },
                    symbol,
                    x_keysym,
                    key_event.window
                );
                window_events.push(WindowEvent::Key { symbol, pressed });
            }
            xlib::ClientMessage => {
                // SAFETY: `event_type` is ClientMessage.
                let client_message_event = unsafe { xevent.client_message };
                if client_message_event.message_type == atoms.protocols
                    && client_message_event.data.get_long(0) as xlib::Atom == atoms.delete_window
                {
                    info!(
                        "XEvent: WM_DELETE_WINDOW received for window {}.",
                        client_message_event.window
                    );
                    window_events.push(WindowEvent::CloseRequested);
                } else {
                    trace!(
                        "XEvent: Ignored ClientMessage (type: {}) on window {}",
                        client_message_event.message_type,
                        client_message_event.window
                    );
                }
            }
            xlib::FocusIn => {
                debug!("XEvent: FocusIn");
                window_events.push(WindowEvent::FocusGained);
            }
            xlib::FocusOut => {
                debug!("XEvent: FocusOut");
                window_events.push(WindowEvent::FocusLost);
            }
            _ => {
                trace!("XEvent: Ignored event type {}", event_type);
            }
        }
    }

    window_events
}

/// Maps an X keysym to the platform-neutral `KeySymbol`.
pub fn xkeysym_to_keysymbol(x_keysym: xlib::KeySym) -> KeySymbol {
    let Ok(ks) = c_uint::try_from(x_keysym) else {
        return KeySymbol::Unknown;
    };
    match ks {
        keysym::XK_F1 => KeySymbol::F1,
        keysym::XK_F2 => KeySymbol::F2,
        keysym::XK_F3 => KeySymbol::F3,
        keysym::XK_F4 => KeySymbol::F4,
        keysym::XK_F5 => KeySymbol::F5,
        keysym::XK_F6 => KeySymbol::F6,
        keysym::XK_F7 => KeySymbol::F7,
        keysym::XK_F8 => KeySymbol::F8,
        keysym::XK_F9 => KeySymbol::F9,
        keysym::XK_F10 => KeySymbol::F10,
        keysym::XK_F11 => KeySymbol::F11,
        keysym::XK_F12 => KeySymbol::F12,

        keysym::XK_Shift_L | keysym::XK_Shift_R => KeySymbol::Shift,
        keysym::XK_Control_L | keysym::XK_Control_R => KeySymbol::Control,
        keysym::XK_Alt_L | keysym::XK_Alt_R | keysym::XK_Meta_L | keysym::XK_Meta_R => {
            KeySymbol::Alt
        }
        keysym::XK_Super_L | keysym::XK_Super_R => KeySymbol::Super,

        keysym::XK_Left => KeySymbol::Left,
        keysym::XK_Right => KeySymbol::Right,
        keysym::XK_Up => KeySymbol::Up,
        keysym::XK_Down => KeySymbol::Down,
        keysym::XK_Page_Up => KeySymbol::PageUp,
        keysym::XK_Page_Down => KeySymbol::PageDown,
        keysym::XK_Home => KeySymbol::Home,
        keysym::XK_End => KeySymbol::End,
        keysym::XK_Insert => KeySymbol::Insert,
        keysym::XK_Delete => KeySymbol::Delete,

        keysym::XK_Return | keysym::XK_KP_Enter => KeySymbol::Enter,
        keysym::XK_BackSpace => KeySymbol::Backspace,
        keysym::XK_Tab => KeySymbol::Tab,
        keysym::XK_Escape => KeySymbol::Escape,

        // Latin-1 keysyms equal their code points.
        0x20..=0x7e | 0xa0..=0xff => char::from_u32(ks)
            .map(KeySymbol::Char)
            .unwrap_or(KeySymbol::Unknown),
        _ => KeySymbol::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_and_control_keys_map() {
        assert_eq!(
            xkeysym_to_keysymbol(keysym::XK_F1 as xlib::KeySym),
            KeySymbol::F1
        );
        assert_eq!(
            xkeysym_to_keysymbol(keysym::XK_Escape as xlib::KeySym),
            KeySymbol::Escape
        );
        assert_eq!(
            xkeysym_to_keysymbol(keysym::XK_Control_R as xlib::KeySym),
            KeySymbol::Control
        );
    }

    #[test]
    fn latin1_keysyms_become_chars() {
        assert_eq!(
            xkeysym_to_keysymbol(keysym::XK_a as xlib::KeySym),
            KeySymbol::Char('a')
        );
        assert_eq!(xkeysym_to_keysymbol(0x1008_ff11), KeySymbol::Unknown);
    }
}
