// src/overlay.rs

//! The debug text the render worker draws every frame: a centred logo, the
//! help line, a colour demo, palette swatches and the backbuffer size line.

use crate::color::TextAttr;
use crate::gfx::text::DebugText;
use crate::gfx::{BackendStats, DebugFlags, TextImage};
use crate::keys::KeySymbol;

pub const LOGO_WIDTH: u16 = 40;
pub const LOGO_HEIGHT: u16 = 12;

/// Column of the palette swatch rows.
const SWATCH_COL: u16 = 80;

const COLOR_LINE: &str = "Color can be changed with ANSI \x1b[9;me\x1b[10;ms\x1b[11;mc\x1b[12;ma\x1b[13;mp\x1b[14;me\x1b[0m code too.";

const SWATCHES_NORMAL: &str = "\x1b[;0m    \x1b[;1m    \x1b[; 2m    \x1b[; 3m    \x1b[; 4m    \x1b[; 5m    \x1b[; 6m    \x1b[; 7m    \x1b[0m";
const SWATCHES_BRIGHT: &str = "\x1b[;8m    \x1b[;9m    \x1b[;10m    \x1b[;11m    \x1b[;12m    \x1b[;13m    \x1b[;14m    \x1b[;15m    \x1b[0m";

#[derive(Debug, Clone)]
pub struct Overlay {
    logo: TextImage,
    help_line: String,
}

impl Overlay {
    pub fn new(toggle_key: KeySymbol) -> Self {
        Overlay {
            logo: build_logo(),
            help_line: format!("Press {} to toggle stats.", toggle_key.label()),
        }
    }

    /// Top-left cell of the logo: centred, pinned to the origin on
    /// surfaces too small to centre it.
    pub fn logo_origin(width: u32, height: u32) -> (u16, u16) {
        let center_col = (width / 2 / 8).min(u16::MAX as u32) as u16;
        let center_row = (height / 2 / 16).min(u16::MAX as u32) as u16;
        (
            center_col.max(LOGO_WIDTH / 2) - LOGO_WIDTH / 2,
            center_row.max(LOGO_HEIGHT / 2) - LOGO_HEIGHT / 2,
        )
    }

    /// Redraws the whole overlay for a `width` x `height` surface.
    pub fn refresh(&self, text: &mut DebugText, width: u32, height: u32, stats: &BackendStats) {
        text.clear();
        let (x, y) = Self::logo_origin(width, height);
        text.image(x, y, &self.logo);
        text.print(0, 0, TextAttr::DEFAULT, &self.help_line);
        text.print(0, 1, TextAttr::DEFAULT, COLOR_LINE);
        text.print(SWATCH_COL, 1, TextAttr::DEFAULT, SWATCHES_NORMAL);
        text.print(SWATCH_COL, 2, TextAttr::DEFAULT, SWATCHES_BRIGHT);
        text.print(
            0,
            2,
            TextAttr::DEFAULT,
            &format!(
                "Backbuffer {}W x {}H in pixels, debug text {}W x {}H in characters.",
                stats.width, stats.height, stats.text_cols, stats.text_rows
            ),
        );
    }

    /// Debug overlay selection for the stats toggle.
    pub fn debug_flags(show_stats: bool) -> DebugFlags {
        if show_stats {
            DebugFlags::STATS
        } else {
            DebugFlags::TEXT
        }
    }
}

fn build_logo() -> TextImage {
    let inner = (LOGO_WIDTH - 2) as usize;
    let border = format!("+{}+", "-".repeat(inner));
    let body = [
        "",
        "r e n d e r   p u m p",
        "",
        "window thread      render thread",
        "events --> [ queue ] --> state",
        "",
        "pixels <-- [ frame ] <-- submit",
        "",
        "one producer, one consumer",
        "",
    ];
    let mut lines = Vec::with_capacity(LOGO_HEIGHT as usize);
    lines.push(border.clone());
    lines.extend(body.iter().map(|l| format!("|{:^width$}|", l, width = inner)));
    lines.push(border);

    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let mut logo = TextImage::from_lines(&refs, TextAttr::new(0x07, 0x00));
    logo.tint('+', TextAttr::new(0x0e, 0x00));
    logo.tint('|', TextAttr::new(0x0e, 0x00));
    logo.tint('[', TextAttr::new(0x0b, 0x00));
    logo.tint(']', TextAttr::new(0x0b, 0x00));
    logo
}
