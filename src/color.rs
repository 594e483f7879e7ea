// src/color.rs

//! Colour types shared by the render worker and the window painters:
//! packed `Rgba` clear colours, the 16-entry debug palette (`NamedColor`),
//! and the 4-bit/4-bit debug text attribute (`TextAttr`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard ANSI named colors (indices 0-15).
/// These are the 8 normal and 8 bright colors used by the debug text palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,       // Also known as Grey
    BrightBlack = 8, // Also known as Dark Grey
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl NamedColor {
    /// Converts a palette index (0-15) to a `NamedColor`.
    /// Only the low nibble is considered, matching the attribute encoding.
    pub fn from_index(idx: u8) -> Self {
        match idx & 0x0f {
            0 => NamedColor::Black,
            1 => NamedColor::Red,
            2 => NamedColor::Green,
            3 => NamedColor::Yellow,
            4 => NamedColor::Blue,
            5 => NamedColor::Magenta,
            6 => NamedColor::Cyan,
            7 => NamedColor::White,
            8 => NamedColor::BrightBlack,
            9 => NamedColor::BrightRed,
            10 => NamedColor::BrightGreen,
            11 => NamedColor::BrightYellow,
            12 => NamedColor::BrightBlue,
            13 => NamedColor::BrightMagenta,
            14 => NamedColor::BrightCyan,
            _ => NamedColor::BrightWhite,
        }
    }

    /// Returns the opaque `Rgba` representation of this named color.
    /// These are common sRGB values used by many terminals.
    pub fn to_rgba(self) -> Rgba {
        match self {
            NamedColor::Black => Rgba::opaque(0, 0, 0),
            NamedColor::Red => Rgba::opaque(205, 0, 0),
            NamedColor::Green => Rgba::opaque(0, 205, 0),
            NamedColor::Yellow => Rgba::opaque(205, 205, 0),
            NamedColor::Blue => Rgba::opaque(0, 0, 238),
            NamedColor::Magenta => Rgba::opaque(205, 0, 205),
            NamedColor::Cyan => Rgba::opaque(0, 205, 205),
            NamedColor::White => Rgba::opaque(229, 229, 229),
            NamedColor::BrightBlack => Rgba::opaque(127, 127, 127),
            NamedColor::BrightRed => Rgba::opaque(255, 0, 0),
            NamedColor::BrightGreen => Rgba::opaque(0, 255, 0),
            NamedColor::BrightYellow => Rgba::opaque(255, 255, 0),
            NamedColor::BrightBlue => Rgba::opaque(92, 92, 255),
            NamedColor::BrightMagenta => Rgba::opaque(255, 0, 255),
            NamedColor::BrightCyan => Rgba::opaque(0, 255, 255),
            NamedColor::BrightWhite => Rgba::opaque(255, 255, 255),
        }
    }
}

/// A colour packed as `0xRRGGBBAA`.
///
/// In configuration files it may be written either as a plain number or as a
/// `"#rrggbbaa"` / `"#rrggbb"` string; it is always written back as a string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RgbaRepr", into = "String")]
pub struct Rgba(pub u32);

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | 0xff)
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// `0x00RRGGBB`, the pixel layout of 24/32-bit TrueColor visuals.
    pub const fn to_rgb24(self) -> u32 {
        self.0 >> 8
    }
}

impl fmt::Debug for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgba(#{:08x})", self.0)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        format!("#{:08x}", color.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RgbaRepr {
    Packed(u32),
    Hex(String),
}

impl TryFrom<RgbaRepr> for Rgba {
    type Error = String;

    fn try_from(repr: RgbaRepr) -> Result<Self, Self::Error> {
        match repr {
            RgbaRepr::Packed(value) => Ok(Rgba(value)),
            RgbaRepr::Hex(text) => {
                let digits = text.trim().trim_start_matches('#');
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(format!("invalid colour '{}': expected hex digits", text));
                }
                let value = u32::from_str_radix(digits, 16)
                    .map_err(|e| format!("invalid colour '{}': {}", text, e))?;
                match digits.len() {
                    8 => Ok(Rgba(value)),
                    6 => Ok(Rgba((value << 8) | 0xff)),
                    _ => Err(format!(
                        "invalid colour '{}': expected #rrggbb or #rrggbbaa",
                        text
                    )),
                }
            }
        }
    }
}

/// Debug text cell attribute: background in the high nibble, foreground in
/// the low nibble. Background index 0 is drawn as transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextAttr(pub u8);

impl TextAttr {
    /// White on transparent.
    pub const DEFAULT: TextAttr = TextAttr(0x0f);

    pub const fn new(fg: u8, bg: u8) -> Self {
        TextAttr(((bg & 0x0f) << 4) | (fg & 0x0f))
    }

    pub const fn fg_index(self) -> u8 {
        self.0 & 0x0f
    }

    pub const fn bg_index(self) -> u8 {
        self.0 >> 4
    }

    pub fn fg(self) -> NamedColor {
        NamedColor::from_index(self.fg_index())
    }

    pub fn bg(self) -> NamedColor {
        NamedColor::from_index(self.bg_index())
    }

    pub const fn has_background(self) -> bool {
        self.bg_index() != 0
    }

    pub const fn with_fg(self, fg: u8) -> Self {
        TextAttr((self.0 & 0xf0) | (fg & 0x0f))
    }

    pub const fn with_bg(self, bg: u8) -> Self {
        TextAttr((self.0 & 0x0f) | ((bg & 0x0f) << 4))
    }
}

impl Default for TextAttr {
    fn default() -> Self {
        TextAttr::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_components_unpack_in_order() {
        let c = Rgba(0x11223344);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x11, 0x22, 0x33, 0x44));
        assert_eq!(c.to_rgb24(), 0x112233);
        assert_eq!(Rgba::opaque(0x30, 0x30, 0x30), Rgba(0x303030ff));
    }

    #[test]
    fn rgba_accepts_numbers_and_hex_strings() {
        let packed: Rgba = serde_json::from_str(&0x303030ffu32.to_string()).unwrap();
        assert_eq!(packed, Rgba(0x303030ff));
        let long: Rgba = serde_json::from_str("\"#303030ff\"").unwrap();
        assert_eq!(long, Rgba(0x303030ff));
        let short: Rgba = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(short, Rgba(0xff0000ff));
        assert!(serde_json::from_str::<Rgba>("\"#12345\"").is_err());
        assert!(serde_json::from_str::<Rgba>("\"not-a-colour\"").is_err());
    }

    #[test]
    fn rgba_rejects_signed_or_empty_hex() {
        assert!(serde_json::from_str::<Rgba>("\"+1234567\"").is_err());
        assert!(serde_json::from_str::<Rgba>("\"#+12345\"").is_err());
        assert!(serde_json::from_str::<Rgba>("\"#\"").is_err());
    }

    #[test]
    fn text_attr_nibbles() {
        let attr = TextAttr::new(9, 4);
        assert_eq!(attr.0, 0x49);
        assert_eq!(attr.fg(), NamedColor::BrightRed);
        assert_eq!(attr.bg(), NamedColor::Blue);
        assert!(attr.has_background());
        assert!(!TextAttr::DEFAULT.has_background());
        assert_eq!(TextAttr::DEFAULT.with_bg(2).with_fg(1), TextAttr(0x21));
    }

    #[test]
    fn named_color_index_uses_low_nibble() {
        assert_eq!(NamedColor::from_index(3), NamedColor::Yellow);
        assert_eq!(NamedColor::from_index(0x1f), NamedColor::BrightWhite);
    }
}
