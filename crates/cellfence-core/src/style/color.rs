//! Color representation

use crate::error::{Error, Result};
use std::fmt;

/// A color as it appears in a style part
///
/// Theme and indexed colors are kept symbolic so they survive a load/save
/// cycle unchanged; only RGB colors can be created from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,

    /// RGB color (no alpha)
    Rgb { r: u8, g: u8, b: u8 },

    /// ARGB color with alpha channel
    Argb { a: u8, r: u8, g: u8, b: u8 },

    /// Theme color with tint
    Theme {
        /// Theme color index (0-9 in the default theme)
        index: u8,
        /// Tint in thousandths (-1000 to 1000)
        tint: i16,
    },

    /// Indexed color (legacy palette)
    Indexed(u8),
}

impl Color {
    /// Create an RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Create a theme color; `tint` is the file's fractional tint value
    pub fn theme(index: u8, tint: f64) -> Self {
        let tint = (tint.clamp(-1.0, 1.0) * 1000.0).round() as i16;
        Color::Theme { index, tint }
    }

    /// Create from a 6 or 8 digit hex string (`#FF0000`, `FF0000`, `80FF0000`)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

        match hex.len() {
            6 => Some(Color::Rgb {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
            }),
            // Fully opaque ARGB is the same color as plain RGB
            8 => match byte(0)? {
                0xFF => Some(Color::Rgb {
                    r: byte(2)?,
                    g: byte(4)?,
                    b: byte(6)?,
                }),
                a => Some(Color::Argb {
                    a,
                    r: byte(2)?,
                    g: byte(4)?,
                    b: byte(6)?,
                }),
            },
            _ => None,
        }
    }

    /// Parse a user-supplied RGB color: exactly six hex digits once `#` and
    /// whitespace are removed
    ///
    /// ```
    /// use cellfence_core::Color;
    ///
    /// assert_eq!(Color::parse_rgb(" #ff8800 ").unwrap(), Color::rgb(0xFF, 0x88, 0x00));
    /// assert!(Color::parse_rgb("F80").is_err());
    /// ```
    pub fn parse_rgb(text: &str) -> Result<Self> {
        let cleaned: String = text
            .chars()
            .filter(|c| *c != '#' && !c.is_whitespace())
            .collect();
        if cleaned.len() != 6 {
            return Err(Error::InvalidStyle(format!(
                "color '{}' must be 6 hex digits",
                text
            )));
        }
        Self::from_hex(&cleaned)
            .ok_or_else(|| Error::InvalidStyle(format!("color '{}' is not valid hex", text)))
    }

    /// Uppercase `RRGGBB` for RGB/ARGB colors, `None` for symbolic colors
    pub fn to_hex(&self) -> Option<String> {
        match self {
            Color::Rgb { r, g, b } | Color::Argb { r, g, b, .. } => {
                Some(format!("{:02X}{:02X}{:02X}", r, g, b))
            }
            _ => None,
        }
    }

    /// 8-character `AARRGGBB` as used by the `rgb` attribute, `None` for
    /// symbolic colors
    pub fn to_argb_hex(&self) -> Option<String> {
        match self {
            Color::Rgb { r, g, b } => Some(format!("FF{:02X}{:02X}{:02X}", r, g, b)),
            Color::Argb { a, r, g, b } => Some(format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b)),
            _ => None,
        }
    }

    /// Check if color is automatic/default
    pub fn is_auto(&self) -> bool {
        matches!(self, Color::Auto)
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => write!(f, "auto"),
            Color::Rgb { r, g, b } => write!(f, "#{:02X}{:02X}{:02X}", r, g, b),
            Color::Argb { a, r, g, b } => write!(f, "#{:02X}{:02X}{:02X}{:02X}", a, r, g, b),
            Color::Theme { index, tint } => write!(f, "theme({}, {})", index, *tint as f64 / 1000.0),
            Color::Indexed(i) => write!(f, "indexed({})", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#FF0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(
            Color::from_hex("80FFFFFF"),
            Some(Color::Argb {
                a: 128,
                r: 255,
                g: 255,
                b: 255
            })
        );
        assert_eq!(Color::from_hex("FF00FF00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::from_hex("GG0000"), None);
        assert_eq!(Color::from_hex("F00"), None);
    }

    #[test]
    fn test_parse_rgb_is_strict() {
        assert_eq!(Color::parse_rgb("# 11 22 33").unwrap(), Color::rgb(0x11, 0x22, 0x33));
        assert!(Color::parse_rgb("FF112233").is_err());
        assert!(Color::parse_rgb("zzzzzz").is_err());
        assert!(Color::parse_rgb("").is_err());
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(Color::rgb(0xab, 0, 0x10).to_hex().as_deref(), Some("AB0010"));
        assert_eq!(Color::RED.to_argb_hex().as_deref(), Some("FFFF0000"));
        assert_eq!(Color::theme(4, 0.4).to_argb_hex(), None);
        assert_eq!(Color::theme(4, 0.39997), Color::Theme { index: 4, tint: 400 });
    }
}
