//! Text alignment types

use crate::error::{Error, Result};

/// Text alignment settings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    /// Horizontal alignment
    pub horizontal: HorizontalAlignment,
    /// Vertical alignment
    pub vertical: VerticalAlignment,
    /// Wrap text
    pub wrap_text: bool,
    /// Shrink to fit
    pub shrink_to_fit: bool,
    /// Indent level (0-250)
    pub indent: u8,
    /// Text rotation in degrees (-90 to 90, or 255 for vertical)
    pub rotation: i16,
}

impl Alignment {
    /// Whether every attribute is at its default and the element can be omitted
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Horizontal alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    /// General alignment (text left, numbers right)
    #[default]
    General,
    Left,
    Center,
    Right,
    /// Repeat content to fill the cell width
    Fill,
    Justify,
    /// Center across selection
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    const ALL: [HorizontalAlignment; 8] = [
        HorizontalAlignment::General,
        HorizontalAlignment::Left,
        HorizontalAlignment::Center,
        HorizontalAlignment::Right,
        HorizontalAlignment::Fill,
        HorizontalAlignment::Justify,
        HorizontalAlignment::CenterContinuous,
        HorizontalAlignment::Distributed,
    ];

    /// Keyword used in the `horizontal` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlignment::General => "general",
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Fill => "fill",
            HorizontalAlignment::Justify => "justify",
            HorizontalAlignment::CenterContinuous => "centerContinuous",
            HorizontalAlignment::Distributed => "distributed",
        }
    }

    /// Parse a keyword (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidStyle(format!("unknown horizontal alignment '{}'", s)))
    }
}

/// Vertical alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    Top,
    Center,
    /// Bottom aligned (default)
    #[default]
    Bottom,
    Justify,
    Distributed,
}

impl VerticalAlignment {
    const ALL: [VerticalAlignment; 5] = [
        VerticalAlignment::Top,
        VerticalAlignment::Center,
        VerticalAlignment::Bottom,
        VerticalAlignment::Justify,
        VerticalAlignment::Distributed,
    ];

    /// Keyword used in the `vertical` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Center => "center",
            VerticalAlignment::Bottom => "bottom",
            VerticalAlignment::Justify => "justify",
            VerticalAlignment::Distributed => "distributed",
        }
    }

    /// Parse a keyword (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidStyle(format!("unknown vertical alignment '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(
            HorizontalAlignment::parse("centercontinuous").unwrap(),
            HorizontalAlignment::CenterContinuous
        );
        assert_eq!(VerticalAlignment::parse("TOP").unwrap(), VerticalAlignment::Top);
        assert!(HorizontalAlignment::parse("middle").is_err());
        assert!(VerticalAlignment::parse("left").is_err());
    }
}
