//! Fill style types

use super::Color;

/// Cell background fill
///
/// Gradient fills are not modelled; cells carrying one load with no fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FillStyle {
    /// No fill
    #[default]
    None,

    /// Solid color fill
    Solid { color: Color },

    /// Pattern fill
    Pattern {
        /// Pattern type
        pattern: PatternType,
        /// Foreground (pattern) color
        foreground: Color,
        /// Background color
        background: Color,
    },
}

impl FillStyle {
    /// Create a solid fill
    pub fn solid(color: Color) -> Self {
        FillStyle::Solid { color }
    }

    /// Check if no fill
    pub fn is_none(&self) -> bool {
        matches!(self, FillStyle::None)
    }
}

/// Pattern types for pattern fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatternType {
    #[default]
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray125,
    Gray0625,
}

impl PatternType {
    /// Keyword used in the `patternType` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::None => "none",
            PatternType::Solid => "solid",
            PatternType::MediumGray => "mediumGray",
            PatternType::DarkGray => "darkGray",
            PatternType::LightGray => "lightGray",
            PatternType::DarkHorizontal => "darkHorizontal",
            PatternType::DarkVertical => "darkVertical",
            PatternType::DarkDown => "darkDown",
            PatternType::DarkUp => "darkUp",
            PatternType::DarkGrid => "darkGrid",
            PatternType::DarkTrellis => "darkTrellis",
            PatternType::LightHorizontal => "lightHorizontal",
            PatternType::LightVertical => "lightVertical",
            PatternType::LightDown => "lightDown",
            PatternType::LightUp => "lightUp",
            PatternType::LightGrid => "lightGrid",
            PatternType::LightTrellis => "lightTrellis",
            PatternType::Gray125 => "gray125",
            PatternType::Gray0625 => "gray0625",
        }
    }

    /// Look up a `patternType` keyword
    pub fn from_name(s: &str) -> Option<Self> {
        const ALL: [PatternType; 19] = [
            PatternType::None,
            PatternType::Solid,
            PatternType::MediumGray,
            PatternType::DarkGray,
            PatternType::LightGray,
            PatternType::DarkHorizontal,
            PatternType::DarkVertical,
            PatternType::DarkDown,
            PatternType::DarkUp,
            PatternType::DarkGrid,
            PatternType::DarkTrellis,
            PatternType::LightHorizontal,
            PatternType::LightVertical,
            PatternType::LightDown,
            PatternType::LightUp,
            PatternType::LightGrid,
            PatternType::LightTrellis,
            PatternType::Gray125,
            PatternType::Gray0625,
        ];
        ALL.into_iter().find(|p| p.as_str() == s)
    }
}
