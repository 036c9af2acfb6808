//! Partial style descriptors

use super::{
    BorderEdge, BorderLineStyle, BorderSide, Color, FillStyle, HorizontalAlignment,
    NumberFormat, Style, Underline, VerticalAlignment,
};

/// A partial style: every `Some` field overrides the matching attribute of
/// an existing [`Style`], every `None` field leaves it alone
///
/// Applying the same patch twice gives the same style as applying it once.
///
/// ```
/// use cellfence_core::{Color, FillStyle, Style, StylePatch};
///
/// let patch = StylePatch {
///     bold: Some(true),
///     fill: Some(Color::rgb(0xFF, 0xEE, 0x00)),
///     ..Default::default()
/// };
/// let base = Style::new().italic(true);
/// let styled = patch.apply(&base);
///
/// assert!(styled.font.bold && styled.font.italic);
/// assert_eq!(styled.fill, FillStyle::solid(Color::rgb(0xFF, 0xEE, 0x00)));
/// assert_eq!(patch.apply(&styled), styled);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StylePatch {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<Underline>,
    pub strikethrough: Option<bool>,
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub font_color: Option<Color>,
    /// Solid background color
    pub fill: Option<Color>,
    pub horizontal: Option<HorizontalAlignment>,
    pub vertical: Option<VerticalAlignment>,
    pub wrap_text: Option<bool>,
    /// Number format code, e.g. `0.00%` or `yyyy-mm-dd`
    pub number_format: Option<String>,
    pub border: Option<BorderPatch>,
}

/// Border lines to draw on some sides of a cell
#[derive(Debug, Clone, PartialEq)]
pub struct BorderPatch {
    /// Line style; [`BorderLineStyle::None`] removes the listed sides
    pub style: BorderLineStyle,
    /// Line color, automatic when absent
    pub color: Option<Color>,
    /// Sides to set
    pub sides: Vec<BorderSide>,
}

impl BorderPatch {
    /// The same line on all four sides
    pub fn all(style: BorderLineStyle, color: Option<Color>) -> Self {
        Self {
            style,
            color,
            sides: BorderSide::ALL.to_vec(),
        }
    }
}

impl StylePatch {
    /// Whether the patch sets nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch onto `base`, returning the resulting style
    pub fn apply(&self, base: &Style) -> Style {
        let mut style = base.clone();

        let font = &mut style.font;
        if let Some(bold) = self.bold {
            font.bold = bold;
        }
        if let Some(italic) = self.italic {
            font.italic = italic;
        }
        if let Some(underline) = self.underline {
            font.underline = underline;
        }
        if let Some(strike) = self.strikethrough {
            font.strikethrough = strike;
        }
        if let Some(name) = &self.font_name {
            font.name = name.clone();
        }
        if let Some(size) = self.font_size {
            font.size = size;
        }
        if let Some(color) = self.font_color {
            font.color = color;
        }

        if let Some(color) = self.fill {
            style.fill = FillStyle::solid(color);
        }

        if let Some(h) = self.horizontal {
            style.alignment.horizontal = h;
        }
        if let Some(v) = self.vertical {
            style.alignment.vertical = v;
        }
        if let Some(wrap) = self.wrap_text {
            style.alignment.wrap_text = wrap;
        }

        if let Some(code) = &self.number_format {
            style.number_format = NumberFormat::from_code(code);
        }

        if let Some(border) = &self.border {
            let edge = match border.style {
                BorderLineStyle::None => None,
                line => Some(BorderEdge::new(line, border.color.unwrap_or_default())),
            };
            for side in &border.sides {
                *style.border.side_mut(*side) = edge.clone();
            }
        }

        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_is_identity() {
        let base = Style::new().bold(true).number_format("0.00");
        assert!(StylePatch::default().is_empty());
        assert_eq!(StylePatch::default().apply(&base), base);
    }

    #[test]
    fn test_only_set_fields_change() {
        let base = Style::new()
            .bold(true)
            .fill_color(Color::RED)
            .horizontal_alignment(HorizontalAlignment::Right);
        let patch = StylePatch {
            italic: Some(true),
            wrap_text: Some(true),
            number_format: Some("0.0%".into()),
            ..Default::default()
        };
        let out = patch.apply(&base);

        assert!(out.font.bold);
        assert!(out.font.italic);
        assert_eq!(out.fill, FillStyle::solid(Color::RED));
        assert_eq!(out.alignment.horizontal, HorizontalAlignment::Right);
        assert!(out.alignment.wrap_text);
        assert_eq!(out.number_format.format_string(), "0.0%");
    }

    #[test]
    fn test_border_sides() {
        let patch = StylePatch {
            border: Some(BorderPatch {
                style: BorderLineStyle::Thin,
                color: Some(Color::BLACK),
                sides: vec![BorderSide::Top, BorderSide::Bottom],
            }),
            ..Default::default()
        };
        let out = patch.apply(&Style::default());
        assert!(out.border.left.is_none());
        assert_eq!(
            out.border.top,
            Some(BorderEdge::new(BorderLineStyle::Thin, Color::BLACK))
        );

        let clear = StylePatch {
            border: Some(BorderPatch::all(BorderLineStyle::None, None)),
            ..Default::default()
        };
        assert!(clear.apply(&out).border.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let patch = StylePatch {
            bold: Some(false),
            font_size: Some(14.0),
            font_color: Some(Color::rgb(1, 2, 3)),
            vertical: Some(VerticalAlignment::Top),
            border: Some(BorderPatch::all(BorderLineStyle::Medium, None)),
            ..Default::default()
        };
        let once = patch.apply(&Style::new().bold(true));
        assert_eq!(patch.apply(&once), once);
    }
}
