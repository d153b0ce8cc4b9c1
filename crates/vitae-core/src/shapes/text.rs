//! Text box object.

use super::{ObjectCommon, ObjectTrait};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Prefix marking a bulleted line.
pub const BULLET: char = '•';

/// Line height relative to font size, used for approximate bounds.
const LINE_HEIGHT: f64 = 1.16;

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn toggled(self) -> Self {
        match self {
            FontWeight::Bold => FontWeight::Normal,
            FontWeight::Normal => FontWeight::Bold,
        }
    }
}

/// Font style options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    /// Italic becomes normal, anything else becomes italic.
    pub fn toggled(self) -> Self {
        match self {
            FontStyle::Italic => FontStyle::Normal,
            FontStyle::Normal | FontStyle::Oblique => FontStyle::Italic,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

fn default_width() -> f64 {
    TextBox::DEFAULT_WIDTH
}

fn default_font_size() -> f64 {
    TextBox::DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    TextBox::DEFAULT_FONT_FAMILY.to_string()
}

/// A wrapping text box. `fill` on the common attributes is the font color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBox {
    #[serde(flatten)]
    pub common: ObjectCommon,
    /// Content, lines separated by `\n`.
    #[serde(default)]
    pub text: String,
    /// Wrapping width.
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub text_align: TextAlign,
    /// Hyperlink attached to the text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl TextBox {
    pub const DEFAULT_WIDTH: f64 = 200.0;
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Times New Roman";

    /// Create a text box with default typography.
    pub fn new(left: f64, top: f64, text: impl Into<String>) -> Self {
        Self {
            common: ObjectCommon::at(left, top),
            text: text.into(),
            width: Self::DEFAULT_WIDTH,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: default_font_family(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            underline: false,
            text_align: TextAlign::Left,
            link: None,
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_fill(mut self, color: impl Into<String>) -> Self {
        self.common.fill = Some(color.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Prefix every line that is not already bulleted.
    ///
    /// Returns `true` if the content changed. Running it twice is the same as running it once.
    pub fn add_bullets(&mut self) -> bool {
        let bulleted: Vec<String> = self
            .text
            .split('\n')
            .map(|line| {
                if line.starts_with(BULLET) {
                    line.to_string()
                } else {
                    format!("{BULLET} {line}")
                }
            })
            .collect();
        let bulleted = bulleted.join("\n");
        if bulleted == self.text {
            return false;
        }
        self.text = bulleted;
        true
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

impl ObjectTrait for TextBox {
    fn common(&self) -> &ObjectCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ObjectCommon {
        &mut self.common
    }

    fn bounds(&self) -> Rect {
        let height = self.font_size * LINE_HEIGHT * self.line_count() as f64;
        self.common.scaled_box(self.width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = TextBox::new(100.0, 100.0, "New Text");
        assert_eq!(text.text, "New Text");
        assert_eq!(text.font_size, 16.0);
        assert_eq!(text.font_weight, FontWeight::Normal);
        assert!(!text.common.id.is_empty());
    }

    #[test]
    fn test_toggles() {
        assert_eq!(FontWeight::Normal.toggled().toggled(), FontWeight::Normal);
        assert_eq!(FontStyle::Oblique.toggled(), FontStyle::Italic);
        assert_eq!(FontStyle::Italic.toggled(), FontStyle::Normal);
    }

    #[test]
    fn test_add_bullets_is_idempotent() {
        let mut text = TextBox::new(0.0, 0.0, "Rust\n• Go\nZig");
        assert!(text.add_bullets());
        assert_eq!(text.text, "• Rust\n• Go\n• Zig");
        assert!(!text.add_bullets());
        assert_eq!(text.text, "• Rust\n• Go\n• Zig");
    }

    #[test]
    fn test_bounds_grow_with_lines() {
        let one = TextBox::new(0.0, 0.0, "a");
        let two = TextBox::new(0.0, 0.0, "a\nb");
        assert!((one.bounds().width() - 200.0).abs() < f64::EPSILON);
        assert!(two.bounds().height() > one.bounds().height());
    }

    #[test]
    fn test_text_align_parse() {
        assert_eq!(TextAlign::parse("center"), Some(TextAlign::Center));
        assert_eq!(TextAlign::parse("middle"), None);
    }
}
