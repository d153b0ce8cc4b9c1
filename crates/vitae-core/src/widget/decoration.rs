//! Per-object decoration flags.

/// Visual shape of the resize handles drawn at an object's corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleShape {
    Square,
    /// Round handles (editor default).
    #[default]
    Circle,
}

impl HandleShape {
    pub fn name(&self) -> &'static str {
        match self {
            HandleShape::Square => "rect",
            HandleShape::Circle => "circle",
        }
    }
}

/// Editor-only affordances applied to every object after it enters the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub selectable: bool,
    /// Whether resize and rotate controls are shown.
    pub has_controls: bool,
    /// Prevent flipping an object by dragging a handle past its opposite edge.
    pub lock_scaling_flip: bool,
    pub corner_style: HandleShape,
    pub corner_color: String,
    pub border_color: String,
}

impl Decoration {
    /// Accent color used for handles and selection borders.
    pub const ACCENT: &'static str = "#4285f4";
}

impl Default for Decoration {
    fn default() -> Self {
        Self {
            selectable: true,
            has_controls: true,
            lock_scaling_flip: true,
            corner_style: HandleShape::Circle,
            corner_color: Self::ACCENT.to_string(),
            border_color: Self::ACCENT.to_string(),
        }
    }
}
