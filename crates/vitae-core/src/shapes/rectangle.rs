//! Rectangle object.

use super::{ObjectCommon, ObjectTrait};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// A rectangle with optional rounded corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Horizontal corner radius.
    #[serde(default)]
    pub rx: f64,
    /// Vertical corner radius.
    #[serde(default)]
    pub ry: f64,
}

impl Rectangle {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            common: ObjectCommon::at(left, top),
            width,
            height,
            rx: 0.0,
            ry: 0.0,
        }
    }

    pub fn with_fill(mut self, color: impl Into<String>) -> Self {
        self.common.fill = Some(color.into());
        self
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.rx = radius;
        self.ry = radius;
        self
    }
}

impl ObjectTrait for Rectangle {
    fn common(&self) -> &ObjectCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ObjectCommon {
        &mut self.common
    }

    fn bounds(&self) -> Rect {
        self.common.scaled_box(self.width, self.height)
    }
}
