//! Circle object.

use super::{ObjectCommon, ObjectTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A circle anchored at its bounding box's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default)]
    pub radius: f64,
}

impl Circle {
    pub fn new(left: f64, top: f64, radius: f64) -> Self {
        Self {
            common: ObjectCommon::at(left, top),
            radius,
        }
    }

    pub fn with_fill(mut self, color: impl Into<String>) -> Self {
        self.common.fill = Some(color.into());
        self
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

impl ObjectTrait for Circle {
    fn common(&self) -> &ObjectCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ObjectCommon {
        &mut self.common
    }

    fn bounds(&self) -> Rect {
        self.common.scaled_box(self.radius * 2.0, self.radius * 2.0)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let bounds = self.bounds();
        let rx = bounds.width() / 2.0 + tolerance;
        let ry = bounds.height() / 2.0 + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let center = bounds.center();
        let dx = (point.x - center.x) / rx;
        let dy = (point.y - center.y) / ry;
        dx * dx + dy * dy <= 1.0
    }
}
