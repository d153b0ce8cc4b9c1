//! Straight line object.

use super::{ObjectCommon, ObjectTrait};
use kurbo::{Line as KurboLine, ParamCurveNearest, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A straight segment.
///
/// Lines created by the engine hold absolute canvas endpoints. Lines saved by
/// fabric (records carrying a fabric `version`) hold endpoints relative to the
/// centre of the box at `left`/`top`; `start` and `end` resolve both forms to
/// canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default)]
    pub x1: f64,
    #[serde(default)]
    pub y1: f64,
    #[serde(default)]
    pub x2: f64,
    #[serde(default)]
    pub y2: f64,
}

impl Line {
    /// Create a line between two points. `left`/`top` follow the segment's top-left extent.
    pub fn new(start: Point, end: Point) -> Self {
        let mut common = ObjectCommon::at(start.x.min(end.x), start.y.min(end.y));
        common.stroke = Some("#000".to_string());
        Self {
            common,
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
        }
    }

    pub fn with_stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.common.stroke = Some(color.into());
        self.common.stroke_width = width;
        self
    }

    /// Whether the endpoints are relative to the line's centre.
    pub fn is_centre_relative(&self) -> bool {
        self.common.extra.contains_key("version")
    }

    pub fn start(&self) -> Point {
        self.to_canvas(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        self.to_canvas(self.x2, self.y2)
    }

    fn to_canvas(&self, x: f64, y: f64) -> Point {
        if !self.is_centre_relative() {
            return Point::new(x, y);
        }
        let (sx, sy) = (self.common.scale_x, self.common.scale_y);
        let centre = Point::new(
            self.common.left + (self.x2 - self.x1).abs() * sx / 2.0,
            self.common.top + (self.y2 - self.y1).abs() * sy / 2.0,
        );
        centre + Vec2::new(x * sx, y * sy)
    }

    pub fn length(&self) -> f64 {
        (self.end() - self.start()).hypot()
    }
}

impl ObjectTrait for Line {
    fn common(&self) -> &ObjectCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ObjectCommon {
        &mut self.common
    }

    fn bounds(&self) -> Rect {
        let half = self.common.stroke_width / 2.0;
        Rect::from_points(self.start(), self.end()).inflate(half, half)
    }

    fn translate(&mut self, delta: Vec2) {
        self.common.left += delta.x;
        self.common.top += delta.y;
        if self.is_centre_relative() {
            return;
        }
        self.x1 += delta.x;
        self.y1 += delta.y;
        self.x2 += delta.x;
        self.y2 += delta.y;
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let segment = KurboLine::new(self.start(), self.end());
        let nearest = segment.nearest(point, 1e-6);
        nearest.distance_sq.sqrt() <= tolerance + self.common.stroke_width / 2.0
    }
}
