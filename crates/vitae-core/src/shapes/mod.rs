//! Scene object definitions for the resume canvas.

mod circle;
mod image;
mod line;
mod rectangle;
mod text;
mod verbatim;

pub use circle::Circle;
pub use self::image::{Image, ImageFormat, decode_data_url};
pub use line::Line;
pub use rectangle::Rectangle;
pub use text::{BULLET, FontStyle, FontWeight, TextAlign, TextBox};
pub use verbatim::Verbatim;

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Attribute keys owned by the editor's decorations. They never travel in snapshots.
pub const DECORATION_KEYS: &[&str] = &[
    "selectable",
    "hasControls",
    "lockScalingFlip",
    "cornerStyle",
    "cornerColor",
    "borderColor",
];

/// Stable identifier for scene objects.
///
/// Generated once when an object is created and preserved across undo, redo and copy.
/// Paste is the only operation that assigns a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

fn unit() -> f64 {
    1.0
}

/// Attributes shared by every kind of scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCommon {
    #[serde(default)]
    pub id: ObjectId,
    /// Left edge in canvas coordinates.
    #[serde(default)]
    pub left: f64,
    /// Top edge in canvas coordinates.
    #[serde(default)]
    pub top: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "unit")]
    pub scale_x: f64,
    #[serde(default = "unit")]
    pub scale_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default = "unit")]
    pub stroke_width: f64,
    #[serde(default = "unit")]
    pub opacity: f64,
    /// Attributes this engine does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Null or unmodelled values from the loaded record.
    #[serde(skip)]
    pub verbatim: Verbatim,
}

impl ObjectCommon {
    /// Common attributes at a position, with a fresh id.
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            id: ObjectId::generate(),
            left,
            top,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            extra: Map::new(),
            verbatim: Verbatim::default(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Remove any decoration keys that slipped into the unmodelled attributes.
    pub(crate) fn strip_decorations(&mut self) {
        for key in DECORATION_KEYS {
            self.extra.remove(*key);
            self.verbatim.forget(key);
        }
    }

    /// Bounding box of an unrotated `width` x `height` box at this position.
    fn scaled_box(&self, width: f64, height: f64) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + width * self.scale_x,
            self.top + height * self.scale_y,
        )
    }
}

/// Kind tag of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Text,
    Rectangle,
    Circle,
    Line,
    Image,
}

impl ObjectKind {
    /// The `type` tag written into snapshots.
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Text => "textbox",
            ObjectKind::Rectangle => "rect",
            ObjectKind::Circle => "circle",
            ObjectKind::Line => "line",
            ObjectKind::Image => "image",
        }
    }

    /// Resolve a snapshot `type` tag, accepting the aliases the deserializer accepts.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "textbox" | "text" => Some(ObjectKind::Text),
            "rect" => Some(ObjectKind::Rectangle),
            "circle" => Some(ObjectKind::Circle),
            "line" => Some(ObjectKind::Line),
            "image" => Some(ObjectKind::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Text => "text box",
            ObjectKind::Rectangle => "rectangle",
            ObjectKind::Circle => "circle",
            ObjectKind::Line => "line",
            ObjectKind::Image => "image",
        };
        f.write_str(name)
    }
}

/// Behaviour shared by all object kinds.
pub trait ObjectTrait {
    fn common(&self) -> &ObjectCommon;

    fn common_mut(&mut self) -> &mut ObjectCommon;

    /// Axis-aligned bounds in canvas coordinates. Rotation is ignored.
    fn bounds(&self) -> Rect;

    /// Move the object by `delta`.
    fn translate(&mut self, delta: Vec2) {
        let common = self.common_mut();
        common.left += delta.x;
        common.top += delta.y;
    }

    /// Check if a canvas point falls on this object.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }
}

/// A positioned visual primitive, tagged by `type` in snapshots.
///
/// The derived form is wrapped by the impls in `verbatim`, which keep nulls,
/// unmodelled values and alias tags from loaded records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type")]
pub enum SceneObject {
    #[serde(rename = "textbox", alias = "text")]
    Text(TextBox),
    #[serde(rename = "rect")]
    Rectangle(Rectangle),
    #[serde(rename = "circle")]
    Circle(Circle),
    #[serde(rename = "line")]
    Line(Line),
    #[serde(rename = "image")]
    Image(Image),
}

impl SceneObject {
    fn inner(&self) -> &dyn ObjectTrait {
        match self {
            SceneObject::Text(s) => s,
            SceneObject::Rectangle(s) => s,
            SceneObject::Circle(s) => s,
            SceneObject::Line(s) => s,
            SceneObject::Image(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ObjectTrait {
        match self {
            SceneObject::Text(s) => s,
            SceneObject::Rectangle(s) => s,
            SceneObject::Circle(s) => s,
            SceneObject::Line(s) => s,
            SceneObject::Image(s) => s,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.common().id
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            SceneObject::Text(_) => ObjectKind::Text,
            SceneObject::Rectangle(_) => ObjectKind::Rectangle,
            SceneObject::Circle(_) => ObjectKind::Circle,
            SceneObject::Line(_) => ObjectKind::Line,
            SceneObject::Image(_) => ObjectKind::Image,
        }
    }

    pub fn common(&self) -> &ObjectCommon {
        self.inner().common()
    }

    pub fn common_mut(&mut self) -> &mut ObjectCommon {
        self.inner_mut().common_mut()
    }

    pub fn bounds(&self) -> Rect {
        self.inner().bounds()
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.inner_mut().translate(delta);
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.inner().hit_test(point, tolerance)
    }

    /// Replace the id with a freshly generated one.
    pub fn regenerate_id(&mut self) {
        self.common_mut().id = ObjectId::generate();
    }

    pub fn is_text(&self) -> bool {
        matches!(self, SceneObject::Text(_))
    }

    pub fn as_text(&self) -> Option<&TextBox> {
        match self {
            SceneObject::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBox> {
        match self {
            SceneObject::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<TextBox> for SceneObject {
    fn from(text: TextBox) -> Self {
        SceneObject::Text(text)
    }
}

impl From<Rectangle> for SceneObject {
    fn from(rect: Rectangle) -> Self {
        SceneObject::Rectangle(rect)
    }
}

impl From<Circle> for SceneObject {
    fn from(circle: Circle) -> Self {
        SceneObject::Circle(circle)
    }
}

impl From<Line> for SceneObject {
    fn from(line: Line) -> Self {
        SceneObject::Line(line)
    }
}

impl From<Image> for SceneObject {
    fn from(image: Image) -> Self {
        SceneObject::Image(image)
    }
}
