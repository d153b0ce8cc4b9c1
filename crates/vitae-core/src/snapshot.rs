//! Canonical serialized form of a scene document.

use crate::error::{EngineError, EngineResult};
use crate::shapes::{ObjectKind, SceneObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version tag written into new snapshots.
pub const DEFAULT_VERSION: &str = "5.2.4";

/// Background color of a new document.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// An immutable, decoration-free serialized document.
///
/// Snapshots are the unit of undo/redo and of persistence. Objects appear in
/// paint order (last is on top).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    objects: Vec<SceneObject>,
    #[serde(default = "default_background")]
    background: String,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty(DEFAULT_VERSION, DEFAULT_BACKGROUND)
    }
}

impl Snapshot {
    pub(crate) fn new(version: String, objects: Vec<SceneObject>, background: String) -> Self {
        Self {
            version,
            objects,
            background,
        }
    }

    /// A snapshot with no objects.
    pub fn empty(version: &str, background: &str) -> Self {
        Self::new(version.to_string(), Vec::new(), background.to_string())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Parse raw text edited outside the engine.
    pub fn from_raw(raw: &str) -> EngineResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| EngineError::MalformedSnapshot(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Validate and convert a JSON value.
    ///
    /// The value must be an object whose `objects` field is a list of
    /// type-tagged records. Records with an unrecognized `type` are skipped so
    /// that newer documents still open. Null or unmodelled attribute values
    /// are kept as written.
    pub fn from_value(value: Value) -> EngineResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(EngineError::MalformedSnapshot(
                "expected a JSON object".to_string(),
            ));
        };

        let records = match fields.remove("objects") {
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(EngineError::MalformedSnapshot(
                    "'objects' must be a list".to_string(),
                ));
            }
            None => {
                return Err(EngineError::MalformedSnapshot(
                    "missing 'objects' list".to_string(),
                ));
            }
        };

        let version = fields
            .get("version")
            .and_then(Value::as_str)
            .map_or_else(default_version, str::to_string);
        let background = fields
            .get("background")
            .and_then(Value::as_str)
            .map_or_else(default_background, str::to_string);

        let mut objects = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let Some(tag) = record.get("type").and_then(Value::as_str) else {
                return Err(EngineError::MalformedSnapshot(format!(
                    "object {index} has no type tag"
                )));
            };
            if ObjectKind::from_tag(tag).is_none() {
                log::warn!("Skipping object {index} with unsupported type '{tag}'");
                continue;
            }
            let mut object: SceneObject = serde_json::from_value(record)
                .map_err(|e| EngineError::MalformedSnapshot(format!("object {index}: {e}")))?;
            object.common_mut().strip_decorations();
            objects.push(object);
        }

        Ok(Self::new(version, objects, background))
    }

    pub fn to_value(&self) -> Value {
        // Every field serializes to a JSON-compatible value, so this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Pretty JSON for the raw-edit view.
    pub fn to_raw(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
