//! Scene document: the ordered list of objects on the resume canvas.

use crate::error::{EngineError, EngineResult};
use crate::shapes::{DECORATION_KEYS, ObjectId, SceneObject};
use crate::snapshot::{DEFAULT_BACKGROUND, DEFAULT_VERSION, Snapshot};
use crate::widget::{Decoration, DecorationManager};
use kurbo::{Point, Rect};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Direction of a single-step z-order move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    /// One step towards the top.
    Forward,
    /// One step towards the bottom.
    Backward,
}

/// An ordered sequence of scene objects. Later objects paint on top.
///
/// Decorations are tracked beside the objects and never reach a snapshot.
#[derive(Debug, Clone)]
pub struct SceneDocument {
    objects: Vec<SceneObject>,
    pub background: String,
    /// Version tag carried into snapshots.
    pub version: String,
    decorations: DecorationManager,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::with_attributes(DEFAULT_VERSION, DEFAULT_BACKGROUND)
    }

    pub fn with_attributes(version: &str, background: &str) -> Self {
        Self {
            objects: Vec::new(),
            background: background.to_string(),
            version: version.to_string(),
            decorations: DecorationManager::new(),
        }
    }

    /// Build a document from a snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut document = Self::with_attributes(snapshot.version(), snapshot.background());
        document.load_snapshot(snapshot);
        document
    }

    /// Add an object on top of the paint order and return its id.
    ///
    /// An empty or already used id is replaced by a fresh one.
    pub fn add_object(&mut self, object: impl Into<SceneObject>) -> ObjectId {
        let mut object = object.into();
        if object.id().is_empty() || self.contains(object.id()) {
            object.regenerate_id();
        }
        object.common_mut().strip_decorations();
        let id = object.id().clone();
        self.decorations.decorate(&id);
        self.objects.push(object);
        id
    }

    pub fn remove_object(&mut self, id: &ObjectId) -> EngineResult<SceneObject> {
        let index = self.require_index(id)?;
        self.decorations.remove(id);
        Ok(self.objects.remove(index))
    }

    pub fn get_object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn get_object_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id() == id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// Position of an object in paint order.
    pub fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id() == id)
    }

    fn require_index(&self, id: &ObjectId) -> EngineResult<usize> {
        self.index_of(id)
            .ok_or_else(|| EngineError::ObjectNotFound(id.clone()))
    }

    /// Merge a JSON patch into an object's attributes.
    ///
    /// `type` and `id` are ignored, so an object's kind and identity never
    /// change. Decoration keys are ignored too. Other values are taken as
    /// given: `null` or a value the attribute cannot hold resets the attribute
    /// to its default and is written back into snapshots unchanged.
    pub fn set_attributes(&mut self, id: &ObjectId, patch: &Map<String, Value>) -> EngineResult<()> {
        let index = self.require_index(id)?;
        let invalid = |reason: String| EngineError::InvalidAttribute {
            id: id.clone(),
            reason,
        };

        let mut value = serde_json::to_value(&self.objects[index]).map_err(|e| invalid(e.to_string()))?;
        let Some(fields) = value.as_object_mut() else {
            return Err(invalid("object did not serialize to a map".to_string()));
        };
        for (key, new_value) in patch {
            if key == "type" || key == "id" || DECORATION_KEYS.contains(&key.as_str()) {
                log::debug!("Ignoring attribute '{key}' on {id}");
                continue;
            }
            fields.insert(key.clone(), new_value.clone());
        }

        let updated: SceneObject = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        self.objects[index] = updated;
        Ok(())
    }

    /// Swap an object with its neighbour in paint order.
    ///
    /// Returns `false` when the object is already at the boundary.
    pub fn reorder(&mut self, id: &ObjectId, direction: Reorder) -> EngineResult<bool> {
        let pos = self.require_index(id)?;
        match direction {
            Reorder::Forward if pos + 1 < self.objects.len() => {
                self.objects.swap(pos, pos + 1);
                Ok(true)
            }
            Reorder::Backward if pos > 0 => {
                self.objects.swap(pos, pos - 1);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Remove every object. Document attributes are kept.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.decorations.clear();
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.version.clone(),
            self.objects.clone(),
            self.background.clone(),
        )
    }

    /// Replace all objects with the snapshot's and redecorate them.
    ///
    /// Never fails: objects without an id get a fresh one, and a snapshot with
    /// duplicate ids leaves the document empty.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) {
        self.clear();
        self.version = snapshot.version().to_string();
        self.background = snapshot.background().to_string();

        let mut seen = HashSet::new();
        let mut objects = Vec::with_capacity(snapshot.len());
        for object in snapshot.objects() {
            let mut object = object.clone();
            if object.id().is_empty() {
                object.regenerate_id();
            }
            if !seen.insert(object.id().clone()) {
                log::warn!(
                    "Snapshot contains duplicate object id {}; loading an empty document",
                    object.id()
                );
                return;
            }
            objects.push(object);
        }

        for object in &objects {
            self.decorations.decorate(object.id());
        }
        self.objects = objects;
    }

    /// Objects in paint order, bottom first.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn decoration(&self, id: &ObjectId) -> Option<&Decoration> {
        self.decorations.get(id)
    }

    pub fn decoration_mut(&mut self, id: &ObjectId) -> Option<&mut Decoration> {
        self.decorations.get_mut(id)
    }

    /// Topmost object under a point.
    pub fn object_at(&self, point: Point, tolerance: f64) -> Option<&SceneObject> {
        self.objects
            .iter()
            .rev()
            .find(|object| object.hit_test(point, tolerance))
    }

    /// Union of all object bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(SceneObject::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Ids of objects extending past the canvas rectangle.
    pub fn overflowing(&self, canvas: Rect) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|object| {
                let bounds = object.bounds();
                canvas.union(bounds) != canvas
            })
            .map(|object| object.id().clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }
}
