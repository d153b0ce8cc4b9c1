//! Decoration manager keyed by object id.

use super::decoration::Decoration;
use crate::shapes::ObjectId;
use std::collections::HashMap;

/// Tracks the decoration of every object in a document.
///
/// Lives next to the object list so that serializing the objects can never
/// pick up editor state.
#[derive(Debug, Clone, Default)]
pub struct DecorationManager {
    decorations: HashMap<ObjectId, Decoration>,
    template: Decoration,
}

impl DecorationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom decoration for objects decorated from now on.
    pub fn with_template(template: Decoration) -> Self {
        Self {
            decorations: HashMap::new(),
            template,
        }
    }

    /// Apply the standard decoration to an object, replacing any previous one.
    pub fn decorate(&mut self, id: &ObjectId) {
        self.decorations.insert(id.clone(), self.template.clone());
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Decoration> {
        self.decorations.get(id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut Decoration> {
        self.decorations.get_mut(id)
    }

    pub fn is_decorated(&self, id: &ObjectId) -> bool {
        self.decorations.contains_key(id)
    }

    pub fn remove(&mut self, id: &ObjectId) {
        self.decorations.remove(id);
    }

    pub fn clear(&mut self) {
        self.decorations.clear();
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }
}
