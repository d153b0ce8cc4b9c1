//! Active-object tracking and the clipboard slot.

use crate::canvas::SceneDocument;
use crate::shapes::{ObjectId, SceneObject};
use kurbo::Vec2;

/// The single active object, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    active: Option<ObjectId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: ObjectId) {
        self.active = Some(id);
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active_id(&self) -> Option<&ObjectId> {
        self.active.as_ref()
    }

    /// The active object, when it is still part of the document.
    pub fn active<'a>(&self, document: &'a SceneDocument) -> Option<&'a SceneObject> {
        self.active.as_ref().and_then(|id| document.get_object(id))
    }

    pub fn is_active(&self, id: &ObjectId) -> bool {
        self.active.as_ref() == Some(id)
    }
}

/// Holds at most one copied object for the whole session.
///
/// Pasting never empties the slot. Each paste lands one offset further than
/// the previous one, so repeated pastes fan out diagonally.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<SceneObject>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of the object, id included.
    pub fn copy(&mut self, object: &SceneObject) {
        self.slot = Some(object.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn peek(&self) -> Option<&SceneObject> {
        self.slot.as_ref()
    }

    /// Produce a pastable clone with a fresh id, moved by `offset`.
    ///
    /// The slot itself moves by the same offset, so the next paste does not
    /// land on top of this one.
    pub fn paste(&mut self, offset: Vec2) -> Option<SceneObject> {
        let slot = self.slot.as_mut()?;
        slot.translate(offset);
        let mut pasted = slot.clone();
        pasted.regenerate_id();
        Some(pasted)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
