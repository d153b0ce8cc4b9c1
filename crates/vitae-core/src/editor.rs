//! Editing session: one document with its selection, clipboard and history.
//!
//! Every mutating action follows the same order: mutate the document, take a
//! snapshot of it, then record that snapshot in history if it differs from
//! the present state. Actions that change nothing record nothing.

use crate::actions::Action;
use crate::assets::{AssetResolver, ResolvedAsset};
use crate::canvas::SceneDocument;
use crate::config::EditorConfig;
use crate::error::{EngineError, EngineResult};
use crate::history::History;
use crate::selection::{Clipboard, Selection};
use crate::shapes::{Circle, Image, Line, ObjectId, ObjectKind, Rectangle, SceneObject, TextBox};
use crate::snapshot::Snapshot;
use crate::storage::{Scope, TemplateId};
use crate::sync::{PushRequest, SyncBridge, snapshot_of};
use kurbo::Point;
use serde_json::{Map, Value};
use std::fmt;

/// Identifies an outstanding asset request.
pub type RequestId = u64;

/// Work in flight that blocks structural mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyState {
    Loading,
    Saving,
    ResolvingAsset(RequestId),
}

impl fmt::Display for BusyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusyState::Loading => f.write_str("loading"),
            BusyState::Saving => f.write_str("saving"),
            BusyState::ResolvingAsset(id) => write!(f, "loading image #{id}"),
        }
    }
}

/// An add-image request waiting for its asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub id: RequestId,
    pub src: String,
}

/// Result of a dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The document changed and a history entry was recorded.
    Applied,
    /// The action was valid but changed nothing.
    Unchanged,
    /// Unknown action name.
    Ignored,
    /// Waiting for an image asset; call [`Editor::complete_asset`].
    Pending(AssetRequest),
}

/// Where the open document lives in the template store.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateInfo {
    pub id: Option<TemplateId>,
    pub title: String,
    pub scope: Scope,
}

impl Default for TemplateInfo {
    fn default() -> Self {
        Self {
            id: None,
            title: "Untitled Resume".to_string(),
            scope: Scope::Owner,
        }
    }
}

/// A template fetched from the store, ready to replace the document.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub info: TemplateInfo,
    pub snapshot: Snapshot,
}

/// A single-user editing session.
#[derive(Debug, Clone)]
pub struct Editor {
    document: SceneDocument,
    selection: Selection,
    clipboard: Clipboard,
    history: History,
    config: EditorConfig,
    template: TemplateInfo,
    busy: Option<BusyState>,
    next_request: RequestId,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Start a session on an empty document.
    pub fn new(config: EditorConfig) -> Self {
        let document = SceneDocument::with_attributes(&config.version, &config.background);
        Self::from_document(document, config)
    }

    /// Start a session on an existing document.
    pub fn with_snapshot(snapshot: &Snapshot, config: EditorConfig) -> Self {
        Self::from_document(SceneDocument::from_snapshot(snapshot), config)
    }

    fn from_document(document: SceneDocument, config: EditorConfig) -> Self {
        let history = History::with_initial(document.to_snapshot(), config.history_limit);
        Self {
            document,
            selection: Selection::new(),
            clipboard: Clipboard::new(),
            history,
            config,
            template: TemplateInfo::default(),
            busy: None,
            next_request: 0,
        }
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Direct model access for the rendering layer. Changes made here are not
    /// in history until [`commit`](Self::commit) is called.
    pub fn document_mut(&mut self) -> &mut SceneDocument {
        &mut self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn template(&self) -> &TemplateInfo {
        &self.template
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.template.title = title.into();
    }

    pub fn busy(&self) -> Option<BusyState> {
        self.busy
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    /// The document's current serialized form.
    pub fn snapshot(&self) -> Snapshot {
        self.document.to_snapshot()
    }

    pub fn active_object(&self) -> Option<&SceneObject> {
        self.selection.active(&self.document)
    }

    /// Make an object active.
    pub fn select(&mut self, id: &ObjectId) -> EngineResult<()> {
        if !self.document.contains(id) {
            return Err(EngineError::ObjectNotFound(id.clone()));
        }
        self.selection.select(id.clone());
        Ok(())
    }

    /// Activate the topmost object under a canvas point, or clear the selection.
    pub fn select_at(&mut self, point: Point) -> Option<ObjectId> {
        match self.document.object_at(point, 0.0).map(|o| o.id().clone()) {
            Some(id) => {
                self.selection.select(id.clone());
                Some(id)
            }
            None => {
                self.selection.clear();
                None
            }
        }
    }

    pub fn deselect(&mut self) {
        self.selection.clear();
    }

    fn ensure_idle(&self) -> EngineResult<()> {
        match self.busy {
            Some(state) => Err(EngineError::Busy(state)),
            None => Ok(()),
        }
    }

    /// Record the document if it differs from the present history entry.
    fn record_change(&mut self) -> DispatchOutcome {
        let snapshot = self.document.to_snapshot();
        if self.history.current() == Some(&snapshot) {
            return DispatchOutcome::Unchanged;
        }
        self.history.record(snapshot);
        DispatchOutcome::Applied
    }

    /// Record edits made through [`document_mut`](Self::document_mut), such as a drag.
    pub fn commit(&mut self) -> EngineResult<DispatchOutcome> {
        self.ensure_idle()?;
        Ok(self.record_change())
    }

    /// Patch an object's attributes and record the change.
    pub fn set_attributes(&mut self, id: &ObjectId, patch: &Map<String, Value>) -> EngineResult<DispatchOutcome> {
        self.ensure_idle()?;
        self.document.set_attributes(id, patch)?;
        Ok(self.record_change())
    }

    /// Route a named action from the rendering layer.
    ///
    /// Unknown names are ignored rather than rejected.
    pub fn dispatch(&mut self, name: &str, payload: Option<&Value>) -> EngineResult<DispatchOutcome> {
        match Action::parse(name, payload)? {
            Some(action) => self.apply(action),
            None => {
                log::debug!("Ignoring unknown action '{name}'");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    /// Apply a parsed action.
    pub fn apply(&mut self, action: Action) -> EngineResult<DispatchOutcome> {
        if action.is_mutating() {
            self.ensure_idle()?;
        }
        match action {
            Action::ToggleBold => self.edit_text(|text| text.font_weight = text.font_weight.toggled()),
            Action::ToggleItalic => self.edit_text(|text| text.font_style = text.font_style.toggled()),
            Action::ToggleUnderline => self.edit_text(|text| text.underline = !text.underline),
            Action::SetFontSize(size) => self.edit_text(|text| text.font_size = size),
            Action::SetFontFamily(family) => self.edit_text(|text| text.font_family = family),
            Action::SetTextFill(color) => self.edit_text(|text| text.common.fill = Some(color)),
            Action::SetTextAlign(align) => self.edit_text(|text| text.text_align = align),
            Action::AddBullets => self.edit_text(|text| {
                text.add_bullets();
            }),
            Action::AddText => self.insert(
                TextBox::new(100.0, 100.0, "New Text")
                    .with_fill("#000")
                    .with_link(""),
            ),
            Action::AddRectangle => {
                self.insert(Rectangle::new(100.0, 100.0, 120.0, 60.0).with_fill("#e0e0e0"))
            }
            Action::AddCircle => self.insert(Circle::new(120.0, 120.0, 30.0).with_fill("#aaccee")),
            Action::AddLine => self.insert(
                Line::new(Point::new(60.0, 100.0), Point::new(300.0, 100.0)).with_stroke("#333", 2.0),
            ),
            Action::AddImage { src } => Ok(DispatchOutcome::Pending(self.begin_asset(src))),
            Action::ShapeFill(color) => {
                let shape = self.active_shape_mut()?;
                shape.common_mut().fill = Some(color);
                Ok(self.record_change())
            }
            Action::Delete => {
                let Some(id) = self.active_object().map(|o| o.id().clone()) else {
                    return Ok(DispatchOutcome::Unchanged);
                };
                self.document.remove_object(&id)?;
                self.selection.clear();
                Ok(self.record_change())
            }
            Action::Reorder(direction) => {
                let Some(id) = self.active_object().map(|o| o.id().clone()) else {
                    return Ok(DispatchOutcome::Unchanged);
                };
                if !self.document.reorder(&id, direction)? {
                    return Ok(DispatchOutcome::Unchanged);
                }
                Ok(self.record_change())
            }
            Action::Clear => {
                self.document.clear();
                self.selection.clear();
                Ok(self.record_change())
            }
            Action::Copy => {
                self.copy();
                Ok(DispatchOutcome::Unchanged)
            }
            Action::Cut => self.cut(),
            Action::Paste => self.paste(),
            Action::Undo => Ok(outcome(self.undo_now())),
            Action::Redo => Ok(outcome(self.redo_now())),
        }
    }

    /// Apply `edit` to the active text box and record the result.
    fn edit_text(&mut self, edit: impl FnOnce(&mut TextBox)) -> EngineResult<DispatchOutcome> {
        edit(self.active_text_mut()?);
        Ok(self.record_change())
    }

    fn active_text_mut(&mut self) -> EngineResult<&mut TextBox> {
        let found = self.active_object().map(SceneObject::kind);
        let Some(id) = self.selection.active_id() else {
            return Err(EngineError::WrongSelectionType {
                expected: "text box",
                found,
            });
        };
        match self.document.get_object_mut(id) {
            Some(SceneObject::Text(text)) => Ok(text),
            _ => Err(EngineError::WrongSelectionType {
                expected: "text box",
                found,
            }),
        }
    }

    /// The active object, which must not be a text box.
    fn active_shape_mut(&mut self) -> EngineResult<&mut SceneObject> {
        let found = self.active_object().map(SceneObject::kind);
        let wrong = EngineError::WrongSelectionType {
            expected: "shape",
            found,
        };
        if found.is_none() || found == Some(ObjectKind::Text) {
            return Err(wrong);
        }
        let Some(id) = self.selection.active_id() else {
            return Err(wrong);
        };
        self.document.get_object_mut(id).ok_or(wrong)
    }

    /// Add an object on top, make it active and record.
    fn insert(&mut self, object: impl Into<SceneObject>) -> EngineResult<DispatchOutcome> {
        let object = object.into();
        let kind = object.kind();
        let id = self.document.add_object(object);
        log::info!("Added {kind} {id}");
        self.selection.select(id);
        Ok(self.record_change())
    }

    /// Copy the active object into the clipboard. Allowed while busy.
    pub fn copy(&mut self) -> bool {
        match self.selection.active(&self.document) {
            Some(object) => {
                self.clipboard.copy(object);
                true
            }
            None => false,
        }
    }

    /// Copy the active object, remove it and clear the selection.
    pub fn cut(&mut self) -> EngineResult<DispatchOutcome> {
        self.ensure_idle()?;
        let Some(object) = self.active_object().cloned() else {
            return Ok(DispatchOutcome::Unchanged);
        };
        self.clipboard.copy(&object);
        self.document.remove_object(object.id())?;
        self.selection.clear();
        Ok(self.record_change())
    }

    /// Insert a fresh copy of the clipboard on top and make it active.
    pub fn paste(&mut self) -> EngineResult<DispatchOutcome> {
        self.ensure_idle()?;
        let Some(object) = self.clipboard.paste(self.config.paste_offset()) else {
            return Ok(DispatchOutcome::Unchanged);
        };
        let id = self.document.add_object(object);
        self.selection.select(id);
        Ok(self.record_change())
    }

    /// Step back one history entry. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> EngineResult<bool> {
        self.ensure_idle()?;
        Ok(self.undo_now())
    }

    /// Step forward one history entry. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> EngineResult<bool> {
        self.ensure_idle()?;
        Ok(self.redo_now())
    }

    fn undo_now(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.document.load_snapshot(snapshot);
        self.selection.clear();
        true
    }

    fn redo_now(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.document.load_snapshot(snapshot);
        self.selection.clear();
        true
    }

    /// Replace the document with hand-edited raw text and record it.
    ///
    /// On `MalformedSnapshot` the document is untouched.
    pub fn apply_raw(&mut self, raw: &str) -> EngineResult<DispatchOutcome> {
        self.ensure_idle()?;
        let snapshot = Snapshot::from_raw(raw)?;
        self.document.load_snapshot(&snapshot);
        self.selection.clear();
        self.history.record(self.document.to_snapshot());
        log::info!("Applied raw document with {} objects", self.document.len());
        Ok(DispatchOutcome::Applied)
    }

    fn begin_asset(&mut self, src: String) -> AssetRequest {
        self.next_request += 1;
        let request = AssetRequest {
            id: self.next_request,
            src,
        };
        self.busy = Some(BusyState::ResolvingAsset(request.id));
        log::debug!("Resolving image #{} from {}", request.id, request.src);
        request
    }

    /// Finish an add-image request.
    ///
    /// On success the image is inserted on top, made active and recorded. On
    /// failure the action is abandoned and nothing is left behind.
    pub fn complete_asset(&mut self, request: RequestId, result: EngineResult<ResolvedAsset>) -> EngineResult<DispatchOutcome> {
        if self.busy != Some(BusyState::ResolvingAsset(request)) {
            return Err(EngineError::UnknownRequest(request));
        }
        self.busy = None;
        match result {
            Ok(asset) => {
                let image = Image::new(100.0, 100.0, asset.src, asset.width, asset.height).with_scale(0.5);
                self.insert(image)
            }
            Err(e) => {
                log::warn!("Abandoning image #{request}: {e}");
                Err(e)
            }
        }
    }

    /// Resolve an image with `resolver` and add it.
    pub async fn add_image(&mut self, src: &str, resolver: &dyn AssetResolver) -> EngineResult<DispatchOutcome> {
        let outcome = self.apply(Action::AddImage {
            src: src.to_string(),
        })?;
        let DispatchOutcome::Pending(request) = outcome else {
            return Ok(outcome);
        };
        let result = resolver.resolve(&request.src).await;
        self.complete_asset(request.id, result)
    }

    fn end_busy(&mut self, state: BusyState) {
        if self.busy == Some(state) {
            self.busy = None;
        } else {
            log::warn!("Finishing {state} while {:?}", self.busy);
        }
    }

    /// Enter the loading state.
    pub fn begin_load(&mut self) -> EngineResult<()> {
        self.ensure_idle()?;
        self.busy = Some(BusyState::Loading);
        Ok(())
    }

    /// Finish a load. On success the document is replaced and history restarts
    /// from the loaded state; on failure nothing changes.
    pub fn finish_load(&mut self, result: EngineResult<LoadedTemplate>) -> EngineResult<()> {
        self.end_busy(BusyState::Loading);
        let loaded = result?;
        self.document.load_snapshot(&loaded.snapshot);
        self.selection.clear();
        self.history.reset(self.document.to_snapshot());
        log::info!(
            "Loaded '{}' with {} objects",
            loaded.info.title,
            self.document.len()
        );
        self.template = loaded.info;
        Ok(())
    }

    /// Load a template through the bridge.
    pub async fn open_template(&mut self, bridge: &SyncBridge, id: &TemplateId, scope: Scope) -> EngineResult<()> {
        self.begin_load()?;
        let result = async {
            let record = bridge.fetch(id, scope).await?;
            let snapshot = snapshot_of(&record)?;
            Ok::<_, EngineError>(LoadedTemplate {
                info: TemplateInfo {
                    id: Some(record.id),
                    title: record.title,
                    scope,
                },
                snapshot,
            })
        }
        .await;
        self.finish_load(result)
    }

    /// Enter the saving state and build the request for the current document.
    pub fn begin_save(&mut self, thumbnail: Option<Vec<u8>>) -> EngineResult<PushRequest> {
        self.ensure_idle()?;
        self.busy = Some(BusyState::Saving);
        let mut request = PushRequest::new(self.template.title.clone(), self.snapshot());
        request.thumbnail_bytes = thumbnail;
        Ok(request)
    }

    /// Finish a save. A failure never touches the document or its history.
    pub fn finish_save(&mut self, result: EngineResult<TemplateId>) -> EngineResult<TemplateId> {
        self.end_busy(BusyState::Saving);
        let id = result?;
        self.template.id = Some(id.clone());
        self.template.scope = Scope::Owner;
        Ok(id)
    }

    /// The personal template this session saves over, if any.
    fn personal_id(&self) -> Option<TemplateId> {
        match self.template.scope {
            Scope::Owner => self.template.id.clone(),
            Scope::Public => None,
        }
    }

    /// Save to the user's own templates. A session opened from a public
    /// template saves a new personal copy.
    pub async fn save(&mut self, bridge: &SyncBridge, thumbnail: Option<Vec<u8>>) -> EngineResult<TemplateId> {
        let request = self.begin_save(thumbnail)?;
        let existing = self.personal_id();
        let result = bridge.push(existing.as_ref(), request).await;
        self.finish_save(result)
    }

    /// Publish the document, then remove the personal copy it came from.
    pub async fn publish(&mut self, bridge: &SyncBridge, thumbnail: Option<Vec<u8>>) -> EngineResult<TemplateId> {
        let request = self.begin_save(thumbnail)?;
        let personal = self.personal_id();
        let result = bridge.publish(request).await;
        if let (Ok(_), Some(personal)) = (&result, &personal) {
            if let Err(e) = bridge.delete(personal).await {
                log::warn!("Published, but could not remove personal template {personal}: {e}");
            }
        }
        self.end_busy(BusyState::Saving);
        let id = result?;
        self.template.id = Some(id.clone());
        self.template.scope = Scope::Public;
        Ok(id)
    }
}

fn outcome(changed: bool) -> DispatchOutcome {
    if changed {
        DispatchOutcome::Applied
    } else {
        DispatchOutcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetResolver;
    use crate::canvas::Reorder;
    use crate::shapes::{FontStyle, FontWeight, TextAlign};
    use crate::storage::{AuthToken, MemoryTemplateStore, TemplateStore};
    use pollster::block_on;
    use serde_json::json;
    use std::sync::Arc;

    fn editor() -> Editor {
        Editor::default()
    }

    fn dispatch(editor: &mut Editor, name: &str) -> DispatchOutcome {
        editor.dispatch(name, None).unwrap()
    }

    fn active_text(editor: &Editor) -> &TextBox {
        editor.active_object().and_then(SceneObject::as_text).unwrap()
    }

    #[test]
    fn test_initial_state_is_first_history_entry() {
        let editor = editor();
        assert_eq!(editor.history().undo_len(), 1);
        assert_eq!(editor.history().current(), Some(&editor.snapshot()));
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_add_actions_use_defaults_and_activate() {
        let mut editor = editor();
        assert_eq!(dispatch(&mut editor, "add-text"), DispatchOutcome::Applied);
        let text = active_text(&editor);
        assert_eq!(text.text, "New Text");
        assert_eq!(text.width, 200.0);
        assert_eq!(text.font_size, 16.0);
        assert_eq!(text.common.fill.as_deref(), Some("#000"));

        dispatch(&mut editor, "addRect");
        let SceneObject::Rectangle(rect) = editor.active_object().unwrap() else {
            panic!("expected rectangle");
        };
        assert_eq!((rect.width, rect.height), (120.0, 60.0));

        dispatch(&mut editor, "add-circle");
        let SceneObject::Circle(circle) = editor.active_object().unwrap() else {
            panic!("expected circle");
        };
        assert_eq!(circle.radius, 30.0);
        assert_eq!(circle.common.fill.as_deref(), Some("#aaccee"));

        dispatch(&mut editor, "add-line");
        let SceneObject::Line(line) = editor.active_object().unwrap() else {
            panic!("expected line");
        };
        assert_eq!(line.common.stroke.as_deref(), Some("#333"));
        assert_eq!(line.common.stroke_width, 2.0);

        assert_eq!(editor.document().len(), 4);
        assert_eq!(editor.history().undo_len(), 5);
        assert_eq!(editor.document().objects()[3].id(), editor.active_object().unwrap().id());
    }

    #[test]
    fn test_mutation_records_after_change() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        dispatch(&mut editor, "bold");
        assert_eq!(editor.history().current(), Some(&editor.snapshot()));
        assert!(!editor.history().can_redo());
    }

    #[test]
    fn test_undo_twice_after_direct_reorder_returns_to_empty() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        dispatch(&mut editor, "add-rectangle");
        let rect = editor.active_object().unwrap().id().clone();
        let text = editor.document().objects()[0].id().clone();

        assert!(editor.document_mut().reorder(&rect, Reorder::Backward).unwrap());
        assert_eq!(editor.document().index_of(&rect), Some(0));
        assert_eq!(editor.document().index_of(&text), Some(1));

        assert!(editor.undo().unwrap());
        assert!(editor.undo().unwrap());
        assert!(editor.document().is_empty());
        assert!(!editor.undo().unwrap());
    }

    #[test]
    fn test_undo_and_redo_over_n_actions() {
        let mut editor = editor();
        let actions = ["add-text", "bold", "add-rectangle", "shape-fill", "add-circle", "send-backward"];
        let mut states = Vec::new();
        for name in actions {
            let payload = (name == "shape-fill").then(|| json!("#123456"));
            let outcome = editor.dispatch(name, payload.as_ref()).unwrap();
            assert_eq!(outcome, DispatchOutcome::Applied, "{name}");
            states.push(editor.snapshot());
        }
        let n = actions.len();

        for _ in 0..n - 1 {
            assert!(editor.undo().unwrap());
        }
        assert_eq!(editor.snapshot(), states[0]);

        assert!(editor.undo().unwrap());
        assert!(editor.document().is_empty());
        assert!(!editor.undo().unwrap());

        assert!(editor.redo().unwrap());
        assert_eq!(editor.snapshot(), states[0]);
        for _ in 0..n - 2 {
            assert!(editor.redo().unwrap());
        }
        assert_eq!(editor.snapshot(), states[n - 2]);
        assert!(editor.redo().unwrap());
        assert_eq!(editor.snapshot(), states[n - 1]);
        assert!(!editor.redo().unwrap());
    }

    #[test]
    fn test_undo_preserves_ids_and_redecorates() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let id = editor.active_object().unwrap().id().clone();
        dispatch(&mut editor, "add-circle");
        dispatch(&mut editor, "undo");

        assert_eq!(editor.document().objects()[0].id(), &id);
        assert!(editor.document().decoration(&id).is_some());
        assert!(editor.active_object().is_none());
    }

    #[test]
    fn test_bold_twice_restores_weight() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let before = editor.history().undo_len();

        assert_eq!(dispatch(&mut editor, "bold"), DispatchOutcome::Applied);
        assert_eq!(active_text(&editor).font_weight, FontWeight::Bold);
        assert_eq!(dispatch(&mut editor, "bold"), DispatchOutcome::Applied);
        assert_eq!(active_text(&editor).font_weight, FontWeight::Normal);
        assert_eq!(editor.history().undo_len(), before + 2);
    }

    #[test]
    fn test_bold_without_text_changes_nothing() {
        let mut editor = editor();
        dispatch(&mut editor, "add-rectangle");
        let raw = editor.snapshot().to_raw();
        let len = editor.history().undo_len();

        let err = editor.dispatch("bold", None).unwrap_err();
        assert!(matches!(
            err,
            EngineError::WrongSelectionType { found: Some(ObjectKind::Rectangle), .. }
        ));

        editor.deselect();
        let err = editor.dispatch("bold", None).unwrap_err();
        assert!(matches!(err, EngineError::WrongSelectionType { found: None, .. }));

        assert_eq!(editor.snapshot().to_raw(), raw);
        assert_eq!(editor.history().undo_len(), len);
    }

    #[test]
    fn test_text_style_actions() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        editor.dispatch("italic", None).unwrap();
        editor.dispatch("underline", None).unwrap();
        editor.dispatch("fontSize", Some(&json!("20"))).unwrap();
        editor.dispatch("fontFamily", Some(&json!("Georgia"))).unwrap();
        editor.dispatch("fill", Some(&json!("#ff0000"))).unwrap();
        editor.dispatch("textAlign", Some(&json!("center"))).unwrap();

        let text = active_text(&editor);
        assert_eq!(text.font_style, FontStyle::Italic);
        assert!(text.underline);
        assert_eq!(text.font_size, 20.0);
        assert_eq!(text.font_family, "Georgia");
        assert_eq!(text.common.fill.as_deref(), Some("#ff0000"));
        assert_eq!(text.text_align, TextAlign::Center);
    }

    #[test]
    fn test_setting_same_value_records_nothing() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let len = editor.history().undo_len();
        let outcome = editor.dispatch("font-size", Some(&json!(16))).unwrap();
        assert_eq!(outcome, DispatchOutcome::Unchanged);
        assert_eq!(editor.history().undo_len(), len);
    }

    #[test]
    fn test_add_bullets_idempotent() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let id = editor.active_object().unwrap().id().clone();
        let patch = json!({"text": "Rust\n• Go"}).as_object().cloned().unwrap();
        editor.set_attributes(&id, &patch).unwrap();

        assert_eq!(dispatch(&mut editor, "addBullets"), DispatchOutcome::Applied);
        assert_eq!(active_text(&editor).text, "• Rust\n• Go");
        assert_eq!(dispatch(&mut editor, "add-bullets"), DispatchOutcome::Unchanged);
    }

    #[test]
    fn test_shape_fill_rejects_text() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let err = editor.dispatch("shapeFill", Some(&json!("#00ff00"))).unwrap_err();
        assert!(matches!(
            err,
            EngineError::WrongSelectionType { expected: "shape", found: Some(ObjectKind::Text) }
        ));

        dispatch(&mut editor, "add-circle");
        editor.dispatch("shapeFill", Some(&json!("#00ff00"))).unwrap();
        assert_eq!(
            editor.active_object().unwrap().common().fill.as_deref(),
            Some("#00ff00")
        );
    }

    #[test]
    fn test_delete_without_selection_is_noop() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        editor.deselect();
        let len = editor.history().undo_len();
        assert_eq!(dispatch(&mut editor, "delete"), DispatchOutcome::Unchanged);
        assert_eq!(editor.history().undo_len(), len);
        assert_eq!(editor.document().len(), 1);

        editor.select_at(Point::new(150.0, 105.0)).unwrap();
        assert_eq!(dispatch(&mut editor, "deleteObject"), DispatchOutcome::Applied);
        assert!(editor.document().is_empty());
        assert!(editor.active_object().is_none());
    }

    #[test]
    fn test_reorder_at_boundary_is_noop() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        dispatch(&mut editor, "add-rectangle");
        let len = editor.history().undo_len();
        assert_eq!(dispatch(&mut editor, "bring-forward"), DispatchOutcome::Unchanged);
        assert_eq!(editor.history().undo_len(), len);

        assert_eq!(dispatch(&mut editor, "sendBackward"), DispatchOutcome::Applied);
        assert_eq!(dispatch(&mut editor, "send-backward"), DispatchOutcome::Unchanged);
    }

    #[test]
    fn test_clear() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        dispatch(&mut editor, "add-circle");
        assert_eq!(dispatch(&mut editor, "clear"), DispatchOutcome::Applied);
        assert!(editor.document().is_empty());
        assert_eq!(dispatch(&mut editor, "clear"), DispatchOutcome::Unchanged);
        assert!(editor.undo().unwrap());
        assert_eq!(editor.document().len(), 2);
    }

    #[test]
    fn test_copy_paste_regenerates_id() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        dispatch(&mut editor, "bold");
        let source = editor.active_object().unwrap().clone();

        assert_eq!(dispatch(&mut editor, "copy"), DispatchOutcome::Unchanged);
        assert_eq!(dispatch(&mut editor, "paste"), DispatchOutcome::Applied);
        let first = editor.active_object().unwrap().clone();
        assert_ne!(first.id(), source.id());
        assert_eq!(first.as_text().unwrap().text, source.as_text().unwrap().text);
        assert_eq!(first.as_text().unwrap().font_weight, FontWeight::Bold);
        assert_eq!(first.common().left, source.common().left + 20.0);

        assert!(!editor.clipboard().is_empty());
        assert_eq!(dispatch(&mut editor, "paste"), DispatchOutcome::Applied);
        let second = editor.active_object().unwrap().clone();
        assert_ne!(second.id(), first.id());
        assert_eq!(second.common().top, source.common().top + 40.0);
        assert_eq!(editor.document().len(), 3);
    }

    #[test]
    fn test_paste_with_empty_clipboard() {
        let mut editor = editor();
        assert_eq!(dispatch(&mut editor, "paste"), DispatchOutcome::Unchanged);
        assert_eq!(editor.history().undo_len(), 1);
    }

    #[test]
    fn test_cut() {
        let mut editor = editor();
        dispatch(&mut editor, "add-circle");
        let id = editor.active_object().unwrap().id().clone();
        assert_eq!(dispatch(&mut editor, "cut"), DispatchOutcome::Applied);
        assert!(editor.document().is_empty());
        assert!(editor.selection().active_id().is_none());
        assert_eq!(editor.clipboard().peek().unwrap().id(), &id);

        dispatch(&mut editor, "paste");
        assert_eq!(editor.document().len(), 1);
        assert_ne!(editor.document().objects()[0].id(), &id);
    }

    #[test]
    fn test_unknown_action_ignored() {
        let mut editor = editor();
        assert_eq!(
            editor.dispatch("sparkle", Some(&json!({"x": 1}))).unwrap(),
            DispatchOutcome::Ignored
        );
        assert_eq!(editor.history().undo_len(), 1);
    }

    #[test]
    fn test_malformed_raw_leaves_document() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let before = editor.snapshot();
        let len = editor.history().undo_len();

        let err = editor.apply_raw(r#"{"objects": "not-a-list"}"#).unwrap_err();
        assert!(matches!(err, EngineError::MalformedSnapshot(_)));
        assert_eq!(editor.snapshot(), before);
        assert_eq!(editor.history().undo_len(), len);
    }

    #[test]
    fn test_apply_raw_records_entry() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let raw = r##"{"version": "5.2.4", "background": "#fff", "objects": [{"type": "rect", "id": "r1", "width": 10, "height": 10}]}"##;
        assert_eq!(editor.apply_raw(raw).unwrap(), DispatchOutcome::Applied);
        assert_eq!(editor.document().len(), 1);
        assert!(editor.document().decoration(&ObjectId::from("r1")).is_some());
        assert_eq!(editor.history().undo_len(), 3);

        assert!(editor.undo().unwrap());
        assert_eq!(active_kind(&editor, 0), ObjectKind::Text);
    }

    fn active_kind(editor: &Editor, index: usize) -> ObjectKind {
        editor.document().objects()[index].kind()
    }

    #[test]
    fn test_round_trip_through_editor() {
        let mut editor = editor();
        for name in ["add-text", "bold", "add-line", "add-circle"] {
            dispatch(&mut editor, name);
        }
        let snapshot = editor.snapshot();
        let reloaded = Editor::with_snapshot(&Snapshot::from_raw(&snapshot.to_raw()).unwrap(), EditorConfig::default());
        assert_eq!(reloaded.snapshot(), snapshot);
        assert_eq!(reloaded.history().undo_len(), 1);
    }

    #[test]
    fn test_add_image_waits_for_asset() {
        let mut editor = editor();
        let outcome = editor.dispatch("addImage", Some(&json!("me.png"))).unwrap();
        let DispatchOutcome::Pending(request) = outcome else {
            panic!("expected pending request");
        };
        assert!(editor.document().is_empty());
        assert_eq!(editor.busy(), Some(BusyState::ResolvingAsset(request.id)));
        assert_eq!(editor.history().undo_len(), 1);

        let asset = ResolvedAsset {
            src: request.src.clone(),
            width: 400,
            height: 400,
        };
        assert_eq!(editor.complete_asset(request.id, Ok(asset)).unwrap(), DispatchOutcome::Applied);
        assert!(!editor.is_busy());

        let SceneObject::Image(image) = editor.active_object().unwrap() else {
            panic!("expected image");
        };
        assert_eq!(image.common.scale_x, 0.5);
        assert_eq!(image.width, 400.0);
        assert_eq!(editor.history().undo_len(), 2);
    }

    #[test]
    fn test_failed_asset_is_abandoned() {
        let mut editor = editor();
        let resolver = MemoryAssetResolver::new();
        let err = block_on(editor.add_image("missing.png", &resolver)).unwrap_err();
        assert!(matches!(err, EngineError::AssetUnavailable(_)));
        assert!(editor.document().is_empty());
        assert!(!editor.is_busy());
        assert_eq!(editor.history().undo_len(), 1);
    }

    #[test]
    fn test_add_image_with_resolver() {
        let mut editor = editor();
        let resolver = MemoryAssetResolver::new().with_asset("me.png", 120, 80);
        let outcome = block_on(editor.add_image("me.png", &resolver)).unwrap();
        assert_eq!(outcome, DispatchOutcome::Applied);
        assert_eq!(editor.document().len(), 1);
    }

    #[test]
    fn test_busy_rejects_mutations() {
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let DispatchOutcome::Pending(request) = editor
            .dispatch("add-image", Some(&json!({"src": "me.png"})))
            .unwrap()
        else {
            panic!("expected pending request");
        };

        for name in ["clear", "undo", "bold", "add-circle", "paste"] {
            assert!(
                matches!(editor.dispatch(name, None), Err(EngineError::Busy(_))),
                "{name}"
            );
        }
        assert_eq!(dispatch(&mut editor, "copy"), DispatchOutcome::Unchanged);
        assert!(!editor.clipboard().is_empty());
        assert!(matches!(editor.apply_raw(r#"{"objects": []}"#), Err(EngineError::Busy(_))));
        assert!(matches!(editor.begin_load(), Err(EngineError::Busy(_))));
        assert_eq!(editor.document().len(), 1);

        assert!(matches!(
            editor.complete_asset(request.id + 1, Err(EngineError::AssetUnavailable("x".into()))),
            Err(EngineError::UnknownRequest(_))
        ));
        assert!(editor.complete_asset(request.id, Err(EngineError::AssetUnavailable("x".into()))).is_err());
        assert_eq!(dispatch(&mut editor, "clear"), DispatchOutcome::Applied);
    }

    #[test]
    fn test_set_attributes_records() {
        let mut editor = editor();
        dispatch(&mut editor, "add-rectangle");
        let id = editor.active_object().unwrap().id().clone();
        let patch = json!({"left": 250, "angle": 15}).as_object().cloned().unwrap();
        assert_eq!(editor.set_attributes(&id, &patch).unwrap(), DispatchOutcome::Applied);
        assert_eq!(editor.active_object().unwrap().common().left, 250.0);

        let missing = ObjectId::from("missing");
        assert!(matches!(
            editor.set_attributes(&missing, &patch),
            Err(EngineError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_commit_after_direct_edit() {
        let mut editor = editor();
        dispatch(&mut editor, "add-circle");
        let id = editor.active_object().unwrap().id().clone();
        editor
            .document_mut()
            .get_object_mut(&id)
            .unwrap()
            .translate(kurbo::Vec2::new(5.0, 5.0));
        assert_eq!(editor.commit().unwrap(), DispatchOutcome::Applied);
        assert_eq!(editor.commit().unwrap(), DispatchOutcome::Unchanged);
    }

    #[test]
    fn test_select_missing_object() {
        let mut editor = editor();
        assert!(matches!(
            editor.select(&ObjectId::from("ghost")),
            Err(EngineError::ObjectNotFound(_))
        ));
        assert!(editor.select_at(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_history_limit_from_config() {
        let config = EditorConfig {
            history_limit: 3,
            ..EditorConfig::default()
        };
        let mut editor = Editor::new(config);
        for _ in 0..5 {
            dispatch(&mut editor, "add-circle");
        }
        assert_eq!(editor.history().undo_len(), 3);
        assert!(editor.undo().unwrap());
        assert!(editor.undo().unwrap());
        assert!(!editor.undo().unwrap());
        assert_eq!(editor.document().len(), 3);
    }

    fn bridge() -> (Arc<MemoryTemplateStore>, SyncBridge) {
        let store = Arc::new(MemoryTemplateStore::new());
        let bridge = SyncBridge::new(store.clone()).with_auth(AuthToken::new("alice"));
        (store, bridge)
    }

    #[test]
    fn test_save_then_reopen() {
        let (_, bridge) = bridge();
        let mut editor = editor();
        editor.set_title("Backend CV");
        dispatch(&mut editor, "add-text");

        let id = block_on(editor.save(&bridge, None)).unwrap();
        assert_eq!(editor.template().id.as_ref(), Some(&id));
        dispatch(&mut editor, "add-circle");
        assert_eq!(block_on(editor.save(&bridge, None)).unwrap(), id);

        let mut reopened = Editor::default();
        block_on(reopened.open_template(&bridge, &id, Scope::Owner)).unwrap();
        assert_eq!(reopened.snapshot(), editor.snapshot());
        assert_eq!(reopened.template().title, "Backend CV");
        assert_eq!(reopened.history().undo_len(), 1);
        assert!(!reopened.is_busy());
    }

    #[test]
    fn test_failed_load_keeps_document() {
        let (_, bridge) = bridge();
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        let before = editor.snapshot();

        let result = block_on(editor.open_template(&bridge, &TemplateId::from("nope"), Scope::Public));
        assert!(matches!(result, Err(EngineError::TemplateNotFound(_))));
        assert_eq!(editor.snapshot(), before);
        assert_eq!(editor.history().undo_len(), 2);
        assert!(!editor.is_busy());
    }

    #[test]
    fn test_failed_save_keeps_history() {
        let (store, bridge) = bridge();
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        store.set_offline(true);

        let result = block_on(editor.save(&bridge, None));
        assert!(matches!(result, Err(EngineError::StoreUnavailable(_))));
        assert_eq!(editor.document().len(), 1);
        assert_eq!(editor.history().undo_len(), 2);
        assert!(editor.template().id.is_none());
        assert!(!editor.is_busy());
    }

    #[test]
    fn test_save_without_sign_in() {
        let store = Arc::new(MemoryTemplateStore::new());
        let bridge = SyncBridge::new(store);
        let mut editor = editor();
        let result = block_on(editor.save(&bridge, None));
        assert!(matches!(result, Err(EngineError::AuthRequired)));
        assert!(!editor.is_busy());
    }

    #[test]
    fn test_publish_removes_personal_copy() {
        let (store, bridge) = bridge();
        let mut editor = editor();
        dispatch(&mut editor, "add-text");
        block_on(editor.save(&bridge, None)).unwrap();
        assert_eq!(store.count(Scope::Owner), 1);

        let public = block_on(editor.publish(&bridge, Some(vec![0xFF, 0xD8, 0xFF, 0xE0]))).unwrap();
        assert_eq!(store.count(Scope::Owner), 0);
        assert_eq!(store.count(Scope::Public), 1);
        assert_eq!(editor.template().scope, Scope::Public);

        let record = block_on(store.get(Scope::Public, &public, None)).unwrap();
        assert!(record.thumbnail.unwrap().starts_with("data:image/jpeg;base64,"));

        // Saving a published document creates a fresh personal copy.
        let personal = block_on(editor.save(&bridge, None)).unwrap();
        assert_ne!(personal, public);
        assert_eq!(store.count(Scope::Owner), 1);
    }

    #[test]
    fn test_load_ticket_api() {
        let mut editor = editor();
        editor.begin_load().unwrap();
        assert!(matches!(editor.dispatch("add-text", None), Err(EngineError::Busy(BusyState::Loading))));

        let snapshot = Snapshot::from_raw(r#"{"objects": [{"type": "circle", "id": "c", "radius": 4}]}"#).unwrap();
        editor
            .finish_load(Ok(LoadedTemplate {
                info: TemplateInfo::default(),
                snapshot,
            }))
            .unwrap();
        assert_eq!(editor.document().len(), 1);
        assert_eq!(editor.history().undo_len(), 1);
        assert!(!editor.is_busy());
    }
}
