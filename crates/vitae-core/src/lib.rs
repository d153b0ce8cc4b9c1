//! Vitae Core Library
//!
//! Platform-agnostic editing engine for resume templates: the scene model,
//! selection and clipboard, the action dispatcher, undo/redo history, and the
//! bridge to the template store.

pub mod actions;
pub mod assets;
pub mod canvas;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod selection;
pub mod shapes;
pub mod shortcuts;
pub mod snapshot;
pub mod storage;
pub mod sync;
pub mod widget;

pub use actions::Action;
pub use assets::{AssetResolver, HttpAssetResolver, LocalAssetResolver, MemoryAssetResolver, ResolvedAsset};
pub use canvas::{Reorder, SceneDocument};
pub use config::{ConfigError, EditorConfig};
pub use editor::{AssetRequest, BusyState, DispatchOutcome, Editor, TemplateInfo};
pub use error::{EngineError, EngineResult};
pub use history::History;
pub use selection::{Clipboard, Selection};
pub use shapes::{ObjectId, ObjectKind, SceneObject};
pub use shortcuts::{Modifiers, action_for_key};
pub use snapshot::Snapshot;
pub use storage::{AuthToken, Scope, TemplateId, TemplateRecord, TemplateStore};
pub use sync::{PushRequest, SyncBridge};
pub use widget::{Decoration, DecorationManager};
