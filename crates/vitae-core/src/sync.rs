//! Bridge between the editing engine and a template store.
//!
//! This is the only place the engine talks to storage. The bridge holds the
//! store and the caller's token; the editor itself holds no network state.

use crate::error::{EngineError, EngineResult};
use crate::shapes::ImageFormat;
use crate::snapshot::Snapshot;
use crate::storage::{AuthToken, Scope, TemplateDraft, TemplateId, TemplateRecord, TemplateStore};
use serde_json::Value;
use std::sync::Arc;

/// Everything needed to persist the current document.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub title: String,
    pub snapshot: Snapshot,
    /// Rendered preview (PNG, JPEG or WebP bytes).
    pub thumbnail_bytes: Option<Vec<u8>>,
}

impl PushRequest {
    pub fn new(title: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            title: title.into(),
            snapshot,
            thumbnail_bytes: None,
        }
    }

    pub fn with_thumbnail(mut self, bytes: Vec<u8>) -> Self {
        self.thumbnail_bytes = Some(bytes);
        self
    }

    fn into_draft(self) -> TemplateDraft {
        let thumbnail = self.thumbnail_bytes.as_deref().map(thumbnail_url);
        let mut draft = TemplateDraft::new(self.title, self.snapshot.to_value());
        draft.thumbnail = thumbnail;
        draft
    }
}

/// Encode thumbnail bytes as a data URL, sniffing the format and falling back to PNG.
fn thumbnail_url(bytes: &[u8]) -> String {
    ImageFormat::from_magic_bytes(bytes)
        .unwrap_or(ImageFormat::Png)
        .data_url(bytes)
}

/// Thin pass-through from the editor to a [`TemplateStore`].
#[derive(Clone)]
pub struct SyncBridge {
    store: Arc<dyn TemplateStore>,
    auth: Option<AuthToken>,
}

impl SyncBridge {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store, auth: None }
    }

    pub fn with_auth(mut self, token: AuthToken) -> Self {
        self.auth = Some(token);
        self
    }

    pub fn set_auth(&mut self, token: Option<AuthToken>) {
        self.auth = token;
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.is_some()
    }

    fn require_auth(&self) -> EngineResult<&AuthToken> {
        self.auth.as_ref().ok_or(EngineError::AuthRequired)
    }

    /// Fetch a template record.
    pub async fn fetch(&self, id: &TemplateId, scope: Scope) -> EngineResult<TemplateRecord> {
        if scope == Scope::Owner {
            self.require_auth()?;
        }
        let record = self.store.get(scope, id, self.auth.as_ref()).await?;
        log::info!("Fetched {scope} template {id}");
        Ok(record)
    }

    /// Fetch a template and validate its document.
    pub async fn pull(&self, id: &TemplateId, scope: Scope) -> EngineResult<Snapshot> {
        let record = self.fetch(id, scope).await?;
        snapshot_of(&record)
    }

    /// Save to the owner scope: create when `id` is `None`, update otherwise.
    pub async fn push(&self, id: Option<&TemplateId>, request: PushRequest) -> EngineResult<TemplateId> {
        let auth = self.require_auth()?;
        let draft = request.into_draft();
        let record = match id {
            Some(id) => self.store.update(id, draft, auth).await?,
            None => self.store.create(Scope::Owner, draft, Some(auth)).await?,
        };
        log::info!("Saved template {} ('{}')", record.id, record.title);
        Ok(record.id)
    }

    /// Create a public copy of the document.
    pub async fn publish(&self, request: PushRequest) -> EngineResult<TemplateId> {
        let auth = self.require_auth()?;
        let record = self
            .store
            .create(Scope::Public, request.into_draft(), Some(auth))
            .await?;
        log::info!("Published template {} ('{}')", record.id, record.title);
        Ok(record.id)
    }

    /// Delete an owner-scope template.
    pub async fn delete(&self, id: &TemplateId) -> EngineResult<()> {
        let auth = self.require_auth()?;
        self.store.delete(id, auth).await?;
        log::info!("Deleted template {id}");
        Ok(())
    }

    pub async fn list_public(&self) -> EngineResult<Vec<TemplateRecord>> {
        Ok(self.store.list(Scope::Public, self.auth.as_ref()).await?)
    }

    /// The signed-in user's own templates.
    pub async fn list_own(&self) -> EngineResult<Vec<TemplateRecord>> {
        let auth = self.require_auth()?;
        Ok(self.store.list(Scope::Owner, Some(auth)).await?)
    }

    /// Rate a public template from 1 to 5.
    pub async fn rate(&self, id: &TemplateId, rating: u8) -> EngineResult<TemplateRecord> {
        if !(1..=5).contains(&rating) {
            return Err(EngineError::InvalidRating(rating));
        }
        let auth = self.require_auth()?;
        Ok(self.store.rate(id, rating, auth).await?)
    }
}

/// Validate a record's document. A record without one opens as an empty document.
pub fn snapshot_of(record: &TemplateRecord) -> EngineResult<Snapshot> {
    match &record.canvas_json {
        Value::Null => Ok(Snapshot::default()),
        // Some clients store the document as a JSON string.
        Value::String(raw) => Snapshot::from_raw(raw),
        value => Snapshot::from_value(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::SceneDocument;
    use crate::shapes::TextBox;
    use crate::storage::MemoryTemplateStore;
    use pollster::block_on;

    fn bridge() -> (Arc<MemoryTemplateStore>, SyncBridge) {
        let store = Arc::new(MemoryTemplateStore::new());
        let bridge = SyncBridge::new(store.clone()).with_auth(AuthToken::new("alice"));
        (store, bridge)
    }

    fn sample_snapshot() -> Snapshot {
        let mut doc = SceneDocument::new();
        doc.add_object(TextBox::new(40.0, 40.0, "Jane Doe"));
        doc.to_snapshot()
    }

    #[test]
    fn test_push_creates_then_updates() {
        let (store, bridge) = bridge();
        let snapshot = sample_snapshot();

        let id = block_on(bridge.push(None, PushRequest::new("CV", snapshot.clone()))).unwrap();
        let again = block_on(bridge.push(Some(&id), PushRequest::new("CV 2", snapshot.clone()))).unwrap();
        assert_eq!(id, again);
        assert_eq!(store.count(Scope::Owner), 1);

        let pulled = block_on(bridge.pull(&id, Scope::Owner)).unwrap();
        assert_eq!(pulled, snapshot);
        assert_eq!(block_on(bridge.fetch(&id, Scope::Owner)).unwrap().title, "CV 2");
    }

    #[test]
    fn test_thumbnail_becomes_data_url() {
        let (_, bridge) = bridge();
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0, 0, 0, 0];
        let id = block_on(bridge.push(None, PushRequest::new("CV", sample_snapshot()).with_thumbnail(png)))
            .unwrap();
        let record = block_on(bridge.fetch(&id, Scope::Owner)).unwrap();
        assert!(record.thumbnail.unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_owner_calls_need_auth() {
        let store = Arc::new(MemoryTemplateStore::new());
        let bridge = SyncBridge::new(store);
        assert!(!bridge.is_signed_in());
        assert!(matches!(
            block_on(bridge.push(None, PushRequest::new("CV", sample_snapshot()))),
            Err(EngineError::AuthRequired)
        ));
        assert!(matches!(
            block_on(bridge.pull(&TemplateId::from("x"), Scope::Owner)),
            Err(EngineError::AuthRequired)
        ));
        assert!(block_on(bridge.list_public()).unwrap().is_empty());
    }

    #[test]
    fn test_publish_and_rate() {
        let (_, bridge) = bridge();
        let id = block_on(bridge.publish(PushRequest::new("Public CV", sample_snapshot()))).unwrap();
        assert_eq!(block_on(bridge.list_public()).unwrap().len(), 1);

        assert!(matches!(
            block_on(bridge.rate(&id, 0)),
            Err(EngineError::InvalidRating(0))
        ));
        assert!(matches!(
            block_on(bridge.rate(&id, 6)),
            Err(EngineError::InvalidRating(6))
        ));
        let record = block_on(bridge.rate(&id, 5)).unwrap();
        assert_eq!(record.average_rating(), Some(5.0));
    }

    #[test]
    fn test_missing_template() {
        let (_, bridge) = bridge();
        assert!(matches!(
            block_on(bridge.pull(&TemplateId::from("missing"), Scope::Public)),
            Err(EngineError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_store_outage() {
        let (store, bridge) = bridge();
        store.set_offline(true);
        assert!(matches!(
            block_on(bridge.list_own()),
            Err(EngineError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_snapshot_of_record_variants() {
        let mut record = TemplateRecord::from_draft(
            TemplateId::from("t"),
            Scope::Public,
            TemplateDraft::new("t", Value::Null),
            None,
        );
        assert_eq!(snapshot_of(&record).unwrap(), Snapshot::default());

        record.canvas_json = Value::String(sample_snapshot().to_raw());
        assert_eq!(snapshot_of(&record).unwrap().len(), 1);

        record.canvas_json = serde_json::json!({"objects": 3});
        assert!(matches!(
            snapshot_of(&record),
            Err(EngineError::MalformedSnapshot(_))
        ));
    }
}
