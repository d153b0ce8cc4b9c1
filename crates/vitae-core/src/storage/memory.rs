//! In-memory template store.

use super::{
    AuthToken, BoxFuture, Scope, StoreError, StoreResult, TemplateDraft, TemplateId,
    TemplateRecord, TemplateStore, require_user,
};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// In-memory template store for testing and offline use.
///
/// The token string is the caller's identity.
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<(Scope, TemplateId), TemplateRecord>>,
    offline: AtomicBool,
}

impl MemoryTemplateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a network outage: every call fails with `Unavailable` while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of templates in a scope.
    pub fn count(&self, scope: Scope) -> usize {
        self.templates
            .read()
            .map(|templates| templates.keys().filter(|(s, _)| *s == scope).count())
            .unwrap_or(0)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("Lock error: {e}"))
}

impl TemplateStore for MemoryTemplateStore {
    fn get(&self, scope: Scope, id: &TemplateId, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let id = id.clone();
        let user = auth.map(|token| token.as_str().to_string());
        Box::pin(async move {
            self.check_online()?;
            if scope == Scope::Owner && user.is_none() {
                return Err(StoreError::AuthRequired);
            }
            let templates = self.templates.read().map_err(lock_error)?;
            let record = templates
                .get(&(scope, id.clone()))
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if scope == Scope::Owner && !record.is_owned_by(scope, user.as_deref().unwrap_or_default()) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(record.clone())
        })
    }

    fn list(&self, scope: Scope, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<Vec<TemplateRecord>>> {
        let user = auth.map(|token| token.as_str().to_string());
        Box::pin(async move {
            self.check_online()?;
            let templates = self.templates.read().map_err(lock_error)?;
            let mut records: Vec<TemplateRecord> = match scope {
                Scope::Public => templates
                    .iter()
                    .filter(|((s, _), _)| *s == Scope::Public)
                    .map(|(_, record)| record.clone())
                    .collect(),
                Scope::Owner => {
                    let user = user.ok_or(StoreError::AuthRequired)?;
                    templates
                        .iter()
                        .filter(|((s, _), record)| *s == Scope::Owner && record.is_owned_by(Scope::Owner, &user))
                        .map(|(_, record)| record.clone())
                        .collect()
                }
            };
            records.sort_by(|a, b| a.title.cmp(&b.title));
            Ok(records)
        })
    }

    fn create(&self, scope: Scope, draft: TemplateDraft, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let user = require_user(auth);
        Box::pin(async move {
            self.check_online()?;
            let user = user?;
            let id = TemplateId::new(Uuid::new_v4().simple().to_string());
            let record = TemplateRecord::from_draft(id.clone(), scope, draft, Some(&user));
            let mut templates = self.templates.write().map_err(lock_error)?;
            templates.insert((scope, id), record.clone());
            Ok(record)
        })
    }

    fn update(&self, id: &TemplateId, draft: TemplateDraft, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let id = id.clone();
        let user = auth.as_str().to_string();
        Box::pin(async move {
            self.check_online()?;
            let mut templates = self.templates.write().map_err(lock_error)?;
            let record = templates
                .get_mut(&(Scope::Owner, id.clone()))
                .filter(|record| record.is_owned_by(Scope::Owner, &user))
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            record.apply_draft(draft);
            Ok(record.clone())
        })
    }

    fn delete(&self, id: &TemplateId, auth: &AuthToken) -> BoxFuture<'_, StoreResult<()>> {
        let id = id.clone();
        let user = auth.as_str().to_string();
        Box::pin(async move {
            self.check_online()?;
            let mut templates = self.templates.write().map_err(lock_error)?;
            let key = (Scope::Owner, id.clone());
            let owned = templates
                .get(&key)
                .is_some_and(|record| record.is_owned_by(Scope::Owner, &user));
            if !owned {
                return Err(StoreError::NotFound(id.to_string()));
            }
            templates.remove(&key);
            Ok(())
        })
    }

    fn rate(&self, id: &TemplateId, rating: u8, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let id = id.clone();
        let user = auth.as_str().to_string();
        Box::pin(async move {
            self.check_online()?;
            let mut templates = self.templates.write().map_err(lock_error)?;
            let record = templates
                .get_mut(&(Scope::Public, id.clone()))
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            record.upsert_rating(&user, rating);
            Ok(record.clone())
        })
    }
}
