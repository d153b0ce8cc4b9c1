//! File-based template store.

use super::{
    AuthToken, BoxFuture, Scope, StoreError, StoreResult, TemplateDraft, TemplateId,
    TemplateRecord, TemplateStore, require_user,
};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores templates as JSON files, one directory per scope.
///
/// Layout: `<base>/personal/<id>.json` and `<base>/public/<id>.json`.
/// The token string is the caller's identity.
pub struct FileTemplateStore {
    base_path: PathBuf,
}

impl FileTemplateStore {
    /// Create a store rooted at `base_path`, creating the scope directories.
    pub fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();
        for scope in [Scope::Owner, Scope::Public] {
            let dir = base_path.join(scope.dir_name());
            fs::create_dir_all(&dir).map_err(|e| {
                StoreError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a store in the default location.
    ///
    /// On Unix: `~/.local/share/vitae/templates/`
    /// On Windows: `%LOCALAPPDATA%\vitae\templates\`
    pub fn default_location() -> StoreResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StoreError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("vitae").join("templates"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn template_path(&self, scope: Scope, id: &TemplateId) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path
            .join(scope.dir_name())
            .join(format!("{safe_id}.json"))
    }
}

fn read_record(path: &Path, id: &TemplateId) -> StoreResult<TemplateRecord> {
    if !path.exists() {
        return Err(StoreError::NotFound(id.to_string()));
    }
    let json = fs::read_to_string(path)
        .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        StoreError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn write_record(path: &Path, record: &TemplateRecord) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    fs::write(path, json)
        .map_err(|e| StoreError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

impl TemplateStore for FileTemplateStore {
    fn get(&self, scope: Scope, id: &TemplateId, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let path = self.template_path(scope, id);
        let id = id.clone();
        let user = auth.map(|token| token.as_str().to_string());
        Box::pin(async move {
            let record = match (scope, user) {
                (Scope::Public, _) => read_record(&path, &id)?,
                (Scope::Owner, None) => return Err(StoreError::AuthRequired),
                (Scope::Owner, Some(user)) => {
                    let record = read_record(&path, &id)?;
                    if !record.is_owned_by(Scope::Owner, &user) {
                        return Err(StoreError::NotFound(id.to_string()));
                    }
                    record
                }
            };
            Ok(record)
        })
    }

    fn list(&self, scope: Scope, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<Vec<TemplateRecord>>> {
        let dir = self.base_path.join(scope.dir_name());
        let user = auth.map(|token| token.as_str().to_string());
        Box::pin(async move {
            if scope == Scope::Owner && user.is_none() {
                return Err(StoreError::AuthRequired);
            }
            let entries = fs::read_dir(&dir)
                .map_err(|e| StoreError::Io(format!("Failed to read directory: {e}")))?;

            let mut records = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                // Only include .json files
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                let json = match fs::read_to_string(&path) {
                    Ok(json) => json,
                    Err(e) => {
                        log::warn!("Skipping unreadable template {}: {}", path.display(), e);
                        continue;
                    }
                };
                match serde_json::from_str::<TemplateRecord>(&json) {
                    Ok(record) => {
                        let visible = match (&user, scope) {
                            (Some(user), Scope::Owner) => record.is_owned_by(Scope::Owner, user),
                            _ => true,
                        };
                        if visible {
                            records.push(record);
                        }
                    }
                    Err(e) => log::warn!("Skipping corrupt template {}: {}", path.display(), e),
                }
            }
            records.sort_by(|a, b| a.title.cmp(&b.title));
            Ok(records)
        })
    }

    fn create(&self, scope: Scope, draft: TemplateDraft, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let user = require_user(auth);
        Box::pin(async move {
            let user = user?;
            let id = TemplateId::new(Uuid::new_v4().simple().to_string());
            let record = TemplateRecord::from_draft(id.clone(), scope, draft, Some(&user));
            write_record(&self.template_path(scope, &id), &record)?;
            Ok(record)
        })
    }

    fn update(&self, id: &TemplateId, draft: TemplateDraft, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let path = self.template_path(Scope::Owner, id);
        let id = id.clone();
        let user = auth.as_str().to_string();
        Box::pin(async move {
            let mut record = read_record(&path, &id)?;
            if !record.is_owned_by(Scope::Owner, &user) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            record.apply_draft(draft);
            write_record(&path, &record)?;
            Ok(record)
        })
    }

    fn delete(&self, id: &TemplateId, auth: &AuthToken) -> BoxFuture<'_, StoreResult<()>> {
        let path = self.template_path(Scope::Owner, id);
        let id = id.clone();
        let user = auth.as_str().to_string();
        Box::pin(async move {
            let record = read_record(&path, &id)?;
            if !record.is_owned_by(Scope::Owner, &user) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            fs::remove_file(&path)
                .map_err(|e| StoreError::Io(format!("Failed to delete {}: {}", path.display(), e)))
        })
    }

    fn rate(&self, id: &TemplateId, rating: u8, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let path = self.template_path(Scope::Public, id);
        let id = id.clone();
        let user = auth.as_str().to_string();
        Box::pin(async move {
            let mut record = read_record(&path, &id)?;
            record.upsert_rating(&user, rating);
            write_record(&path, &record)?;
            Ok(record)
        })
    }
}
