//! Template store abstraction.
//!
//! A template store is the remote document service that keeps saved resumes.
//! The engine only talks to it through the [`SyncBridge`](crate::sync::SyncBridge).

mod file;
mod http;
mod memory;

pub use file::FileTemplateStore;
pub use http::HttpTemplateStore;
pub use memory::MemoryTemplateStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use thiserror::Error;

/// Template store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Template not found: {0}")]
    NotFound(String),
    #[error("Authentication required")]
    AuthRequired,
    #[error("Store unreachable: {0}")]
    Unavailable(String),
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Visibility of a persisted template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Private to its creator.
    Owner,
    /// Publicly listed.
    Public,
}

impl Scope {
    /// Route segment used by the template service.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Scope::Owner => "personal-template",
            Scope::Public => "public-template",
        }
    }

    /// Directory name used by on-disk stores.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Scope::Owner => "personal",
            Scope::Public => "public",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Owner => "owner",
            Scope::Public => "public",
        })
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "owner" | "personal" | "private" => Ok(Scope::Owner),
            "public" => Ok(Scope::Public),
            other => Err(format!("unknown scope '{other}' (expected owner or public)")),
        }
    }
}

/// Identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Bearer token proving a user identity.
///
/// Opaque to the engine: it is forwarded verbatim and never parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// One user's rating of a public template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: String,
    pub rating: u8,
}

/// A template as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: TemplateId,
    pub title: String,
    /// Serialized document; validated by the bridge, not the store.
    #[serde(default)]
    pub canvas_json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ratings: Vec<Rating>,
    /// Owner of a personal template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
}

impl TemplateRecord {
    /// Mean rating, if anyone rated.
    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.iter().map(|r| r.rating as u32).sum();
        Some(total as f64 / self.ratings.len() as f64)
    }

    /// Insert or replace `user`'s rating.
    pub(crate) fn upsert_rating(&mut self, user: &str, rating: u8) {
        match self.ratings.iter_mut().find(|r| r.user_id == user) {
            Some(existing) => existing.rating = rating,
            None => self.ratings.push(Rating {
                user_id: user.to_string(),
                rating,
            }),
        }
    }

    /// Build a record from a draft, owned according to `scope`.
    pub(crate) fn from_draft(id: TemplateId, scope: Scope, draft: TemplateDraft, user: Option<&str>) -> Self {
        let user = user.map(str::to_string);
        let (user_id, creator_id) = match scope {
            Scope::Owner => (user, None),
            Scope::Public => (None, user),
        };
        Self {
            id,
            title: draft.title,
            canvas_json: draft.canvas_json,
            thumbnail: draft.thumbnail,
            fields: draft.fields,
            ratings: Vec::new(),
            user_id,
            creator_id,
            creator_name: draft.creator_name,
        }
    }

    pub(crate) fn apply_draft(&mut self, draft: TemplateDraft) {
        self.title = draft.title;
        self.canvas_json = draft.canvas_json;
        if draft.thumbnail.is_some() {
            self.thumbnail = draft.thumbnail;
        }
        if !draft.fields.is_empty() {
            self.fields = draft.fields;
        }
    }

    /// Whether `user` owns this record in `scope`.
    pub(crate) fn is_owned_by(&self, scope: Scope, user: &str) -> bool {
        match scope {
            Scope::Owner => self.user_id.as_deref() == Some(user),
            Scope::Public => self.creator_id.as_deref() == Some(user),
        }
    }
}

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub title: String,
    pub canvas_json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
}

impl TemplateDraft {
    pub fn new(title: impl Into<String>, canvas_json: Value) -> Self {
        Self {
            title: title.into(),
            canvas_json,
            thumbnail: None,
            fields: Vec::new(),
            creator_name: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

/// Identity used by local stores: the token string itself.
pub(crate) fn require_user(auth: Option<&AuthToken>) -> StoreResult<String> {
    auth.map(|token| token.as_str().to_string())
        .ok_or(StoreError::AuthRequired)
}

/// Trait for template storage backends.
///
/// Owner-scope calls and every write need a token. Public reads do not.
pub trait TemplateStore: Send + Sync {
    /// Fetch one template.
    fn get(&self, scope: Scope, id: &TemplateId, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>>;

    /// List templates. Owner scope lists the caller's own templates.
    fn list(&self, scope: Scope, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<Vec<TemplateRecord>>>;

    /// Create a template and return it with its assigned id.
    fn create(&self, scope: Scope, draft: TemplateDraft, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>>;

    /// Replace an owner-scope template.
    fn update(&self, id: &TemplateId, draft: TemplateDraft, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>>;

    /// Delete an owner-scope template.
    fn delete(&self, id: &TemplateId, auth: &AuthToken) -> BoxFuture<'_, StoreResult<()>>;

    /// Upsert the caller's rating of a public template.
    fn rate(&self, id: &TemplateId, rating: u8, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>>;
}
