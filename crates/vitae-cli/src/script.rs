//! Edit scripts: a JSON list of steps replayed against an editor.
//!
//! ```json
//! [
//!   { "op": "dispatch", "action": "add-text" },
//!   { "op": "set", "attrs": { "text": "Jane Doe", "fontSize": 28 } },
//!   { "op": "dispatch", "action": "bold" },
//!   { "op": "select", "index": 0 },
//!   { "op": "dispatch", "action": "shape-fill", "payload": "#204060" }
//! ]
//! ```

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::{Map, Value};
use vitae_core::storage::BoxFuture;
use vitae_core::{
    AssetResolver, DispatchOutcome, Editor, EngineResult, HttpAssetResolver, LocalAssetResolver, ObjectId,
    ResolvedAsset,
};

/// One scripted edit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Dispatch {
        action: String,
        #[serde(default)]
        payload: Option<Value>,
    },
    /// Select by id, or by stacking index (0 is the bottom).
    Select {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },
    Deselect,
    /// Patch attributes of `id`, or of the active object.
    Set {
        #[serde(default)]
        id: Option<String>,
        attrs: Map<String, Value>,
    },
    /// Replace the document, as with the raw-edit view.
    Raw { snapshot: Value },
}

/// Parse a script file's contents.
pub fn parse(json: &str) -> Result<Vec<Step>> {
    serde_json::from_str(json).context("invalid script")
}

/// Resolves `http(s)` sources over the network and everything else locally.
#[derive(Debug, Clone, Default)]
pub struct CliResolver {
    local: LocalAssetResolver,
    http: HttpAssetResolver,
}

impl AssetResolver for CliResolver {
    fn resolve(&self, src: &str) -> BoxFuture<'_, EngineResult<ResolvedAsset>> {
        if src.starts_with("http://") || src.starts_with("https://") {
            self.http.resolve(src)
        } else {
            self.local.resolve(src)
        }
    }
}

/// Run every step in order, stopping at the first failure.
///
/// Returns one line per step describing what happened.
pub async fn run(editor: &mut Editor, steps: &[Step], resolver: &dyn AssetResolver) -> Result<Vec<String>> {
    let mut report = Vec::with_capacity(steps.len());
    for (n, step) in steps.iter().enumerate() {
        let line = run_step(editor, step, resolver)
            .await
            .with_context(|| format!("step {} failed", n + 1))?;
        log::debug!("step {}: {line}", n + 1);
        report.push(line);
    }
    Ok(report)
}

async fn run_step(editor: &mut Editor, step: &Step, resolver: &dyn AssetResolver) -> Result<String> {
    match step {
        Step::Dispatch { action, payload } => {
            let outcome = match editor.dispatch(action, payload.as_ref())? {
                DispatchOutcome::Pending(request) => {
                    let asset = resolver.resolve(&request.src).await;
                    editor.complete_asset(request.id, asset)?
                }
                outcome => outcome,
            };
            Ok(format!("{action}: {}", describe(&outcome)))
        }
        Step::Select { id, index } => {
            let id = match (id, index) {
                (Some(id), _) => ObjectId::from(id.as_str()),
                (None, Some(index)) => editor
                    .document()
                    .objects()
                    .get(*index)
                    .map(|object| object.id().clone())
                    .ok_or_else(|| anyhow!("no object at index {index}"))?,
                (None, None) => bail!("select needs an id or an index"),
            };
            editor.select(&id)?;
            Ok(format!("select: {id}"))
        }
        Step::Deselect => {
            editor.deselect();
            Ok("deselect".to_string())
        }
        Step::Set { id, attrs } => {
            let id = match id {
                Some(id) => ObjectId::from(id.as_str()),
                None => editor
                    .selection()
                    .active_id()
                    .cloned()
                    .ok_or_else(|| anyhow!("set without an id needs an active object"))?,
            };
            let outcome = editor.set_attributes(&id, attrs)?;
            Ok(format!("set {id}: {}", describe(&outcome)))
        }
        Step::Raw { snapshot } => {
            let raw = match snapshot {
                Value::String(raw) => raw.clone(),
                value => value.to_string(),
            };
            editor.apply_raw(&raw)?;
            Ok(format!("raw: {} objects", editor.document().len()))
        }
    }
}

fn describe(outcome: &DispatchOutcome) -> &'static str {
    match outcome {
        DispatchOutcome::Applied => "applied",
        DispatchOutcome::Unchanged => "unchanged",
        DispatchOutcome::Ignored => "ignored (unknown action)",
        DispatchOutcome::Pending(_) => "pending",
    }
}
