//! File-backed diagram documents.
//!
//! Each diagram is one pretty-printed JSON file `<id>.json` under the storage
//! root. Documents are opaque apart from `id`, `name`, `created` and
//! `lastModified`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use assetdesk_core::DomainError;

use crate::error::{StoreError, StoreResult};

const UNTITLED: &str = "Untitled Diagram";

/// What `/api/storage/status` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatus {
    pub enabled: bool,
    pub git_backup: bool,
    pub version: String,
}

impl StorageStatus {
    pub fn new(enabled: bool, git_backup: bool) -> Self {
        Self {
            enabled,
            git_backup,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramSummary {
    pub id: String,
    pub name: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct DiagramStore {
    root: PathBuf,
}

impl DiagramStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the storage directory if needed.
    pub async fn ensure_dir(&self) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error("create storage dir", e))
    }

    /// All diagrams, most recently modified first. Unreadable files are skipped.
    pub async fn list(&self) -> StoreResult<Vec<DiagramSummary>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| io_error("read storage dir", e))?;

        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("read storage dir", e))?
        {
            let path = entry.path();
            let Some(id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
                .filter(|id| valid_id(id))
                .map(str::to_string)
            else {
                continue;
            };

            match summarize(&path, id).await {
                Ok(summary) => out.push(summary),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping unreadable diagram"),
            }
        }

        out.sort_by(|a, b| b.last_modified.cmp(&a.last_modified).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    pub async fn get(&self, id: &str) -> StoreResult<JsonValue> {
        let path = self.path_for(id)?;
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or(id, "read diagram", e))?;
        serde_json::from_slice(&raw).map_err(|e| StoreError::internal(format!("corrupt diagram {id}: {e}")))
    }

    /// Store a new diagram and return its id.
    ///
    /// The id comes from the document's `id` field, or defaults to
    /// `diagram_<unix millis>`.
    pub async fn create(&self, document: JsonValue) -> StoreResult<String> {
        let mut fields = into_object(document)?;
        let now = Utc::now();
        let id = match fields.get("id") {
            Some(JsonValue::String(id)) if !id.is_empty() => id.clone(),
            _ => format!("diagram_{}", now.timestamp_millis()),
        };
        let path = self.path_for(&id)?;

        let stamp = timestamp(now);
        fields.insert("id".to_string(), JsonValue::String(id.clone()));
        fields.insert("created".to_string(), JsonValue::String(stamp.clone()));
        fields.insert("lastModified".to_string(), JsonValue::String(stamp));

        write_document(&path, &JsonValue::Object(fields)).await?;
        tracing::info!(diagram_id = %id, "diagram created");
        Ok(id)
    }

    /// Replace (or create) the diagram stored under `id`.
    pub async fn save(&self, id: &str, document: JsonValue) -> StoreResult<()> {
        let path = self.path_for(id)?;
        let mut fields = into_object(document)?;
        fields.insert("id".to_string(), JsonValue::String(id.to_string()));
        fields.insert("lastModified".to_string(), JsonValue::String(timestamp(Utc::now())));

        write_document(&path, &JsonValue::Object(fields)).await?;
        tracing::info!(diagram_id = %id, "diagram saved");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let path = self.path_for(id)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or(id, "delete diagram", e))?;
        tracing::info!(diagram_id = %id, "diagram deleted");
        Ok(())
    }

    fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        if !valid_id(id) {
            return Err(DomainError::invalid_id(format!("diagram id '{id}'")).into());
        }
        Ok(self.root.join(format!("{id}.json")))
    }
}

/// Ids become file names, so only `[A-Za-z0-9_-]` is allowed.
fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn into_object(document: JsonValue) -> StoreResult<Map<String, JsonValue>> {
    match document {
        JsonValue::Object(fields) => Ok(fields),
        _ => Err(DomainError::invalid_input("diagram must be a JSON object").into()),
    }
}

async fn summarize(path: &Path, id: String) -> StoreResult<DiagramSummary> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| io_error("stat diagram", e))?;
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| io_error("read diagram", e))?;
    let doc: JsonValue =
        serde_json::from_slice(&raw).map_err(|e| StoreError::internal(format!("corrupt diagram {id}: {e}")))?;
    let modified = meta
        .modified()
        .map_err(|e| io_error("stat diagram", e))?;

    Ok(DiagramSummary {
        name: doc
            .get("name")
            .and_then(JsonValue::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNTITLED)
            .to_string(),
        id,
        last_modified: DateTime::<Utc>::from(modified),
        size: meta.len(),
    })
}

/// Write via a temp file + rename so readers never see a partial document.
async fn write_document(path: &Path, document: &JsonValue) -> StoreResult<()> {
    let body = serde_json::to_vec_pretty(document)
        .map_err(|e| StoreError::internal(format!("serialize diagram: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|e| io_error("write diagram", e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| io_error("write diagram", e))
}

fn io_error(operation: &str, err: std::io::Error) -> StoreError {
    StoreError::internal(format!("{operation}: {err}"))
}

fn not_found_or(id: &str, operation: &str, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::not_found(format!("diagram {id}"))
    } else {
        io_error(operation, err)
    }
}
