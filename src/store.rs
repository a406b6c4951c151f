//! Document persistence. The core treats the store as an external
//! collaborator behind a small trait; a file-backed implementation is
//! provided for the CLI and an in-memory one for tests and fakes.

use crate::errors::StoreError;
use crate::model::{Document, StoredDocument};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: String,
    pub title: String,
}

/// One store instance is scoped to a single project.
pub trait DocumentStore {
    fn get(&self, doc_id: &str) -> Result<Document, StoreError>;
    fn save(&self, doc_id: &str, title: &str, serialized_root: &str) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<DocumentMeta>, StoreError>;
}

/// One `<id>.json` per document under a directory, holding the
/// `StoredDocument` record as UTF-8 JSON.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, doc_id: &str) -> PathBuf {
        self.dir.join(format!("{doc_id}.json"))
    }
}

impl DocumentStore for FileStore {
    fn get(&self, doc_id: &str) -> Result<Document, StoreError> {
        let path = self.path_for(doc_id);
        if !path.exists() {
            return Err(StoreError::NotFound(doc_id.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        let stored: StoredDocument = serde_json::from_str(&raw)?;
        Ok(Document::from_stored(stored))
    }

    fn save(&self, doc_id: &str, title: &str, serialized_root: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let stored = StoredDocument {
            id: doc_id.to_string(),
            title: title.to_string(),
            serialized_root: serialized_root.to_string(),
        };
        fs::write(self.path_for(doc_id), serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<DocumentMeta>, StoreError> {
        let mut out = Vec::new();
        if !self.dir.exists() {
            return Ok(out);
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_meta(&path) {
                Ok(meta) => out.push(meta),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
            }
        }
        out.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(out)
    }
}

fn read_meta(path: &Path) -> Result<DocumentMeta, StoreError> {
    let raw = fs::read_to_string(path)?;
    let stored: StoredDocument = serde_json::from_str(&raw)?;
    Ok(DocumentMeta {
        id: stored.id,
        title: stored.title,
    })
}

/// In-memory store for tests. Counts `get` calls so cache behavior can be
/// asserted.
#[derive(Default)]
pub struct MemoryStore {
    docs: RefCell<HashMap<String, StoredDocument>>,
    gets: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc: &Document) {
        let stored = doc.to_stored().expect("document serializes");
        self.docs.borrow_mut().insert(doc.id.clone(), stored);
    }

    pub fn get_count(&self) -> usize {
        self.gets.get()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, doc_id: &str) -> Result<Document, StoreError> {
        self.gets.set(self.gets.get() + 1);
        self.docs
            .borrow()
            .get(doc_id)
            .cloned()
            .map(Document::from_stored)
            .ok_or_else(|| StoreError::NotFound(doc_id.to_string()))
    }

    fn save(&self, doc_id: &str, title: &str, serialized_root: &str) -> Result<(), StoreError> {
        self.docs.borrow_mut().insert(
            doc_id.to_string(),
            StoredDocument {
                id: doc_id.to_string(),
                title: title.to_string(),
                serialized_root: serialized_root.to_string(),
            },
        );
        Ok(())
    }

    fn list(&self) -> Result<Vec<DocumentMeta>, StoreError> {
        let mut out: Vec<DocumentMeta> = self
            .docs
            .borrow()
            .values()
            .map(|d| DocumentMeta {
                id: d.id.clone(),
                title: d.title.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(out)
    }
}

/// Debounced autosave. Mutations mark it pending; `poll` fires the save
/// once the quiet interval has elapsed. A failed save is logged and the
/// timer reset, so it retries on a later tick instead of blocking edits.
/// Last write wins; the in-memory tree stays the source of truth.
pub struct Autosave {
    enabled: bool,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl Autosave {
    pub fn new(enabled: bool, debounce: Duration) -> Self {
        Self {
            enabled,
            debounce,
            pending_since: None,
        }
    }

    pub fn mark_dirty(&mut self, now: Instant) {
        if self.enabled {
            self.pending_since.get_or_insert(now);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Runs `save` if a pending change has settled. Returns true when a
    /// save succeeded.
    pub fn poll(
        &mut self,
        now: Instant,
        save: impl FnOnce() -> Result<(), StoreError>,
    ) -> bool {
        let Some(since) = self.pending_since else {
            return false;
        };
        if now.duration_since(since) < self.debounce {
            return false;
        }
        match save() {
            Ok(()) => {
                self.pending_since = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "autosave failed, will retry");
                self.pending_since = Some(now);
                false
            }
        }
    }
}
