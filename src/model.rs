use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Conventional id of the single root node of every document.
pub const ROOT_ID: &str = "root";

/// Label given to freshly inserted nodes until the user edits them.
pub const PLACEHOLDER_LABEL: &str = "New Node";

/// Root label of a document that was created empty (or failed to load).
pub const DEFAULT_ROOT_LABEL: &str = "New Mind Map";

/// Mints a fresh node id. The root keeps its conventional literal id;
/// everything else gets a v4 UUID.
pub fn mint_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Display-collapse flag. Absent means expanded; it never affects
    /// structural operations.
    #[serde(rename = "isExpanded", skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: mint_id(),
            label: label.into(),
            children: Vec::new(),
            is_expanded: None,
        }
    }

    pub fn with_id(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            children: Vec::new(),
            is_expanded: None,
        }
    }

    /// A fresh single-node root.
    pub fn root(label: impl Into<String>) -> Self {
        Self::with_id(ROOT_ID, label)
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded.unwrap_or(true)
    }
}

/// A titled, persisted mind map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub root: Node,
}

/// The on-disk/wire record. `serialized_root` is a JSON-encoded
/// `{"root": Node}` envelope, stored as a string exactly as the upstream
/// document store records it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub title: String,
    #[serde(rename = "serializedRoot")]
    pub serialized_root: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RootEnvelope {
    root: Node,
}

impl Document {
    /// A new empty document: a lone root node with the default label.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            root: Node::root(DEFAULT_ROOT_LABEL),
        }
    }

    /// Encodes the tree as the `{"root": Node}` envelope string.
    pub fn serialized_root(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&RootEnvelope {
            root: self.root.clone(),
        })
    }

    pub fn to_stored(&self) -> Result<StoredDocument, serde_json::Error> {
        Ok(StoredDocument {
            id: self.id.clone(),
            title: self.title.clone(),
            serialized_root: self.serialized_root()?,
        })
    }

    /// Rebuilds a document from its stored form. A corrupt or rootless
    /// envelope falls back to a fresh single-node root instead of failing
    /// the load.
    pub fn from_stored(stored: StoredDocument) -> Self {
        let root = match serde_json::from_str::<RootEnvelope>(&stored.serialized_root) {
            Ok(envelope) => envelope.root,
            Err(e) => {
                warn!(doc_id = %stored.id, error = %e, "unreadable root envelope, starting fresh");
                Node::root(DEFAULT_ROOT_LABEL)
            }
        };
        Self {
            id: stored.id,
            title: stored.title,
            root,
        }
    }
}
