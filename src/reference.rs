//! The reference micro-syntax and its resolver. A prompt may embed tags
//! of the form `[<kind>:<id1>[:<id2>][:<display>]]` pulling other nodes'
//! or documents' content into the generation call. The two literal kind
//! markers are shared byte-for-byte between the suggestion engine (which
//! inserts tags) and the resolver (which extracts them).

use crate::model::{Document, Node};
use crate::store::{DocumentMeta, DocumentStore};
use crate::tree;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;

/// Kind marker for a whole-document reference.
pub const DOC_REF_KIND: &str = "引用文档";
/// Kind marker for a single-node reference, local or remote.
pub const NODE_REF_KIND: &str = "引用节点";

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[(引用文档|引用节点):([^:\]]+)(?::([^:\]]+))?(?::([^\]]+))?\]")
            .expect("tag pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Document,
    Node,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTag {
    pub kind: RefKind,
    pub doc_id: String,
    pub node_id: Option<String>,
    pub display: Option<String>,
}

/// Canonical text of a document-reference tag.
pub fn document_tag(doc_id: &str, title: &str) -> String {
    format!("[{DOC_REF_KIND}:{doc_id}:{title}]")
}

/// Canonical text of a node-reference tag.
pub fn node_tag(doc_id: &str, node_id: &str, label: &str) -> String {
    format!("[{NODE_REF_KIND}:{doc_id}:{node_id}:{label}]")
}

/// Extracts all reference tags from a prompt, in encounter order.
pub fn scan_tags(text: &str) -> Vec<ReferenceTag> {
    tag_pattern()
        .captures_iter(text)
        .map(|caps| {
            let kind = if &caps[1] == DOC_REF_KIND {
                RefKind::Document
            } else {
                RefKind::Node
            };
            let field2 = caps.get(3).map(|m| m.as_str().to_string());
            let field3 = caps.get(4).map(|m| m.as_str().to_string());
            match kind {
                // [引用文档:docId:display]
                RefKind::Document => ReferenceTag {
                    kind,
                    doc_id: caps[2].to_string(),
                    node_id: None,
                    display: field2.or(field3),
                },
                // [引用节点:docId:nodeId:display]
                RefKind::Node => ReferenceTag {
                    kind,
                    doc_id: caps[2].to_string(),
                    node_id: field2,
                    display: field3,
                },
            }
        })
        .collect()
}

/// An entry offered by the autocomplete popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Document(DocumentMeta),
    Node {
        doc_id: String,
        node_id: String,
        label: String,
    },
}

/// Which candidate list the popup should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionMode {
    /// Triggered by `:` — other documents in the project.
    Document,
    /// Triggered by `@` — nodes of the local document, or of the remote
    /// document whose completed tag immediately precedes the trigger.
    Node { source_doc: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub mode: SuggestionMode,
    /// Byte offset of the trigger character in the prompt text.
    pub trigger_pos: usize,
    /// Characters typed since the trigger, used to filter candidates.
    pub filter: String,
}

fn completed_doc_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[引用文档:([^:\]]+):([^\]]+)\]$").expect("doc tag suffix pattern is valid")
    })
}

/// Tracks the in-progress reference the user is typing at the end of the
/// prompt box. The caret is assumed to sit at the end of the text, which
/// is how the expansion modal's input behaves.
#[derive(Debug, Default)]
pub struct SuggestionEngine {
    active: Option<Suggestion>,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Suggestion> {
        self.active.as_ref()
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Inspects the character just appended to `text`.
    pub fn on_char_typed(&mut self, text: &str, ch: char) {
        let trigger_pos = text.len() - ch.len_utf8();
        match ch {
            ':' => {
                self.active = Some(Suggestion {
                    mode: SuggestionMode::Document,
                    trigger_pos,
                    filter: String::new(),
                });
            }
            '@' => {
                // A completed document tag right before the `@` switches
                // the candidate list to that remote document's nodes.
                let before = &text[..trigger_pos];
                let source_doc = completed_doc_tag_pattern()
                    .captures(before)
                    .map(|caps| caps[1].to_string());
                self.active = Some(Suggestion {
                    mode: SuggestionMode::Node { source_doc },
                    trigger_pos,
                    filter: String::new(),
                });
            }
            ' ' | '\n' => self.active = None,
            _ => {
                if let Some(s) = self.active.as_mut() {
                    s.filter.push(ch);
                }
            }
        }
    }

    /// Splices the canonical tag for `candidate` over the trigger and
    /// filter characters, clearing the active suggestion. Returns the new
    /// text and the caret position just after the inserted tag.
    pub fn accept(&mut self, text: &str, candidate: &Candidate) -> Option<(String, usize)> {
        let suggestion = self.active.take()?;
        let tag = match candidate {
            Candidate::Document(meta) => document_tag(&meta.id, &meta.title),
            Candidate::Node {
                doc_id,
                node_id,
                label,
            } => node_tag(doc_id, node_id, label),
        };
        let mut out = text[..suggestion.trigger_pos].to_string();
        out.push_str(&tag);
        let caret = out.len();
        Some((out, caret))
    }
}

/// Resolves reference tags against the local tree and a remote-document
/// cache. The cache is owned here (not a global), read-through, and lives
/// for the editing session; a document saved elsewhere mid-session may
/// serve stale content, which is an accepted staleness window.
pub struct ReferenceResolver<S: DocumentStore> {
    store: S,
    cache: HashMap<String, Document>,
}

impl<S: DocumentStore> ReferenceResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch-or-cached. A fetch failure is logged and degrades to `None`;
    /// it never aborts the surrounding resolution.
    fn fetch(&mut self, doc_id: &str) -> Option<&Document> {
        if !self.cache.contains_key(doc_id) {
            match self.store.get(doc_id) {
                Ok(doc) => {
                    self.cache.insert(doc_id.to_string(), doc);
                }
                Err(e) => {
                    warn!(doc_id, error = %e, "reference document fetch failed");
                    return None;
                }
            }
        }
        self.cache.get(doc_id)
    }

    /// Documents offered in `:` mode, excluding the one being edited and
    /// filtered by title substring.
    pub fn document_candidates(&self, filter: &str, current_doc: &str) -> Vec<Candidate> {
        let metas = match self.store.list() {
            Ok(metas) => metas,
            Err(e) => {
                warn!(error = %e, "document listing failed");
                return Vec::new();
            }
        };
        metas
            .into_iter()
            .filter(|m| m.id != current_doc)
            .filter(|m| filter.is_empty() || m.title.contains(filter))
            .map(Candidate::Document)
            .collect()
    }

    /// Nodes offered in `@` mode. With a source document the remote tree
    /// is fetched through the cache; otherwise the local document's nodes
    /// are offered, minus the node currently being expanded.
    pub fn node_candidates(
        &mut self,
        mode: &SuggestionMode,
        filter: &str,
        local: &Document,
        exclude_node: Option<&str>,
    ) -> Vec<Candidate> {
        let SuggestionMode::Node { source_doc } = mode else {
            return Vec::new();
        };
        let (doc_id, nodes): (String, Vec<(String, String)>) = match source_doc {
            Some(remote_id) => match self.fetch(remote_id) {
                Some(doc) => (
                    doc.id.clone(),
                    tree::flatten(&doc.root)
                        .into_iter()
                        .map(|n| (n.id.clone(), n.label.clone()))
                        .collect(),
                ),
                None => return Vec::new(),
            },
            None => (
                local.id.clone(),
                tree::flatten(&local.root)
                    .into_iter()
                    .filter(|n| exclude_node != Some(n.id.as_str()))
                    .map(|n| (n.id.clone(), n.label.clone()))
                    .collect(),
            ),
        };
        nodes
            .into_iter()
            .filter(|(_, label)| filter.is_empty() || label.contains(filter))
            .map(|(node_id, label)| Candidate::Node {
                doc_id: doc_id.clone(),
                node_id,
                label,
            })
            .collect()
    }

    /// Scans the full prompt and assembles the resolved reference block:
    /// one labeled block per tag, encounter order, blank-line separated.
    /// `None` when the prompt holds no tags. Unresolvable references
    /// degrade to placeholder blocks; they never abort the generation.
    pub fn resolve(&mut self, prompt: &str, local: &Document) -> Option<String> {
        let tags = scan_tags(prompt);
        if tags.is_empty() {
            return None;
        }
        let blocks: Vec<String> = tags
            .iter()
            .map(|tag| match tag.kind {
                RefKind::Document => self.resolve_document(tag, local),
                RefKind::Node => self.resolve_node(tag, local),
            })
            .collect();
        Some(blocks.join("\n\n"))
    }

    fn resolve_document(&mut self, tag: &ReferenceTag, local: &Document) -> String {
        if tag.doc_id == local.id {
            return document_block(&local.title, &local.root);
        }
        match self.fetch(&tag.doc_id) {
            Some(doc) => document_block(&doc.title, &doc.root),
            None => format!(
                "Reference document {} could not be loaded (not found).",
                tag.doc_id
            ),
        }
    }

    fn resolve_node(&mut self, tag: &ReferenceTag, local: &Document) -> String {
        let Some(node_id) = tag.node_id.as_deref() else {
            return format!(
                "Reference node in document {} could not be resolved (no node id).",
                tag.doc_id
            );
        };
        let located: Option<(String, Node)> = if tag.doc_id == local.id {
            // Local references resolve against the in-memory tree, no fetch.
            tree::find(&local.root, node_id).map(|n| (local.title.clone(), n.clone()))
        } else {
            self.fetch(&tag.doc_id)
                .and_then(|doc| tree::find(&doc.root, node_id).map(|n| (doc.title.clone(), n.clone())))
        };
        match located {
            Some((title, node)) => node_block(&title, &node),
            None => format!(
                "Reference node {} in document {} was not found.",
                node_id, tag.doc_id
            ),
        }
    }
}

fn document_block(title: &str, root: &Node) -> String {
    format!("Reference document \"{}\":\n{}", title, tree::serialize(root))
}

fn node_block(doc_title: &str, node: &Node) -> String {
    format!(
        "Reference node \"{}\" (from \"{}\"):\n{}",
        node.label,
        doc_title,
        tree::serialize(node)
    )
}
