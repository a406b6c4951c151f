// Each integration test binary uses its own subset of these helpers.
#![allow(dead_code)]

use inkmap::expand::{GenerationRequest, StreamingGenerationService};
use inkmap::model::{Document, Node};
use inkmap::store::MemoryStore;

/// Builds a node with a fixed id equal to its label (handy for tests).
pub fn node(label: &str, children: Vec<Node>) -> Node {
    let mut n = Node::with_id(label, label);
    n.children = children;
    n
}

/// A small project: the manuscript being edited plus a worldbuilding
/// document to reference remotely.
pub fn sample_project() -> (MemoryStore, Document) {
    let store = MemoryStore::new();

    let mut manuscript = Document::new("doc1", "Manuscript");
    manuscript.root = node(
        "root",
        vec![
            node("ch1", vec![node("hook", vec![])]),
            node("ch2", vec![]),
        ],
    );
    manuscript.root.label = "Manuscript".to_string();

    let mut world = Document::new("doc2", "Worldbuilding");
    world.root = node("root", vec![node("geo", vec![]), node("magic", vec![])]);
    world.root.label = "World".to_string();

    store.insert(&manuscript);
    store.insert(&world);
    (store, manuscript)
}

/// Compare two trees by labels and shape, ignoring ids (parse mints
/// fresh ones).
pub fn same_shape(a: &Node, b: &Node) -> bool {
    a.label == b.label
        && a.children.len() == b.children.len()
        && a.children
            .iter()
            .zip(&b.children)
            .all(|(x, y)| same_shape(x, y))
}

/// Streams a fixed script of chunks, then optionally fails.
pub struct ScriptedService {
    pub chunks: Vec<String>,
    pub fail_after: bool,
    pub requests_seen: usize,
    pub last_reference_block: Option<String>,
}

impl ScriptedService {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            fail_after: false,
            requests_seen: 0,
            last_reference_block: None,
        }
    }
}

impl StreamingGenerationService for ScriptedService {
    fn generate(
        &mut self,
        request: GenerationRequest<'_>,
        on_chunk: &mut dyn FnMut(&str),
    ) -> anyhow::Result<()> {
        self.requests_seen += 1;
        self.last_reference_block = request.reference_block.map(str::to_string);
        for chunk in &self.chunks {
            on_chunk(chunk);
        }
        if self.fail_after {
            anyhow::bail!("upstream closed the stream");
        }
        Ok(())
    }
}
