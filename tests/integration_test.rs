mod common;

use common::{same_shape, sample_project, ScriptedService};
use inkmap::expand::{AiExpansionOrchestrator, GenerationSettings};
use inkmap::model::Node;
use inkmap::reference::{Candidate, ReferenceResolver, SuggestionEngine};
use inkmap::state::MindMapState;
use inkmap::store::DocumentStore;
use inkmap::tree;

/// The full pipeline: type a reference into the prompt, generate against
/// a scripted stream, apply the draft, then undo the whole expansion.
#[test]
fn test_expand_pipeline_end_to_end() {
    let (store, manuscript) = sample_project();
    let mut resolver = ReferenceResolver::new(store);
    let mut state = MindMapState::new(manuscript.root.clone());
    let mut orch = AiExpansionOrchestrator::new(GenerationSettings::default());

    let target = tree::find(state.root(), "hook").unwrap().clone();
    orch.open_for(&target);
    assert_eq!(orch.prompt, "Expand on \"hook\".");

    // Type a remote node reference: ':' picks the document, then '@'
    // offers its nodes.
    let mut engine = SuggestionEngine::new();
    let mut text = orch.prompt.clone();
    text.push(' ');
    engine.on_char_typed(&text, ' ');
    text.push(':');
    engine.on_char_typed(&text, ':');
    let docs = resolver.document_candidates(&engine.active().unwrap().filter, "doc1");
    let world = docs
        .iter()
        .find(|c| matches!(c, Candidate::Document(m) if m.id == "doc2"))
        .unwrap();
    let (mut text, caret) = engine.accept(&text, world).unwrap();
    assert_eq!(caret, text.len());

    text.push('@');
    engine.on_char_typed(&text, '@');
    let suggestion = engine.active().unwrap().mode.clone();
    let nodes = resolver.node_candidates(&suggestion, "", &manuscript, Some("hook"));
    let magic = nodes
        .iter()
        .find(|c| matches!(c, Candidate::Node { node_id, .. } if node_id == "magic"))
        .unwrap();
    let (text, _) = engine.accept(&text, magic).unwrap();
    orch.prompt = text;
    assert!(orch.prompt.contains("[引用文档:doc2:Worldbuilding]"));
    assert!(orch.prompt.contains("[引用节点:doc2:magic:magic]"));

    // Stream a nested outline and apply it.
    let mut service = ScriptedService::new(&[
        "- Scene: ambush\n",
        "  - Twist: ally betrays hero\n",
        "- Scene: aftermath\n",
    ]);
    let mut streamed = String::new();
    orch.generate(&mut resolver, &manuscript, &mut service, |c| {
        streamed.push_str(c)
    })
    .unwrap();
    assert_eq!(streamed, orch.draft());
    let refs = service.last_reference_block.unwrap();
    assert!(refs.contains("- magic"));

    let before_undo = state.undo_depth();
    orch.apply(&mut state).unwrap();
    assert_eq!(state.undo_depth(), before_undo + 1);

    let hook = tree::find(state.root(), "hook").unwrap();
    assert_eq!(hook.children.len(), 2);
    let expected = {
        let mut ambush = Node::new("Scene: ambush");
        ambush.children.push(Node::new("Twist: ally betrays hero"));
        ambush
    };
    assert!(same_shape(&hook.children[0], &expected));

    // One undo removes the entire applied expansion.
    assert!(state.undo());
    assert!(tree::find(state.root(), "hook").unwrap().children.is_empty());
}

/// Round-trip property: serializing any subtree and re-parsing it
/// reconstructs the same shape with fresh ids.
#[test]
fn test_serialize_parse_round_trip() {
    let (_, manuscript) = sample_project();
    let serialized = tree::serialize(&manuscript.root);
    let forest = inkmap::parser::parse_outline(&serialized);
    assert_eq!(forest.len(), 1);
    assert!(same_shape(&forest[0], &manuscript.root));
    assert_ne!(forest[0].id, manuscript.root.id);
}

/// A stale cache is the documented trade-off: edits saved behind the
/// resolver's back do not show up within the session.
#[test]
fn test_remote_cache_serves_stale_content_within_session() {
    let (store, manuscript) = sample_project();
    let mut resolver = ReferenceResolver::new(store);

    let first = resolver
        .resolve("[引用节点:doc2:geo:geo]", &manuscript)
        .unwrap();
    assert!(first.contains("- geo"));

    // Overwrite doc2 behind the resolver's back.
    let mut doc2 = resolver.store().get("doc2").unwrap();
    doc2.root.children.clear();
    resolver
        .store()
        .save("doc2", &doc2.title, &doc2.serialized_root().unwrap())
        .unwrap();

    let second = resolver
        .resolve("[引用节点:doc2:geo:geo]", &manuscript)
        .unwrap();
    assert!(second.contains("- geo")); // still the cached tree
}
