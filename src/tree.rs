//! Pure functions over owned `Node` trees. Every mutation returns a new
//! tree; a missing id yields the input unchanged. Failure signaling is
//! the caller's job (see `MindMapState`), so nothing here errors for
//! expected edge cases.

use crate::model::Node;

/// Renders a node and all descendants as an indented bullet list, one
/// line per node, two-space indent per depth. This is the canonical
/// format injected into prompts as reference material and the format the
/// model is instructed to emit, so `parser::parse_outline` is its
/// matched round-trip pair.
pub fn serialize(node: &Node) -> String {
    let mut lines = Vec::new();
    collect_lines(node, 0, &mut lines);
    lines.join("\n")
}

fn collect_lines(node: &Node, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}- {}", "  ".repeat(depth), node.label));
    for child in &node.children {
        collect_lines(child, depth + 1, lines);
    }
}

/// Replaces the node with `id` by `f(node)`, rebuilding the path from the
/// root. Returns an equal tree when `id` is absent.
pub fn update(root: &Node, id: &str, f: &dyn Fn(&Node) -> Node) -> Node {
    if root.id == id {
        return f(root);
    }
    Node {
        id: root.id.clone(),
        label: root.label.clone(),
        children: root.children.iter().map(|c| update(c, id, f)).collect(),
        is_expanded: root.is_expanded,
    }
}

/// Removes the node with `id` (and its whole subtree) from wherever it
/// is. The root itself is never removed.
pub fn remove(root: &Node, id: &str) -> Node {
    Node {
        id: root.id.clone(),
        label: root.label.clone(),
        children: root
            .children
            .iter()
            .filter(|c| c.id != id)
            .map(|c| remove(c, id))
            .collect(),
        is_expanded: root.is_expanded,
    }
}

/// Finds a node by id anywhere in the tree.
pub fn find<'a>(root: &'a Node, id: &str) -> Option<&'a Node> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|c| find(c, id))
}

/// Pre-order traversal, node before children. Used for search/filter UI
/// and reference candidate lists.
pub fn flatten(root: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    push_preorder(root, &mut out);
    out
}

fn push_preorder<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    out.push(node);
    for child in &node.children {
        push_preorder(child, out);
    }
}

/// True when `id` is `node`'s own id or appears anywhere in its subtree.
pub fn is_descendant(node: &Node, id: &str) -> bool {
    find(node, id).is_some()
}

/// Detaches the subtree at `dragged_id` and re-attaches it as the last
/// child of `target_id`. Returns `None` (state unchanged, caller must
/// surface the failure) when the dragged node is the target or the root,
/// when either id is missing, or when the target sits inside the dragged
/// subtree (cycle prevention — never silently corrected).
pub fn move_node(root: &Node, dragged_id: &str, target_id: &str) -> Option<Node> {
    if dragged_id == target_id || dragged_id == root.id {
        return None;
    }
    let dragged = find(root, dragged_id)?.clone();
    if is_descendant(&dragged, target_id) {
        return None;
    }
    find(root, target_id)?;

    let detached = remove(root, dragged_id);
    Some(update(&detached, target_id, &|n| {
        let mut n = n.clone();
        n.children.push(dragged.clone());
        n
    }))
}
