//! Parses streamed Markdown drafts back into tree nodes. Matched
//! round-trip pair of `tree::serialize`.

use crate::model::Node;
use regex::Regex;

/// Parses an indentation-sensitive bullet list into a forest of nodes.
///
/// Each line matching `<indent><bullet> <text>` becomes a node (bullets
/// `-` and `*` are accepted, as models emit both). A line's parent is the
/// most recent stack entry with strictly smaller indent; lines that do
/// not match the bullet pattern are skipped, not errors. An empty result
/// is the caller's signal that the draft had no usable structure.
///
/// Indent comparison is a plain character count. Tabs are not expanded,
/// so mixed tabs/spaces nest inconsistently; this is a known limitation
/// of the format, pinned by a test rather than silently corrected.
pub fn parse_outline(text: &str) -> Vec<Node> {
    let bullet = Regex::new(r"^([ \t]*)[-*]\s+(.+)$").expect("bullet pattern is valid");

    let mut roots: Vec<Node> = Vec::new();
    // (indent, path of child indices from `roots` to the node)
    let mut stack: Vec<(usize, Vec<usize>)> = Vec::new();

    for line in text.lines() {
        let Some(caps) = bullet.captures(line) else {
            continue;
        };
        let indent = caps[1].len();
        let label = caps[2].trim_end();
        if label.is_empty() {
            continue;
        }
        let node = Node::new(label);

        while stack.last().is_some_and(|(top, _)| *top >= indent) {
            stack.pop();
        }

        let path = match stack.last() {
            Some((_, parent_path)) => {
                let parent = node_at_mut(&mut roots, parent_path);
                parent.children.push(node);
                let mut path = parent_path.clone();
                path.push(parent.children.len() - 1);
                path
            }
            None => {
                roots.push(node);
                vec![roots.len() - 1]
            }
        };
        stack.push((indent, path));
    }

    roots
}

fn node_at_mut<'a>(roots: &'a mut [Node], path: &[usize]) -> &'a mut Node {
    let mut node = &mut roots[path[0]];
    for &i in &path[1..] {
        node = &mut node.children[i];
    }
    node
}
