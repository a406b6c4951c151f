//! Owns a single document's tree plus its bounded undo/redo history.
//! Every structural mutation goes through here so history stays
//! consistent; nothing else mutates the tree directly.

use crate::errors::MapError;
use crate::model::{Node, PLACEHOLDER_LABEL};
use crate::tree;

const DEFAULT_MAX_UNDO: usize = 200;

pub struct MindMapState {
    root: Node,
    /// Older whole-tree snapshots; newest last.
    past: Vec<Node>,
    /// Snapshots undone from; drained by redo, cleared by any mutation.
    future: Vec<Node>,
    max_undo_steps: usize,
    /// Currently selected node, if any.
    pub selected: Option<String>,
    /// Node whose label is being edited inline, if any.
    pub editing: Option<String>,
    dirty: bool,
}

impl MindMapState {
    pub fn new(root: Node) -> Self {
        Self::with_history_cap(root, DEFAULT_MAX_UNDO)
    }

    pub fn with_history_cap(root: Node, max_undo_steps: usize) -> Self {
        Self {
            root,
            past: Vec::new(),
            future: Vec::new(),
            max_undo_steps: max_undo_steps.max(1),
            selected: None,
            editing: None,
            dirty: false,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// True once any change happened since the last `take_dirty` call.
    /// Consumed by the autosave loop.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Atomic commit: snapshot the old root, install the new one, drop
    /// any redo branch. Oldest snapshots fall off past the cap.
    fn commit(&mut self, new_root: Node) {
        self.past.push(std::mem::replace(&mut self.root, new_root));
        if self.past.len() > self.max_undo_steps {
            self.past.remove(0);
        }
        self.future.clear();
        self.dirty = true;
    }

    /// Appends a placeholder-labeled node under `parent_id`, expands the
    /// parent, and returns the new id so the caller can enter edit mode
    /// on it. `None` when the parent does not exist (no history entry).
    pub fn add_child(&mut self, parent_id: &str) -> Option<String> {
        tree::find(&self.root, parent_id)?;

        let child = Node::new(PLACEHOLDER_LABEL);
        let child_id = child.id.clone();
        let new_root = tree::update(&self.root, parent_id, &|n| {
            let mut n = n.clone();
            n.children.push(child.clone());
            n.is_expanded = Some(true);
            n
        });
        self.commit(new_root);
        Some(child_id)
    }

    /// Replaces a node's label. Editing to the current value is a no-op
    /// and pushes nothing onto history.
    pub fn edit_label(&mut self, id: &str, new_label: &str) -> Result<(), MapError> {
        let node = tree::find(&self.root, id).ok_or_else(|| MapError::NodeNotFound(id.into()))?;
        if node.label == new_label {
            return Ok(());
        }
        let label = new_label.to_string();
        let new_root = tree::update(&self.root, id, &|n| {
            let mut n = n.clone();
            n.label = label.clone();
            n
        });
        self.commit(new_root);
        Ok(())
    }

    /// Removes a node and its subtree. The root is protected; deleting
    /// the selected node clears the selection.
    pub fn delete_node(&mut self, id: &str) -> Result<(), MapError> {
        if id == self.root.id {
            return Err(MapError::CannotDeleteRoot);
        }
        tree::find(&self.root, id).ok_or_else(|| MapError::NodeNotFound(id.into()))?;

        let new_root = tree::remove(&self.root, id);
        self.commit(new_root);
        if self
            .selected
            .as_deref()
            .is_some_and(|sel| tree::find(&self.root, sel).is_none())
        {
            self.selected = None;
        }
        Ok(())
    }

    /// Re-parents `dragged_id` under `target_id`. Invalid moves (root,
    /// self, cycle, missing id) leave the state untouched.
    pub fn move_node(&mut self, dragged_id: &str, target_id: &str) -> Result<(), MapError> {
        match tree::move_node(&self.root, dragged_id, target_id) {
            Some(new_root) => {
                self.commit(new_root);
                Ok(())
            }
            None => Err(MapError::InvalidMove),
        }
    }

    /// Flips a node's display-collapse flag. Purely visual, so it does
    /// not enter undo history (documented deviation); it still marks the
    /// document dirty so the flag persists.
    pub fn toggle_expand(&mut self, id: &str) {
        if tree::find(&self.root, id).is_none() {
            return;
        }
        self.root = tree::update(&self.root, id, &|n| {
            let mut n = n.clone();
            n.is_expanded = Some(!n.is_expanded());
            n
        });
        self.dirty = true;
    }

    /// Appends a parsed forest under `parent_id` as one history entry.
    /// Used by the expansion apply step.
    pub fn append_subtrees(&mut self, parent_id: &str, forest: Vec<Node>) -> Result<(), MapError> {
        tree::find(&self.root, parent_id)
            .ok_or_else(|| MapError::NodeNotFound(parent_id.into()))?;
        if forest.is_empty() {
            return Ok(());
        }
        let new_root = tree::update(&self.root, parent_id, &|n| {
            let mut n = n.clone();
            n.children.extend(forest.iter().cloned());
            n.is_expanded = Some(true);
            n
        });
        self.commit(new_root);
        Ok(())
    }

    /// Restores the previous snapshot. Clears in-progress inline edits so
    /// no editor is left bound to a node that may no longer exist.
    pub fn undo(&mut self) -> bool {
        match self.past.pop() {
            Some(prev) => {
                self.future.push(std::mem::replace(&mut self.root, prev));
                self.editing = None;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.future.pop() {
            Some(next) => {
                self.past.push(std::mem::replace(&mut self.root, next));
                self.editing = None;
                self.dirty = true;
                true
            }
            None => false,
        }
    }
}
