//! Pan/zoom transform state for the rendering canvas, plus the small
//! outline layout that gives every visible node a world position so the
//! viewport can center on a focused node.

use crate::model::Node;
use crate::tree;

const MIN_ZOOM: f64 = 0.25;
const MAX_ZOOM: f64 = 2.5;

/// World-space size of one outline row and one indent step.
pub const ROW_HEIGHT: f64 = 40.0;
pub const INDENT_WIDTH: f64 = 160.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasViewport {
    /// World coordinate shown at the screen origin.
    pub offset_x: f64,
    pub offset_y: f64,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Shifts the viewport by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x -= dx / self.zoom;
        self.offset_y -= dy / self.zoom;
    }

    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        ((wx - self.offset_x) * self.zoom, (wy - self.offset_y) * self.zoom)
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (sx / self.zoom + self.offset_x, sy / self.zoom + self.offset_y)
    }

    /// Multiplies the zoom, keeping the world point under the given
    /// screen position fixed (wheel-zoom anchoring).
    pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
        let (anchor_x, anchor_y) = self.screen_to_world(sx, sy);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.offset_x = anchor_x - sx / self.zoom;
        self.offset_y = anchor_y - sy / self.zoom;
    }

    /// Centers the viewport on a world point.
    pub fn center_on(&mut self, wx: f64, wy: f64) {
        self.offset_x = wx - self.width / (2.0 * self.zoom);
        self.offset_y = wy - self.height / (2.0 * self.zoom);
    }

    /// Centers on a node's layout position. A collapsed-away or missing
    /// id leaves the viewport untouched.
    pub fn center_on_node(&mut self, root: &Node, id: &str) {
        if let Some(pos) = layout_outline(root).into_iter().find(|p| p.id == id) {
            self.center_on(pos.x, pos.y);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlinePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub depth: usize,
}

/// Assigns a world position to every visible node: one row per node in
/// pre-order, indented by depth. Children of collapsed nodes are not
/// laid out.
pub fn layout_outline(root: &Node) -> Vec<OutlinePosition> {
    let mut out = Vec::new();
    let mut row = 0usize;
    place(root, 0, &mut row, &mut out);
    out
}

fn place(node: &Node, depth: usize, row: &mut usize, out: &mut Vec<OutlinePosition>) {
    out.push(OutlinePosition {
        id: node.id.clone(),
        x: depth as f64 * INDENT_WIDTH,
        y: *row as f64 * ROW_HEIGHT,
        depth,
    });
    *row += 1;
    if !node.is_expanded() {
        return;
    }
    for child in &node.children {
        place(child, depth + 1, row, out);
    }
}

/// Convenience for callers that only need one node's position.
pub fn node_position(root: &Node, id: &str) -> Option<OutlinePosition> {
    tree::find(root, id)?;
    layout_outline(root).into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut root = Node::root("Idea");
        let mut a = Node::with_id("a", "A");
        a.children.push(Node::with_id("b", "B"));
        root.children.push(a);
        root.children.push(Node::with_id("c", "C"));
        root
    }

    #[test]
    fn test_layout_rows_and_depth() {
        let positions = layout_outline(&sample());
        let ids: Vec<&str> = positions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a", "b", "c"]);
        assert_eq!(positions[2].depth, 2);
        assert_eq!(positions[2].x, 2.0 * INDENT_WIDTH);
        assert_eq!(positions[3].y, 3.0 * ROW_HEIGHT);
    }

    #[test]
    fn test_collapsed_children_not_laid_out() {
        let mut root = sample();
        root.children[0].is_expanded = Some(false);
        let positions = layout_outline(&root);
        assert!(positions.iter().all(|p| p.id != "b"));
        assert!(node_position(&root, "b").is_none());
    }

    #[test]
    fn test_pan_and_transform_round_trip() {
        let mut vp = CanvasViewport::new(800.0, 600.0);
        vp.pan(-100.0, 50.0);
        let (wx, wy) = vp.screen_to_world(400.0, 300.0);
        let (sx, sy) = vp.world_to_screen(wx, wy);
        assert!((sx - 400.0).abs() < 1e-9);
        assert!((sy - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut vp = CanvasViewport::new(800.0, 600.0);
        vp.pan(-30.0, -70.0);
        let anchor = vp.screen_to_world(200.0, 150.0);
        vp.zoom_at(1.5, 200.0, 150.0);
        let after = vp.screen_to_world(200.0, 150.0);
        assert!((anchor.0 - after.0).abs() < 1e-9);
        assert!((anchor.1 - after.1).abs() < 1e-9);
        assert!((vp.zoom - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut vp = CanvasViewport::new(800.0, 600.0);
        vp.zoom_at(100.0, 0.0, 0.0);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom_at(0.0001, 0.0, 0.0);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_center_on_node() {
        let mut vp = CanvasViewport::new(800.0, 600.0);
        let root = sample();
        vp.center_on_node(&root, "b");
        let pos = node_position(&root, "b").unwrap();
        let (sx, sy) = vp.world_to_screen(pos.x, pos.y);
        assert!((sx - 400.0).abs() < 1e-9);
        assert!((sy - 300.0).abs() < 1e-9);

        let before = vp.clone();
        vp.center_on_node(&root, "zzz");
        assert_eq!(vp, before);
    }
}
