//! Pointer and keyboard interaction on top of the layout tree: proportional
//! resize, spatial focus movement and divider drags.

use ratatui::layout::Rect;
use tracing::{debug, trace};

use crate::layout::geometry::{self, span, Divider};
use crate::layout::{Axis, LayoutTree, NodeId, PaneId};

/// Smallest share a resized node may take of its parent.
pub const MIN_SHARE: f64 = 0.1;
/// Largest share a resized node may take of its parent.
pub const MAX_SHARE: f64 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusDirection {
    Left,
    Right,
    Up,
    Down,
}

impl FocusDirection {
    fn axis(self) -> Axis {
        match self {
            FocusDirection::Left | FocusDirection::Right => Axis::Row,
            FocusDirection::Up | FocusDirection::Down => Axis::Column,
        }
    }

    fn sign(self) -> f64 {
        match self {
            FocusDirection::Left | FocusDirection::Up => -1.0,
            FocusDirection::Right | FocusDirection::Down => 1.0,
        }
    }
}

impl LayoutTree {
    /// Share of its parent's space currently held by `id`. The root holds 1.
    pub fn share_of(&self, id: NodeId) -> Option<f64> {
        let root = self.root()?;
        if root.id() == id {
            return Some(1.0);
        }
        let (parent, index) = root.parent_of(id)?;
        let total = parent.total_weight();
        if total <= 0.0 {
            return None;
        }
        Some(parent.children[index].weight() / total)
    }

    /// Give `id` the share `target_share` of its parent, clamped to
    /// [`MIN_SHARE`, `MAX_SHARE`]. The rest of the parent's weight is spread
    /// evenly over every other sibling.
    pub fn resize_by_proportion(&mut self, id: NodeId, target_share: f64) -> bool {
        if target_share.is_nan() {
            return false;
        }
        let share = target_share.clamp(MIN_SHARE, MAX_SHARE);
        let Some((parent, index)) = self.root_mut().and_then(|root| root.parent_of_mut(id)) else {
            return false;
        };

        if parent.children.len() < 2 {
            return false;
        }
        let total = parent.total_weight();
        let weight = share * total;
        let others = (parent.children.len() - 1) as f64;
        let rest = (total - weight) / others;
        for (i, child) in parent.children.iter_mut().enumerate() {
            child.set_weight(if i == index { weight } else { rest });
        }
        trace!(node = %id, share, "resized by proportion");
        true
    }

    /// Move focus to the nearest pane in `direction` whose center is roughly
    /// aligned with the focused pane's center.
    ///
    /// `alignment` scales the perpendicular tolerance: a candidate qualifies
    /// when its center is closer than `alignment` times the sum of both panes'
    /// half extents. At 1.0 that means their perpendicular spans overlap.
    pub fn focus_directional(&mut self, direction: FocusDirection, area: Rect, alignment: f64) -> Option<PaneId> {
        let root = self.root()?;
        let focused = self.focused()?;
        let resolved = geometry::resolve_layout(root, area);
        let (_, from) = resolved.iter().find(|(id, _)| *id == focused)?;

        let axis = direction.axis();
        let cross = axis.other();
        let (from_center, from_cross, from_half) = (center(axis, *from), center(cross, *from), half(cross, *from));

        let target = resolved
            .iter()
            .filter(|(id, _)| *id != focused)
            .filter_map(|(id, rect)| {
                let distance = (center(axis, *rect) - from_center) * direction.sign();
                let offset = (center(cross, *rect) - from_cross).abs();
                let tolerance = alignment * (from_half + half(cross, *rect));
                (distance > 0.0 && offset < tolerance).then_some((*id, distance, offset))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)))
            .map(|(id, _, _)| id)?;

        self.focus_window(target);
        debug!(from = %focused, to = %target, ?direction, "moved focus");
        Some(target)
    }
}

fn center(axis: Axis, rect: Rect) -> f64 {
    let (start, len) = span(axis, rect);
    start as f64 + len as f64 / 2.0
}

fn half(axis: Axis, rect: Rect) -> f64 {
    span(axis, rect).1 as f64 / 2.0
}

/// One in-flight divider drag. Created on pointer press over a divider,
/// fed pointer moves, and dropped on release.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    anchor: NodeId,
    axis: Axis,
    start: u16,
    start_share: f64,
    extent: u16,
}

impl DragSession {
    pub fn begin(tree: &LayoutTree, divider: &Divider, x: u16, y: u16) -> Option<Self> {
        let start_share = tree.share_of(divider.anchor)?;
        debug!(anchor = %divider.anchor, axis = ?divider.axis, start_share, "drag started");
        Some(Self {
            anchor: divider.anchor,
            axis: divider.axis,
            start: pointer(divider.axis, x, y),
            start_share,
            extent: divider.extent,
        })
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Proportion the anchor should have with the pointer at (x, y).
    pub fn proportion_at(&self, x: u16, y: u16) -> Option<f64> {
        if self.extent == 0 {
            return None;
        }
        let delta = pointer(self.axis, x, y) as f64 - self.start as f64;
        Some(self.start_share + delta / self.extent as f64)
    }

    pub fn update(&self, tree: &mut LayoutTree, x: u16, y: u16) -> bool {
        match self.proportion_at(x, y) {
            Some(share) => tree.resize_by_proportion(self.anchor, share),
            None => false,
        }
    }

    /// Finish the gesture.
    pub fn end(self) -> NodeId {
        debug!(anchor = %self.anchor, "drag ended");
        self.anchor
    }
}

fn pointer(axis: Axis, x: u16, y: u16) -> u16 {
    match axis {
        Axis::Row => x,
        Axis::Column => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::geometry::resolve_dividers;
    use crate::layout::tests::{pane, split};
    use crate::layout::{ContentDescriptor, LayoutNode};

    fn sibling_weights(tree: &LayoutTree, id: NodeId) -> Vec<f64> {
        let (parent, _) = tree.root().unwrap().parent_of(id).unwrap();
        parent.children.iter().map(LayoutNode::weight).collect()
    }

    fn doc(name: &str) -> ContentDescriptor {
        ContentDescriptor::document(name)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// [a | col[b / c]]
    fn three_panes() -> (LayoutTree, PaneId, PaneId, PaneId) {
        let mut tree = LayoutTree::new();
        let a = tree.open_window(doc("a.md"));
        let b = tree.open_window(doc("b.md"));
        let request = tree.split_window(Axis::Column).unwrap();
        let c = tree.create_window_in_split(&request, doc("c.md")).unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn test_resize_two_siblings() {
        let mut tree = LayoutTree::new();
        let a = tree.open_window(doc("a.md"));
        let b = tree.open_window(doc("b.md"));
        assert!(tree.resize_by_proportion(a, 0.75));
        let weights = sibling_weights(&tree, a);
        assert!(approx(weights[0], 1.5));
        assert!(approx(weights[1], 0.5));
        assert!(approx(tree.share_of(a).unwrap(), 0.75));
        assert!(approx(tree.share_of(b).unwrap(), 0.25));
    }

    #[test]
    fn test_resize_rebalances_all_siblings() {
        let mut tree = LayoutTree::new();
        let a = tree.open_window(doc("a.md"));
        let b = tree.open_window(doc("b.md"));
        let c = tree.open_window(doc("c.md"));
        tree.resize_by_proportion(c, 0.2);
        tree.resize_by_proportion(a, 0.5);
        assert!(approx(tree.share_of(a).unwrap(), 0.5));
        assert!(approx(tree.share_of(b).unwrap(), 0.25));
        assert!(approx(tree.share_of(c).unwrap(), 0.25));
    }

    #[test]
    fn test_resize_clamps() {
        let mut tree = LayoutTree::new();
        let a = tree.open_window(doc("a.md"));
        tree.open_window(doc("b.md"));
        tree.resize_by_proportion(a, 1.4);
        assert!(approx(tree.share_of(a).unwrap(), MAX_SHARE));
        tree.resize_by_proportion(a, -3.0);
        assert!(approx(tree.share_of(a).unwrap(), MIN_SHARE));
    }

    #[test]
    fn test_resize_root_or_unknown_is_noop() {
        let mut tree = LayoutTree::new();
        let a = tree.open_window(doc("a.md"));
        assert!(!tree.resize_by_proportion(a, 0.5));
        assert!(!tree.resize_by_proportion(PaneId::new_v4(), 0.5));
        assert!(!tree.resize_by_proportion(a, f64::NAN));
    }

    #[test]
    fn test_resize_split_node() {
        let (mut tree, a, b, _) = three_panes();
        let (column, _) = tree.root().unwrap().parent_of(b).map(|(s, i)| (s.id, i)).unwrap();
        assert!(tree.resize_by_proportion(column, 0.7));
        assert!(approx(tree.share_of(a).unwrap(), 0.3));
    }

    #[test]
    fn test_focus_right_and_back() {
        let (mut tree, a, b, c) = three_panes();
        let area = Rect::new(0, 0, 120, 40);
        tree.focus_window(a);
        // b and c tie on distance and offset; tree order wins
        assert_eq!(tree.focus_directional(FocusDirection::Right, area, 1.0), Some(b));
        tree.focus_window(c);
        assert_eq!(tree.focus_directional(FocusDirection::Left, area, 1.0), Some(a));
        assert_eq!(tree.focus_directional(FocusDirection::Left, area, 1.0), None);
        assert_eq!(tree.focused(), Some(a));
    }

    #[test]
    fn test_focus_up_down_within_column() {
        let (mut tree, _, b, c) = three_panes();
        let area = Rect::new(0, 0, 120, 40);
        assert_eq!(tree.focused(), Some(c));
        assert_eq!(tree.focus_directional(FocusDirection::Up, area, 1.0), Some(b));
        assert_eq!(tree.focus_directional(FocusDirection::Up, area, 1.0), None);
        assert_eq!(tree.focus_directional(FocusDirection::Down, area, 1.0), Some(c));
    }

    #[test]
    fn test_focus_alignment_filters_diagonals() {
        // [col[a / b] | col[c / d]]
        let (a, b, c, d) = (pane("a.md"), pane("b.md"), pane("c.md"), pane("d.md"));
        let [a_id, b_id, c_id, d_id] = [a.id(), b.id(), c.id(), d.id()];
        let root = split(Axis::Row, vec![split(Axis::Column, vec![a, b]), split(Axis::Column, vec![c, d])]);
        let mut tree = LayoutTree::from_parts(Some(root), Some(a_id)).unwrap();
        let area = Rect::new(0, 0, 100, 40);

        assert_eq!(tree.focus_directional(FocusDirection::Right, area, 1.0), Some(c_id));
        tree.focus_window(a_id);
        assert_eq!(tree.focus_directional(FocusDirection::Down, area, 1.0), Some(b_id));
        assert_eq!(tree.focus_directional(FocusDirection::Right, area, 1.0), Some(d_id));
        assert_eq!(tree.focus_directional(FocusDirection::Down, area, 1.0), None);
    }

    #[test]
    fn test_focus_reaches_taller_neighbor() {
        let (a, d) = (pane("a.md"), pane("d.md"));
        let [a_id, d_id] = [a.id(), d.id()];
        let root = split(
            Axis::Row,
            vec![split(Axis::Column, vec![a, pane("b.md")]), split(Axis::Column, vec![pane("c.md"), d])],
        );
        let mut tree = LayoutTree::from_parts(Some(root), Some(a_id)).unwrap();
        let area = Rect::new(0, 0, 100, 40);
        tree.close_window(tree.pane_ids()[2]);
        tree.focus_window(a_id);
        // d now fills the right column; its center sits level with a's bottom edge
        assert_eq!(tree.focus_directional(FocusDirection::Right, area, 1.0), Some(d_id));
    }

    #[test]
    fn test_focus_on_empty_tree() {
        let mut tree = LayoutTree::new();
        assert_eq!(tree.focus_directional(FocusDirection::Left, Rect::new(0, 0, 10, 10), 1.0), None);
    }

    #[test]
    fn test_drag_session_updates_anchor_share() {
        let mut tree = LayoutTree::new();
        let a = tree.open_window(doc("a.md"));
        tree.open_window(doc("b.md"));
        let area = Rect::new(0, 0, 100, 20);
        let divider = resolve_dividers(tree.root().unwrap(), area, 1)[0];
        assert_eq!(divider.anchor, a);

        let drag = DragSession::begin(&tree, &divider, 50, 10).unwrap();
        assert!(drag.update(&mut tree, 75, 3));
        assert!(approx(tree.share_of(a).unwrap(), 0.75));
        // moves are measured from the press, not the previous move
        assert!(drag.update(&mut tree, 40, 3));
        assert!(approx(tree.share_of(a).unwrap(), 0.4));
        assert_eq!(drag.end(), a);
    }

    #[test]
    fn test_drag_session_zero_extent_is_noop() {
        let mut tree = LayoutTree::new();
        tree.open_window(doc("a.md"));
        tree.open_window(doc("b.md"));
        let divider = resolve_dividers(tree.root().unwrap(), Rect::new(0, 0, 0, 20), 1)[0];
        let drag = DragSession::begin(&tree, &divider, 0, 0).unwrap();
        assert!(!drag.update(&mut tree, 10, 0));
    }
}
