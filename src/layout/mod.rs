pub mod error;
pub mod geometry;
pub mod tree;

use serde::{Deserialize, Serialize};

pub use error::LayoutError;
pub use geometry::{Divider, ResolvedPane};
pub use tree::{DropSide, LayoutTree, SplitRequest};

pub type NodeId = uuid::Uuid;
pub type PaneId = uuid::Uuid;

/// Direction in which a split lays out its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Children left-to-right.
    #[serde(alias = "horizontal")]
    Row,
    /// Children top-to-bottom.
    #[serde(alias = "vertical")]
    Column,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[serde(alias = "markdown")]
    Document,
    Terminal,
}

/// What a pane shows. Owned by the content collaborators; the layout only copies it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDescriptor {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub filename: String,
}

impl ContentDescriptor {
    pub fn document(filename: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Document,
            filename: filename.into(),
        }
    }

    pub fn terminal(filename: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Terminal,
            filename: filename.into(),
        }
    }

    /// Whether the pane's body has to be fetched by the document loader.
    pub fn needs_load(&self) -> bool {
        self.kind == ContentKind::Document
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    pub id: PaneId,
    pub content: ContentDescriptor,
    pub weight: f64,
}

impl Pane {
    pub fn new(content: ContentDescriptor) -> Self {
        Self {
            id: PaneId::new_v4(),
            content,
            weight: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub id: NodeId,
    pub axis: Axis,
    pub children: Vec<LayoutNode>,
    pub weight: f64,
}

impl Split {
    pub fn new(axis: Axis, children: Vec<LayoutNode>) -> Self {
        Self {
            id: NodeId::new_v4(),
            axis,
            children,
            weight: 1.0,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.children.iter().map(LayoutNode::weight).sum()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.children.iter().position(|c| c.id() == id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayoutNode {
    Pane(Pane),
    Split(Split),
}

impl LayoutNode {
    pub fn id(&self) -> NodeId {
        match self {
            LayoutNode::Pane(p) => p.id,
            LayoutNode::Split(s) => s.id,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            LayoutNode::Pane(p) => p.weight,
            LayoutNode::Split(s) => s.weight,
        }
    }

    pub fn set_weight(&mut self, weight: f64) {
        match self {
            LayoutNode::Pane(p) => p.weight = weight,
            LayoutNode::Split(s) => s.weight = weight,
        }
    }

    pub fn as_pane(&self) -> Option<&Pane> {
        match self {
            LayoutNode::Pane(p) => Some(p),
            LayoutNode::Split(_) => None,
        }
    }

    pub fn as_split(&self) -> Option<&Split> {
        match self {
            LayoutNode::Split(s) => Some(s),
            LayoutNode::Pane(_) => None,
        }
    }

    /// Check if this subtree contains a node with the given id.
    pub fn contains(&self, target: NodeId) -> bool {
        self.find(target).is_some()
    }

    pub fn find(&self, target: NodeId) -> Option<&LayoutNode> {
        if self.id() == target {
            return Some(self);
        }
        match self {
            LayoutNode::Pane(_) => None,
            LayoutNode::Split(s) => s.children.iter().find_map(|c| c.find(target)),
        }
    }

    pub fn find_mut(&mut self, target: NodeId) -> Option<&mut LayoutNode> {
        if self.id() == target {
            return Some(self);
        }
        match self {
            LayoutNode::Pane(_) => None,
            LayoutNode::Split(s) => s.children.iter_mut().find_map(|c| c.find_mut(target)),
        }
    }

    pub fn find_pane(&self, target: PaneId) -> Option<&Pane> {
        self.find(target).and_then(LayoutNode::as_pane)
    }

    /// The split directly holding `target`, with the child's index.
    pub fn parent_of(&self, target: NodeId) -> Option<(&Split, usize)> {
        match self {
            LayoutNode::Pane(_) => None,
            LayoutNode::Split(s) => match s.position(target) {
                Some(index) => Some((s, index)),
                None => s.children.iter().find_map(|c| c.parent_of(target)),
            },
        }
    }

    pub fn parent_of_mut(&mut self, target: NodeId) -> Option<(&mut Split, usize)> {
        match self {
            LayoutNode::Pane(_) => None,
            LayoutNode::Split(s) => match s.position(target) {
                Some(index) => Some((s, index)),
                None => s.children.iter_mut().find_map(|c| c.parent_of_mut(target)),
            },
        }
    }

    /// Remove a descendant, returning it along with its former parent and index.
    /// The parent is left as-is even if it drops to one child; callers promote.
    pub fn take_child(&mut self, target: NodeId) -> Option<(LayoutNode, NodeId, usize)> {
        let (parent, index) = self.parent_of_mut(target)?;
        let parent_id = parent.id;
        let node = parent.children.remove(index);
        Some((node, parent_id, index))
    }

    /// Get all pane IDs in left-to-right, top-to-bottom order.
    pub fn pane_ids(&self) -> Vec<PaneId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<PaneId>) {
        match self {
            LayoutNode::Pane(p) => ids.push(p.id),
            LayoutNode::Split(s) => {
                for child in &s.children {
                    child.collect_ids(ids);
                }
            }
        }
    }

    pub fn panes(&self) -> Vec<&Pane> {
        let mut panes = Vec::new();
        self.collect_panes(&mut panes);
        panes
    }

    fn collect_panes<'a>(&'a self, panes: &mut Vec<&'a Pane>) {
        match self {
            LayoutNode::Pane(p) => panes.push(p),
            LayoutNode::Split(s) => {
                for child in &s.children {
                    child.collect_panes(panes);
                }
            }
        }
    }

    pub fn first_pane(&self) -> PaneId {
        match self {
            LayoutNode::Pane(p) => p.id,
            LayoutNode::Split(s) => match s.children.first() {
                Some(child) => child.first_pane(),
                None => s.id,
            },
        }
    }

    pub fn last_pane(&self) -> PaneId {
        match self {
            LayoutNode::Pane(p) => p.id,
            LayoutNode::Split(s) => match s.children.last() {
                Some(child) => child.last_pane(),
                None => s.id,
            },
        }
    }

    /// Promote every split that has dropped to a single child, bottom-up.
    /// Empty splits are dropped from their parent. The promoted child inherits
    /// the weight of the split it replaces so its slot keeps the same share.
    pub fn normalize(&mut self) {
        if let LayoutNode::Split(s) = self {
            for child in s.children.iter_mut() {
                child.normalize();
            }
            s.children
                .retain(|c| !matches!(c, LayoutNode::Split(inner) if inner.children.is_empty()));
        }
        self.promote();
    }

    /// Replace a single-child split with its child. Returns true if it did.
    pub fn promote(&mut self) -> bool {
        let LayoutNode::Split(s) = self else {
            return false;
        };
        if s.children.len() != 1 {
            return false;
        }
        let weight = s.weight;
        let Some(mut child) = s.children.pop() else {
            return false;
        };
        child.set_weight(weight);
        *self = child;
        true
    }

    /// Set every weight in the subtree to 1.
    pub fn equalize(&mut self) {
        self.set_weight(1.0);
        if let LayoutNode::Split(s) = self {
            for child in s.children.iter_mut() {
                child.equalize();
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn pane(name: &str) -> LayoutNode {
        LayoutNode::Pane(Pane::new(ContentDescriptor::document(name)))
    }

    pub fn split(axis: Axis, children: Vec<LayoutNode>) -> LayoutNode {
        LayoutNode::Split(Split::new(axis, children))
    }

    /// root row → [a, column → [b, row → [c, d]]]
    pub fn build_nested() -> (LayoutNode, [PaneId; 4]) {
        let (a, b, c, d) = (pane("a.md"), pane("b.md"), pane("c.md"), pane("d.md"));
        let ids = [a.id(), b.id(), c.id(), d.id()];
        let node = split(
            Axis::Row,
            vec![a, split(Axis::Column, vec![b, split(Axis::Row, vec![c, d])])],
        );
        (node, ids)
    }

    #[test]
    fn test_pane_ids_ordering() {
        let (node, ids) = build_nested();
        assert_eq!(node.pane_ids(), ids.to_vec());
    }

    #[test]
    fn test_contains_and_find_pane() {
        let (node, [a, _, _, d]) = build_nested();
        assert!(node.contains(a));
        assert!(node.contains(d));
        assert!(!node.contains(PaneId::new_v4()));
        assert_eq!(node.find_pane(d).unwrap().content.filename, "d.md");
    }

    #[test]
    fn test_find_pane_ignores_splits() {
        let (node, _) = build_nested();
        assert!(node.find_pane(node.id()).is_none());
    }

    #[test]
    fn test_parent_of_reports_index() {
        let (node, [a, b, c, d]) = build_nested();
        let (root, index) = node.parent_of(a).unwrap();
        assert_eq!(root.id, node.id());
        assert_eq!(index, 0);
        let (inner, index) = node.parent_of(d).unwrap();
        assert_eq!(inner.axis, Axis::Row);
        assert_eq!(index, 1);
        assert_eq!(node.parent_of(b).unwrap().1, 0);
        assert!(node.parent_of(node.id()).is_none());
        assert_eq!(node.parent_of(c).unwrap().0.children.len(), 2);
    }

    #[test]
    fn test_first_and_last_pane() {
        let (node, [a, _, _, d]) = build_nested();
        assert_eq!(node.first_pane(), a);
        assert_eq!(node.last_pane(), d);
    }

    #[test]
    fn test_take_child_leaves_parent_for_caller() {
        let (mut node, [_, _, c, d]) = build_nested();
        let (taken, _, index) = node.take_child(c).unwrap();
        assert_eq!(taken.id(), c);
        assert_eq!(index, 0);
        let (parent, _) = node.parent_of(d).unwrap();
        assert_eq!(parent.children.len(), 1);
    }

    #[test]
    fn test_normalize_promotes_single_child() {
        let (mut node, [a, b, c, d]) = build_nested();
        node.take_child(c);
        node.normalize();
        // inner row collapsed, d now sits directly in the column
        let (parent, index) = node.parent_of(d).unwrap();
        assert_eq!(parent.axis, Axis::Column);
        assert_eq!(index, 1);
        assert_eq!(node.pane_ids(), vec![a, b, d]);
    }

    #[test]
    fn test_normalize_cascades_to_root() {
        let a = pane("a.md");
        let a_id = a.id();
        let mut node = split(Axis::Row, vec![split(Axis::Column, vec![a])]);
        node.normalize();
        assert!(matches!(node, LayoutNode::Pane(ref p) if p.id == a_id));
    }

    #[test]
    fn test_promoted_child_inherits_weight() {
        let (mut node, [_, b, _, _]) = build_nested();
        if let LayoutNode::Split(root) = &mut node {
            root.children[1].set_weight(3.0);
        }
        node.take_child(b);
        node.normalize();
        let inner = node.as_split().unwrap().children[1].as_split().unwrap();
        assert_eq!(inner.axis, Axis::Row);
        assert!((inner.weight - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_equalize_deep() {
        let (mut node, [_, _, c, _]) = build_nested();
        if let Some(n) = node.find_mut(c) {
            n.set_weight(0.2);
        }
        node.equalize();
        fn check(node: &LayoutNode) {
            assert!((node.weight() - 1.0).abs() < f64::EPSILON);
            if let LayoutNode::Split(s) = node {
                s.children.iter().for_each(check);
            }
        }
        check(&node);
    }

    #[test]
    fn test_node_serialization_shape() {
        let a = pane("readme.md");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["kind"], "pane");
        assert_eq!(json["content"]["type"], "document");
        assert_eq!(json["content"]["filename"], "readme.md");
        assert_eq!(json["weight"], 1.0);
    }

    #[test]
    fn test_axis_accepts_legacy_names() {
        let axis: Axis = serde_json::from_str("\"horizontal\"").unwrap();
        assert_eq!(axis, Axis::Row);
        let axis: Axis = serde_json::from_str("\"vertical\"").unwrap();
        assert_eq!(axis, Axis::Column);
        let kind: ContentKind = serde_json::from_str("\"markdown\"").unwrap();
        assert_eq!(kind, ContentKind::Document);
    }
}
