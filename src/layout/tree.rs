use std::collections::HashSet;

use tracing::debug;

use super::{Axis, ContentDescriptor, LayoutError, LayoutNode, NodeId, Pane, PaneId, Split};

/// Where a moved pane lands relative to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl DropSide {
    pub fn axis(self) -> Axis {
        match self {
            DropSide::Left | DropSide::Right => Axis::Row,
            DropSide::Top | DropSide::Bottom => Axis::Column,
        }
    }

    fn is_before(self) -> bool {
        matches!(self, DropSide::Left | DropSide::Top)
    }
}

/// First half of a two-phase split: where the new pane will go.
///
/// When `wrap` is set the split `split` does not exist yet; it is created
/// around `source` by [`LayoutTree::create_window_in_split`] so the tree never
/// holds a single-child split between the two phases.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitRequest {
    pub split: NodeId,
    pub index: usize,
    pub axis: Axis,
    pub source: PaneId,
    pub content: ContentDescriptor,
    pub wrap: bool,
}

/// The layout tree plus the focus pointer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutTree {
    root: Option<LayoutNode>,
    focused: Option<PaneId>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from restored parts, checking every invariant.
    pub fn from_parts(root: Option<LayoutNode>, focused: Option<PaneId>) -> Result<Self, LayoutError> {
        let tree = Self { root, focused };
        tree.validate()?;
        Ok(tree)
    }

    pub fn root(&self) -> Option<&LayoutNode> {
        self.root.as_ref()
    }

    pub(crate) fn root_mut(&mut self) -> Option<&mut LayoutNode> {
        self.root.as_mut()
    }

    pub fn focused(&self) -> Option<PaneId> {
        self.focused
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn pane_ids(&self) -> Vec<PaneId> {
        self.root.as_ref().map(LayoutNode::pane_ids).unwrap_or_default()
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.root.as_ref()?.find_pane(id)
    }

    pub fn contains_pane(&self, id: PaneId) -> bool {
        self.pane(id).is_some()
    }

    pub fn focused_pane(&self) -> Option<&Pane> {
        self.pane(self.focused?)
    }

    /// Open a pane next to the focused one, or as the root of an empty tree.
    pub fn open_window(&mut self, content: ContentDescriptor) -> PaneId {
        let pane = Pane::new(content);
        let id = pane.id;

        match self.root.take() {
            None => self.root = Some(LayoutNode::Pane(pane)),
            Some(mut root) => {
                let anchor = self
                    .focused
                    .filter(|f| root.find_pane(*f).is_some())
                    .unwrap_or_else(|| root.first_pane());
                let parent = root.parent_of(anchor).map(|(s, index)| (s.id, index));
                match parent {
                    Some((parent_id, index)) => {
                        if let Some(LayoutNode::Split(s)) = root.find_mut(parent_id) {
                            s.children.insert(index + 1, LayoutNode::Pane(pane));
                        }
                    }
                    None => {
                        // anchor is the root pane
                        root = LayoutNode::Split(Split::new(
                            Axis::Row,
                            vec![root, LayoutNode::Pane(pane)],
                        ));
                    }
                }
                self.root = Some(root);
            }
        }

        self.focused = Some(id);
        debug!(pane = %id, "opened window");
        id
    }

    /// Close a pane. Unknown ids are ignored. Returns true if a pane was removed.
    pub fn close_window(&mut self, id: PaneId) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        if root.find_pane(id).is_none() {
            return false;
        }

        if root.id() == id {
            self.root = None;
            self.focused = None;
            debug!(pane = %id, "closed last window");
            return true;
        }

        let Some((_, parent_id, index)) = root.take_child(id) else {
            return false;
        };

        // The sibling that slides into the removed slot, else the one before it.
        let next_focus = root
            .find(parent_id)
            .and_then(LayoutNode::as_split)
            .and_then(|parent| match parent.children.get(index) {
                Some(next) => Some(next.first_pane()),
                None => index
                    .checked_sub(1)
                    .and_then(|i| parent.children.get(i))
                    .map(LayoutNode::last_pane),
            });

        root.normalize();
        self.focused = next_focus.or_else(|| self.root.as_ref().map(LayoutNode::first_pane));
        debug!(pane = %id, focus = ?self.focused, "closed window");
        true
    }

    /// Focus a pane. Unknown ids are ignored.
    pub fn focus_window(&mut self, id: PaneId) -> bool {
        if !self.contains_pane(id) {
            return false;
        }
        self.focused = Some(id);
        true
    }

    /// Phase one of a split: decide where a new pane goes next to the focused
    /// pane. Nothing is inserted until [`create_window_in_split`](Self::create_window_in_split).
    pub fn split_window(&self, axis: Axis) -> Option<SplitRequest> {
        let root = self.root.as_ref()?;
        let source = root.find_pane(self.focused?)?;

        let request = match root.parent_of(source.id) {
            Some((parent, index)) if parent.axis == axis => SplitRequest {
                split: parent.id,
                index: index + 1,
                axis,
                source: source.id,
                content: source.content.clone(),
                wrap: false,
            },
            _ => SplitRequest {
                split: NodeId::new_v4(),
                index: 1,
                axis,
                source: source.id,
                content: source.content.clone(),
                wrap: true,
            },
        };
        debug!(split = %request.split, index = request.index, wrap = request.wrap, "split requested");
        Some(request)
    }

    /// Phase two of a split: insert the new pane where the request says.
    pub fn create_window_in_split(
        &mut self,
        request: &SplitRequest,
        content: ContentDescriptor,
    ) -> Result<PaneId, LayoutError> {
        let stale = || LayoutError::StaleInsertionPoint(request.split);
        let root = self.root.as_mut().ok_or_else(stale)?;
        let pane = Pane::new(content);
        let id = pane.id;

        if request.wrap {
            if root.contains(request.split) || root.find_pane(request.source).is_none() {
                return Err(stale());
            }
            let target = root.find_mut(request.source).ok_or_else(stale)?;
            let mut source = target.clone();
            let weight = source.weight();
            source.set_weight(1.0);
            let index = request.index.min(1);
            let mut children = vec![source];
            children.insert(index, LayoutNode::Pane(pane));
            *target = LayoutNode::Split(Split {
                id: request.split,
                axis: request.axis,
                children,
                weight,
            });
        } else {
            let Some(LayoutNode::Split(split)) = root.find_mut(request.split) else {
                return Err(stale());
            };
            if split.axis != request.axis || request.index > split.children.len() {
                return Err(stale());
            }
            split.children.insert(request.index, LayoutNode::Pane(pane));
        }

        self.focused = Some(id);
        debug!(pane = %id, split = %request.split, "created window in split");
        Ok(id)
    }

    /// Move `source` next to `target`. No-op if they are the same pane or
    /// either is missing.
    pub fn move_window_to_position(&mut self, source: PaneId, target: PaneId, side: DropSide) -> bool {
        if source == target || !self.contains_pane(source) || !self.contains_pane(target) {
            return false;
        }
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        // Both panes exist and differ, so the root is a split holding source.
        let Some((mut moved, _, _)) = root.take_child(source) else {
            return false;
        };
        root.normalize();
        moved.set_weight(1.0);

        let axis = side.axis();
        let parent = root.parent_of(target).map(|(s, index)| (s.id, s.axis, index));
        match parent {
            Some((parent_id, parent_axis, index)) if parent_axis == axis => {
                let at = if side.is_before() { index } else { index + 1 };
                if let Some(LayoutNode::Split(s)) = root.find_mut(parent_id) {
                    s.children.insert(at, moved);
                }
            }
            _ => {
                if let Some(node) = root.find_mut(target) {
                    let mut target_node = node.clone();
                    let weight = target_node.weight();
                    target_node.set_weight(1.0);
                    let children = if side.is_before() {
                        vec![moved, target_node]
                    } else {
                        vec![target_node, moved]
                    };
                    let mut wrapper = Split::new(axis, children);
                    wrapper.weight = weight;
                    *node = LayoutNode::Split(wrapper);
                }
            }
        }

        root.normalize();
        self.focused = Some(source);
        debug!(pane = %source, target = %target, ?side, "moved window");
        true
    }

    /// Reset every weight to 1.
    pub fn equalize(&mut self) {
        if let Some(root) = self.root.as_mut() {
            root.equalize();
        }
    }

    /// Check the structural invariants: unique ids, splits with at least two
    /// children, positive finite weights, focus on an existing pane.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let Some(root) = &self.root else {
            if let Some(focus) = self.focused {
                return Err(LayoutError::corrupt(format!("focus {focus} set on an empty layout")));
            }
            return Ok(());
        };

        let mut seen = HashSet::new();
        validate_node(root, &mut seen)?;

        if let Some(focus) = self.focused {
            if root.find_pane(focus).is_none() {
                return Err(LayoutError::corrupt(format!("focused window {focus} is not a pane in the layout")));
            }
        }
        Ok(())
    }
}

fn validate_node(node: &LayoutNode, seen: &mut HashSet<NodeId>) -> Result<(), LayoutError> {
    if !seen.insert(node.id()) {
        return Err(LayoutError::corrupt(format!("duplicate node id {}", node.id())));
    }
    let weight = node.weight();
    if !weight.is_finite() || weight <= 0.0 {
        return Err(LayoutError::corrupt(format!("node {} has non-positive weight {weight}", node.id())));
    }
    if let LayoutNode::Split(s) = node {
        if s.children.len() < 2 {
            return Err(LayoutError::corrupt(format!(
                "split {} has {} children",
                s.id,
                s.children.len()
            )));
        }
        for child in &s.children {
            validate_node(child, seen)?;
        }
    }
    Ok(())
}
