//! Turns a layout tree into absolute rectangles.
//!
//! Splits are partitioned with cumulative rounding: child `i` spans from
//! `round(E * W<i / W)` to `round(E * W<=i / W)`, so consecutive children
//! share their boundary and the last child always ends on the outer edge.

use ratatui::layout::Rect;

use super::{Axis, LayoutNode, NodeId, PaneId};

pub type ResolvedPane = (PaneId, Rect);

/// Boundary between two consecutive children of a split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Divider {
    pub axis: Axis,
    pub rect: Rect,
    /// Child before the boundary; resizing goes through this node.
    pub anchor: NodeId,
    /// Split that owns the boundary.
    pub split: NodeId,
    /// Coordinate of the boundary along `axis`.
    pub position: u16,
    /// Start and extent of the owning split along `axis`.
    pub origin: u16,
    pub extent: u16,
}

/// Resolve the layout tree into a flat list of (PaneId, Rect) pairs.
pub fn resolve_layout(node: &LayoutNode, area: Rect) -> Vec<ResolvedPane> {
    let mut result = Vec::new();
    resolve_inner(node, area, &mut result);
    result
}

fn resolve_inner(node: &LayoutNode, area: Rect, result: &mut Vec<ResolvedPane>) {
    match node {
        LayoutNode::Pane(p) => result.push((p.id, area)),
        LayoutNode::Split(s) => {
            let weights: Vec<f64> = s.children.iter().map(LayoutNode::weight).collect();
            for (child, rect) in s.children.iter().zip(partition(s.axis, area, &weights)) {
                resolve_inner(child, rect, result);
            }
        }
    }
}

/// Split `area` along `axis` into one rect per weight, tiling it exactly.
pub fn partition(axis: Axis, area: Rect, weights: &[f64]) -> Vec<Rect> {
    let total: f64 = weights.iter().sum();
    let (start, extent) = span(axis, area);
    let mut rects = Vec::with_capacity(weights.len());
    let mut acc = 0.0;
    let mut from = 0u16;

    for (i, w) in weights.iter().enumerate() {
        acc += w;
        let to = if i + 1 == weights.len() || total <= 0.0 {
            extent
        } else {
            ((extent as f64) * acc / total).round().clamp(from as f64, extent as f64) as u16
        };
        rects.push(with_span(axis, area, start + from, to - from));
        from = to;
    }
    rects
}

/// Every divider in the tree, outermost splits first.
pub fn resolve_dividers(node: &LayoutNode, area: Rect, thickness: u16) -> Vec<Divider> {
    let mut result = Vec::new();
    dividers_inner(node, area, thickness, &mut result);
    result
}

fn dividers_inner(node: &LayoutNode, area: Rect, thickness: u16, result: &mut Vec<Divider>) {
    let LayoutNode::Split(s) = node else {
        return;
    };
    let weights: Vec<f64> = s.children.iter().map(LayoutNode::weight).collect();
    let rects = partition(s.axis, area, &weights);
    let (origin, extent) = span(s.axis, area);

    for (pair, before) in rects.windows(2).zip(s.children.iter()) {
        let (position, _) = span(s.axis, pair[1]);
        let lo = position.saturating_sub(thickness / 2).max(origin);
        let hi = lo.saturating_add(thickness).min(origin + extent);
        result.push(Divider {
            axis: s.axis,
            rect: with_span(s.axis, area, lo, hi - lo),
            anchor: before.id(),
            split: s.id,
            position,
            origin,
            extent,
        });
    }

    for (child, rect) in s.children.iter().zip(rects) {
        dividers_inner(child, rect, thickness, result);
    }
}

/// The divider under the pointer, innermost first so nested boundaries win.
pub fn hit_test_divider(node: &LayoutNode, area: Rect, x: u16, y: u16, thickness: u16) -> Option<Divider> {
    resolve_dividers(node, area, thickness.max(1))
        .into_iter()
        .rev()
        .find(|d| contains(d.rect, x, y))
}

/// The pane under the pointer.
pub fn pane_at(node: &LayoutNode, area: Rect, x: u16, y: u16) -> Option<PaneId> {
    resolve_layout(node, area)
        .into_iter()
        .find(|(_, rect)| contains(*rect, x, y))
        .map(|(id, _)| id)
}

pub fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Start and length of `area` along `axis`.
pub fn span(axis: Axis, area: Rect) -> (u16, u16) {
    match axis {
        Axis::Row => (area.x, area.width),
        Axis::Column => (area.y, area.height),
    }
}

fn with_span(axis: Axis, area: Rect, start: u16, len: u16) -> Rect {
    match axis {
        Axis::Row => Rect::new(start, area.y, len, area.height),
        Axis::Column => Rect::new(area.x, start, area.width, len),
    }
}
