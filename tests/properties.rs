use proptest::prelude::*;
use ratatui::layout::Rect;

use scriptbook::interaction::{MAX_SHARE, MIN_SHARE};
use scriptbook::layout::geometry;
use scriptbook::session::SavedLayout;
use scriptbook::{Axis, ContentDescriptor, DropSide, FocusDirection, LayoutTree};

/// Panes are addressed by index into the current pane list, modulo its length.
#[derive(Clone, Debug)]
enum Op {
    Open,
    Split(Axis),
    Close(usize),
    Focus(usize),
    FocusDirectional(FocusDirection),
    Move { source: usize, target: usize, side: DropSide },
    Resize { pane: usize, share: f64 },
    Equalize,
}

fn arbitrary_axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::Row), Just(Axis::Column)]
}

fn arbitrary_side() -> impl Strategy<Value = DropSide> {
    prop_oneof![
        Just(DropSide::Left),
        Just(DropSide::Right),
        Just(DropSide::Top),
        Just(DropSide::Bottom),
    ]
}

fn arbitrary_direction() -> impl Strategy<Value = FocusDirection> {
    prop_oneof![
        Just(FocusDirection::Left),
        Just(FocusDirection::Right),
        Just(FocusDirection::Up),
        Just(FocusDirection::Down),
    ]
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Open),
        4 => arbitrary_axis().prop_map(Op::Split),
        2 => any::<usize>().prop_map(Op::Close),
        1 => any::<usize>().prop_map(Op::Focus),
        1 => arbitrary_direction().prop_map(Op::FocusDirectional),
        2 => (any::<usize>(), any::<usize>(), arbitrary_side())
            .prop_map(|(source, target, side)| Op::Move { source, target, side }),
        2 => (any::<usize>(), -1.0f64..2.0).prop_map(|(pane, share)| Op::Resize { pane, share }),
        1 => Just(Op::Equalize),
    ]
}

fn pick(tree: &LayoutTree, index: usize) -> Option<uuid::Uuid> {
    let panes = tree.pane_ids();
    (!panes.is_empty()).then(|| panes[index % panes.len()])
}

const AREA: Rect = Rect {
    x: 0,
    y: 0,
    width: 160,
    height: 48,
};

fn apply(tree: &mut LayoutTree, op: &Op) {
    match *op {
        Op::Open => {
            tree.open_window(ContentDescriptor::document("a.md"));
        }
        Op::Split(axis) => {
            if let Some(request) = tree.split_window(axis) {
                tree.create_window_in_split(&request, ContentDescriptor::terminal("shell"))
                    .unwrap();
            }
        }
        Op::Close(i) => {
            if let Some(id) = pick(tree, i) {
                assert!(tree.close_window(id));
            }
        }
        Op::Focus(i) => {
            if let Some(id) = pick(tree, i) {
                assert!(tree.focus_window(id));
            }
        }
        Op::FocusDirectional(direction) => {
            tree.focus_directional(direction, AREA, 1.0);
        }
        Op::Move { source, target, side } => {
            if let (Some(source), Some(target)) = (pick(tree, source), pick(tree, target)) {
                tree.move_window_to_position(source, target, side);
            }
        }
        Op::Resize { pane, share } => {
            if let Some(id) = pick(tree, pane) {
                tree.resize_by_proportion(id, share);
            }
        }
        Op::Equalize => tree.equalize(),
    }
}

fn build(ops: &[Op]) -> LayoutTree {
    let mut tree = LayoutTree::new();
    for op in ops {
        apply(&mut tree, op);
        tree.validate().unwrap();
    }
    tree
}

proptest! {
    #[test]
    fn invariants_hold_after_any_operation_sequence(ops in prop::collection::vec(arbitrary_op(), 0..40)) {
        let tree = build(&ops);
        match tree.root() {
            None => prop_assert_eq!(tree.focused(), None),
            Some(_) => prop_assert!(tree.focused_pane().is_some()),
        }
    }

    #[test]
    fn resolved_panes_tile_the_area(
        ops in prop::collection::vec(arbitrary_op(), 1..30),
        width in 1u16..400,
        height in 1u16..200,
    ) {
        let tree = build(&ops);
        if let Some(root) = tree.root() {
            let area = Rect::new(3, 2, width, height);
            let resolved = geometry::resolve_layout(root, area);
            prop_assert_eq!(resolved.len(), tree.pane_ids().len());

            let covered: u32 = resolved.iter().map(|(_, r)| r.width as u32 * r.height as u32).sum();
            prop_assert_eq!(covered, width as u32 * height as u32);
            for (i, (_, a)) in resolved.iter().enumerate() {
                prop_assert!(area.contains(a.as_position()) || a.area() == 0);
                for (_, b) in &resolved[i + 1..] {
                    prop_assert!(!a.intersects(*b));
                }
            }
        }
    }

    #[test]
    fn resize_share_is_clamped(ops in prop::collection::vec(arbitrary_op(), 1..30), pane in any::<usize>(), share in -5.0f64..5.0) {
        let mut tree = build(&ops);
        if let Some(id) = pick(&tree, pane) {
            if tree.resize_by_proportion(id, share) {
                let got = tree.share_of(id).unwrap();
                let want = share.clamp(MIN_SHARE, MAX_SHARE);
                prop_assert!((got - want).abs() < 1e-9, "share {} != {}", got, want);
            }
            tree.validate().unwrap();
        }
    }

    #[test]
    fn saved_layouts_restore_identically(ops in prop::collection::vec(arbitrary_op(), 0..30)) {
        let tree = build(&ops);
        let json = SavedLayout::capture(&tree, "prop").to_json().unwrap();
        let restored = SavedLayout::from_json(&json).unwrap().restore().unwrap();
        prop_assert_eq!(restored.name, "prop");
        prop_assert_eq!(restored.tree, tree);
    }

    #[test]
    fn closing_the_focused_pane_moves_focus_to_a_survivor(ops in prop::collection::vec(arbitrary_op(), 1..30)) {
        let mut tree = build(&ops);
        if let Some(focused) = tree.focused() {
            prop_assert!(tree.close_window(focused));
            prop_assert!(!tree.contains_pane(focused));
            match tree.focused() {
                Some(next) => prop_assert!(tree.contains_pane(next)),
                None => prop_assert!(tree.is_empty()),
            }
        }
    }
}
