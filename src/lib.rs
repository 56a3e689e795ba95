//! Tiling window layout engine for notebook-style documents and terminals.
//!
//! The layout is an n-ary tree of weighted splits whose leaves are panes.
//! [`layout`] holds the tree and its geometry, [`interaction`] turns pointer
//! and keyboard gestures into tree updates, and [`session`] persists it.
//! Everything else wires the engine to content, a control socket and a
//! terminal preview.

pub mod app;
pub mod bridge;
pub mod config;
pub mod content;
pub mod event;
pub mod interaction;
pub mod layout;
pub mod server;
pub mod session;
pub mod tui;
pub mod ui;
pub mod workspace;

pub use interaction::{DragSession, FocusDirection};
pub use layout::{Axis, ContentDescriptor, ContentKind, DropSide, LayoutError, LayoutNode, LayoutTree, PaneId};
pub use workspace::{PaneEvent, Workspace};
