use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};

use crate::bridge::ControlMessage;
use crate::layout::{ContentDescriptor, PaneId};

/// Messages from a client to the layout daemon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientRequest {
    Control(ControlMessage),
    Resolve { width: u16, height: u16 },
    /// Body of a document pane, if it has loaded.
    Read { window_id: PaneId },
    /// Save under `name`, or under the workspace name.
    Save { name: Option<String> },
    Load { name: String },
    ListLayouts,
    Ping,
}

/// Messages from the daemon back to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerResponse {
    Ok,
    Control { applied: bool },
    Layout {
        panes: Vec<ResolvedPaneInfo>,
        focused: Option<PaneId>,
    },
    Content { text: Option<String> },
    Layouts(Vec<String>),
    Error(String),
    Pong,
}

/// A pane and the rectangle it occupies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPaneInfo {
    pub id: PaneId,
    pub content: ContentDescriptor,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl ResolvedPaneInfo {
    pub fn new(id: PaneId, content: ContentDescriptor, rect: Rect) -> Self {
        Self {
            id,
            content,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}
