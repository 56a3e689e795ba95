pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::content::ContentRequest;
use crate::layout::{LayoutError, LayoutNode, LayoutTree, PaneId};

/// A named, persisted layout: the tree as plain records plus the focus pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLayout {
    pub name: String,
    pub root_container: Option<LayoutNode>,
    pub focused_window_id: Option<PaneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A layout brought back to life, with the loads its document panes need.
#[derive(Clone, Debug, PartialEq)]
pub struct Restored {
    pub name: String,
    pub tree: LayoutTree,
    pub content_requests: Vec<ContentRequest>,
}

impl SavedLayout {
    pub fn capture(tree: &LayoutTree, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_container: tree.root().cloned(),
            focused_window_id: tree.focused(),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document. Shape errors are reported as corrupt layouts.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| LayoutError::corrupt(format!("invalid JSON: {e}")))?;
        // Both may be null, but neither may be left out.
        for key in ["rootContainer", "focusedWindowId"] {
            if value.get(key).is_none() {
                return Err(LayoutError::corrupt(format!("missing field `{key}`")));
            }
        }
        serde_json::from_value(value).map_err(|e| LayoutError::corrupt(e.to_string()))
    }

    /// Validate the document and rebuild the live tree.
    pub fn restore(self) -> Result<Restored, LayoutError> {
        let focused = match (&self.root_container, self.focused_window_id) {
            (Some(root), None) => Some(root.first_pane()),
            (_, focused) => focused,
        };
        let tree = LayoutTree::from_parts(self.root_container, focused).inspect_err(|e| {
            warn!(layout = %self.name, error = %e, "rejected saved layout");
        })?;

        let content_requests = tree
            .root()
            .map(|root| root.panes().into_iter().filter_map(ContentRequest::for_pane).collect())
            .unwrap_or_default();
        debug!(layout = %self.name, panes = tree.pane_ids().len(), "restored layout");

        Ok(Restored {
            name: self.name,
            tree,
            content_requests,
        })
    }
}

/// Snapshot `tree` under `name`.
pub fn serialize(tree: &LayoutTree, name: &str) -> SavedLayout {
    SavedLayout::capture(tree, name)
}

/// Parse and validate a document in one step.
pub fn deserialize(json: &str) -> Result<Restored, LayoutError> {
    SavedLayout::from_json(json)?.restore()
}
