//! Remote control of a workspace: `[action, payload]` messages mapped onto
//! layout operations.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::{Axis, ContentDescriptor, ContentKind, PaneId};
use crate::workspace::Workspace;

/// One control instruction as it arrives on the wire.
///
/// Serialized as a two-element array. Deserialization also accepts the
/// object form `{"action": ..., "payload": ...}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "WireMessage")]
pub struct ControlMessage {
    pub action: String,
    pub payload: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireMessage {
    Pair(String, Value),
    Object {
        action: String,
        #[serde(default)]
        payload: Value,
    },
}

impl From<WireMessage> for ControlMessage {
    fn from(wire: WireMessage) -> Self {
        let (action, payload) = match wire {
            WireMessage::Pair(action, payload) => (action, payload),
            WireMessage::Object { action, payload } => (action, payload),
        };
        Self { action, payload }
    }
}

impl Serialize for ControlMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.action, &self.payload).serialize(serializer)
    }
}

impl ControlMessage {
    pub fn new(action: impl Into<String>, payload: Value) -> Self {
        Self {
            action: action.into(),
            payload,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCommand {
    Open(ContentDescriptor),
    Split { window: Option<PaneId>, axis: Axis },
    Close { window: Option<PaneId> },
    Focus { window: PaneId },
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("bad payload for {action}: {source}")]
    BadPayload {
        action: String,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct OpenPayload {
    #[serde(rename = "type", default)]
    kind: Option<ContentKind>,
    #[serde(default)]
    filename: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitPayload {
    #[serde(default)]
    window_id: Option<PaneId>,
    #[serde(default = "default_direction")]
    direction: Axis,
}

fn default_direction() -> Axis {
    Axis::Row
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClosePayload {
    #[serde(default)]
    window_id: Option<PaneId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FocusPayload {
    window_id: PaneId,
}

impl ControlCommand {
    pub fn parse(message: &ControlMessage) -> Result<Self, BridgeError> {
        let payload = match &message.payload {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        let bad = |source| BridgeError::BadPayload {
            action: message.action.clone(),
            source,
        };

        let command = match message.action.as_str() {
            "open_window" => {
                let p: OpenPayload = serde_json::from_value(payload).map_err(bad)?;
                ControlCommand::Open(ContentDescriptor {
                    kind: p.kind.unwrap_or(ContentKind::Document),
                    filename: p.filename,
                })
            }
            "split_window" => {
                let p: SplitPayload = serde_json::from_value(payload).map_err(bad)?;
                ControlCommand::Split {
                    window: p.window_id,
                    axis: p.direction,
                }
            }
            "close_window" => {
                let p: ClosePayload = serde_json::from_value(payload).map_err(bad)?;
                ControlCommand::Close { window: p.window_id }
            }
            "focus_window" => {
                let p: FocusPayload = serde_json::from_value(payload).map_err(bad)?;
                ControlCommand::Focus { window: p.window_id }
            }
            other => return Err(BridgeError::UnknownAction(other.to_string())),
        };
        Ok(command)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
}

impl From<bool> for Outcome {
    fn from(applied: bool) -> Self {
        if applied {
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }
}

/// Apply one control message. Never fails: anything that does not fit the
/// current layout is logged and ignored.
pub fn apply(workspace: &mut Workspace, message: &ControlMessage) -> Outcome {
    let command = match ControlCommand::parse(message) {
        Ok(command) => command,
        Err(e @ BridgeError::UnknownAction(_)) => {
            debug!(error = %e, "ignored control message");
            return Outcome::Ignored;
        }
        Err(e) => {
            warn!(error = %e, "ignored control message");
            return Outcome::Ignored;
        }
    };
    debug!(?command, "applying control command");

    let outcome = match command {
        ControlCommand::Open(content) => {
            workspace.open_window(content);
            Outcome::Applied
        }
        ControlCommand::Split { window, axis } => {
            if let Some(window) = window {
                if !workspace.focus_window(window) {
                    return Outcome::Ignored;
                }
            }
            workspace.split_focused(axis).is_some().into()
        }
        ControlCommand::Close { window } => match window.or(workspace.focused()) {
            Some(window) => workspace.close_window(window).into(),
            None => Outcome::Ignored,
        },
        ControlCommand::Focus { window } => workspace.focus_window(window).into(),
    };
    if outcome == Outcome::Ignored {
        debug!(action = %message.action, "control message did not match the layout");
    }
    outcome
}
