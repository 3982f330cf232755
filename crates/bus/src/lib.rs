//! Events sent by the authoring tool, and the channel that carries them.
//!
//! Payload shapes follow the `detail` objects of the `aue:*` DOM events. Every
//! field is optional and unknown fields are ignored: different event kinds fill
//! different paths, and the consumer checks them in order.

use core_types::EventType;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub container: Option<Container>,
}

/// Move destination (`request.to`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub container: Option<Container>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub to: Option<Destination>,
}

/// One re-rendered fragment. Only the first update of a response is used.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeResponse {
    #[serde(default)]
    pub updates: Vec<Update>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetail {
    #[serde(default)]
    pub request: Option<ChangeRequest>,
    #[serde(default)]
    pub response: Option<ChangeResponse>,
}

impl ChangeDetail {
    /// Detail whose request targets `resource` directly.
    pub fn targeting(resource: &str) -> Self {
        Self {
            request: Some(ChangeRequest {
                target: Some(Target {
                    resource: Some(resource.to_string()),
                    container: None,
                }),
                to: None,
            }),
            response: None,
        }
    }

    /// Detail whose request names `resource` as the target container.
    pub fn in_container(resource: &str) -> Self {
        Self {
            request: Some(ChangeRequest {
                target: Some(Target {
                    resource: None,
                    container: Some(Container {
                        resource: Some(resource.to_string()),
                    }),
                }),
                to: None,
            }),
            response: None,
        }
    }

    /// Detail for a move into the container `resource`.
    pub fn moved_to(resource: &str) -> Self {
        Self {
            request: Some(ChangeRequest {
                target: None,
                to: Some(Destination {
                    container: Some(Container {
                        resource: Some(resource.to_string()),
                    }),
                }),
            }),
            response: None,
        }
    }

    pub fn with_update(mut self, content: &str) -> Self {
        self.response
            .get_or_insert_with(ChangeResponse::default)
            .updates
            .push(Update {
                content: Some(content.to_string()),
            });
        self
    }

    pub fn updates(&self) -> &[Update] {
        self.response
            .as_ref()
            .map(|r| r.updates.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Patch,
    Update,
    Add,
    Move,
    Remove,
}

impl ChangeKind {
    pub fn event_type(self) -> EventType {
        match self {
            ChangeKind::Patch => EventType::ContentPatch,
            ChangeKind::Update => EventType::ContentUpdate,
            ChangeKind::Add => EventType::ContentAdd,
            ChangeKind::Move => EventType::ContentMove,
            ChangeKind::Remove => EventType::ContentRemove,
        }
    }

    pub fn from_event_type(ty: EventType) -> Option<Self> {
        Some(match ty {
            EventType::ContentPatch => ChangeKind::Patch,
            EventType::ContentUpdate => ChangeKind::Update,
            EventType::ContentAdd => ChangeKind::Add,
            EventType::ContentMove => ChangeKind::Move,
            EventType::ContentRemove => ChangeKind::Remove,
            EventType::UiSelect => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub detail: ChangeDetail,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, detail: ChangeDetail) -> Self {
        Self { kind, detail }
    }
}

/// `aue:ui-select` detail: the selected component's resource and whether it
/// became selected (or was deselected).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectDetail {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    Change(ChangeEvent),
    Select(SelectDetail),
}

impl EditorEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            EditorEvent::Change(change) => change.kind.event_type(),
            EditorEvent::Select(_) => EventType::UiSelect,
        }
    }

    pub fn from_wire(event_type: &str, detail: serde_json::Value) -> Result<Self, WireError> {
        let ty = EventType::from_wire_name(event_type)
            .ok_or_else(|| WireError::UnknownType(event_type.to_string()))?;
        let detail = if detail.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            detail
        };
        Ok(match ChangeKind::from_event_type(ty) {
            Some(kind) => {
                EditorEvent::Change(ChangeEvent::new(kind, serde_json::from_value(detail)?))
            }
            None => EditorEvent::Select(serde_json::from_value(detail)?),
        })
    }
}

/// One serialized event as recorded from the page: `{"type": ..., "detail": ...}`.
#[derive(Clone, Debug, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl TryFrom<WireEvent> for EditorEvent {
    type Error = WireError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        EditorEvent::from_wire(&wire.event_type, wire.detail)
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("unknown event type `{0}`")]
    UnknownType(String),
    #[error("malformed event detail: {0}")]
    Detail(#[from] serde_json::Error),
}

/// In-process event channel. Producers hold cloned senders; the dispatcher
/// drains the receiver between patches.
pub struct Bus {
    tx: Sender<EditorEvent>,
    rx: Receiver<EditorEvent>,
}

impl Bus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<EditorEvent> {
        self.tx.clone()
    }

    pub fn post(&self, event: EditorEvent) {
        // The receiver lives as long as `self`, so this cannot fail.
        let _ = self.tx.send(event);
    }

    pub fn try_next(&self) -> Option<EditorEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_update_detail_and_ignores_unknown_fields() {
        let event = EditorEvent::from_wire(
            "aue:content-update",
            json!({
                "request": {
                    "connections": [{"name": "aemconnection"}],
                    "target": {"resource": "urn:r1", "prop": "title"}
                },
                "response": {"updates": [{"resource": "urn:r1", "content": "<p>x</p>"}]}
            }),
        )
        .unwrap();
        let EditorEvent::Change(change) = event else {
            panic!("expected change event");
        };
        assert_eq!(change.kind, ChangeKind::Update);
        let target = change.detail.request.unwrap().target.unwrap();
        assert_eq!(target.resource.as_deref(), Some("urn:r1"));
        assert_eq!(
            change.detail.response.unwrap().updates[0].content.as_deref(),
            Some("<p>x</p>")
        );
    }

    #[test]
    fn missing_response_reads_as_no_updates() {
        let event = EditorEvent::from_wire("aue:content-remove", serde_json::Value::Null).unwrap();
        let EditorEvent::Change(change) = event else {
            panic!("expected change event");
        };
        assert!(change.detail.updates().is_empty());
    }

    #[test]
    fn select_detail_and_unknown_types() {
        let event =
            EditorEvent::from_wire("aue:ui-select", json!({"resource": "urn:p", "selected": true}))
                .unwrap();
        assert_eq!(
            event,
            EditorEvent::Select(SelectDetail {
                resource: Some("urn:p".to_string()),
                selected: true
            })
        );
        assert!(matches!(
            EditorEvent::from_wire("aue:content-copy", json!({})),
            Err(WireError::UnknownType(_))
        ));
    }

    #[test]
    fn bus_preserves_arrival_order() {
        let bus = Bus::new();
        let sender = bus.sender();
        sender
            .send(EditorEvent::Select(SelectDetail::default()))
            .unwrap();
        bus.post(EditorEvent::Change(ChangeEvent::new(
            ChangeKind::Add,
            ChangeDetail::in_container("urn:s"),
        )));
        assert_eq!(bus.try_next().map(|e| e.event_type()), Some(EventType::UiSelect));
        assert_eq!(bus.try_next().map(|e| e.event_type()), Some(EventType::ContentAdd));
        assert!(bus.try_next().is_none());
    }
}
