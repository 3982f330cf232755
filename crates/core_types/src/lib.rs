use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier correlating a live node with its freshly rendered twin.
///
/// Not unique: a rich-text field may render as several sibling nodes that all
/// carry the same id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId(value.to_string())
    }
}

/// Handle returned when a listener is registered on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Event types the page listens for, named as the authoring tool sends them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    ContentPatch,
    ContentUpdate,
    ContentAdd,
    ContentMove,
    ContentRemove,
    UiSelect,
}

impl EventType {
    pub const CONTENT_CHANGES: [EventType; 5] = [
        EventType::ContentPatch,
        EventType::ContentUpdate,
        EventType::ContentAdd,
        EventType::ContentMove,
        EventType::ContentRemove,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            EventType::ContentPatch => "aue:content-patch",
            EventType::ContentUpdate => "aue:content-update",
            EventType::ContentAdd => "aue:content-add",
            EventType::ContentMove => "aue:content-move",
            EventType::ContentRemove => "aue:content-remove",
            EventType::UiSelect => "aue:ui-select",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("aue:").unwrap_or(name);
        Some(match name {
            "content-patch" => EventType::ContentPatch,
            "content-update" => EventType::ContentUpdate,
            "content-add" => EventType::ContentAdd,
            "content-move" => EventType::ContentMove,
            "content-remove" => EventType::ContentRemove,
            "ui-select" => EventType::UiSelect,
            _ => return None,
        })
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
