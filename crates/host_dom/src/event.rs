use crate::types::NodeKey;

/// Synthetic events the overlay can dispatch into the host document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// `input` notification, as fired after the user edits an editable region.
    Input {
        input_type: String,
        data: Option<String>,
    },
    /// `click` activation.
    Click,
}

impl EventKind {
    pub fn insert_text(data: &str) -> Self {
        EventKind::Input {
            input_type: "insertText".to_string(),
            data: Some(data.to_string()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Input { .. } => "input",
            EventKind::Click => "click",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            bubbles: true,
            cancelable: true,
        }
    }
}

/// Journal entry for an event that reached the document.
///
/// `path` lists the target first, followed by its ancestors when the event
/// bubbles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub seq: u64,
    pub target: NodeKey,
    pub event: Event,
    pub path: Vec<NodeKey>,
}
