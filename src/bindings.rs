//! Registration table: which page element plays which role, built once at
//! start-up and consulted for every incoming DOM event.

use std::collections::HashMap;

use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::toast::ToastId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    Click,
    Change,
    Submit,
}

/// A DOM event reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: DomEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DomEventKind {
    Click,
    /// The field's value after the user edit.
    Change { value: String },
    Submit,
}

impl DomEvent {
    pub fn click(target: NodeId) -> Self {
        Self {
            target,
            kind: DomEventKind::Click,
        }
    }

    pub fn change(target: NodeId, value: impl Into<String>) -> Self {
        Self {
            target,
            kind: DomEventKind::Change {
                value: value.into(),
            },
        }
    }

    pub fn submit(target: NodeId) -> Self {
        Self {
            target,
            kind: DomEventKind::Submit,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self.kind {
            DomEventKind::Click => EventType::Click,
            DomEventKind::Change { .. } => EventType::Change,
            DomEventKind::Submit => EventType::Submit,
        }
    }
}

/// What a bound element does. Quantity roles carry the index of their
/// stepper in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    QuantityMinus(usize),
    QuantityPlus(usize),
    QuantityInput(usize),
    AddToCartForm,
    Thumbnail,
    ToastDismiss(ToastId),
}

/// A role matched for an event, with the element it is bound to (which may
/// be an ancestor of the event target).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    pub node: NodeId,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct Bindings {
    table: HashMap<(NodeId, EventType), Vec<Role>>,
}

impl Bindings {
    pub fn bind(&mut self, node: NodeId, event: EventType, role: Role) {
        self.table.entry((node, event)).or_default().push(role);
    }

    pub fn unbind(&mut self, node: NodeId, event: EventType, role: Role) {
        if let Some(roles) = self.table.get_mut(&(node, event)) {
            roles.retain(|r| *r != role);
            if roles.is_empty() {
                self.table.remove(&(node, event));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Handlers the event reaches while bubbling from its target up to the
    /// body, innermost first, each element's roles in registration order.
    pub fn dispatch(&self, doc: &Document, event: &DomEvent) -> Vec<Handler> {
        let event_type = event.event_type();
        doc.ancestors_inclusive(event.target)
            .flat_map(|node| {
                self.table
                    .get(&(node, event_type))
                    .into_iter()
                    .flatten()
                    .map(move |role| Handler { node, role: *role })
            })
            .collect()
    }
}
