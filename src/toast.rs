//! Transient notifications stacked in a shared bottom-right container.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ToastConfig;
use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    #[default]
    Info,
}

impl Severity {
    fn background(self) -> &'static str {
        match self {
            Severity::Success => "bg-success",
            Severity::Error => "bg-danger",
            Severity::Info => "bg-primary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct LiveToast {
    node: NodeId,
    dismiss: NodeId,
    hiding: bool,
}

/// A toast that was just put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shown {
    pub id: ToastId,
    pub node: NodeId,
    pub dismiss: NodeId,
}

/// Page-wide toast presenter. Owns the container element, created on first
/// use, and every toast still in the document.
#[derive(Debug, Clone, Default)]
pub struct ToastArea {
    container: Option<NodeId>,
    next_id: u64,
    live: BTreeMap<ToastId, LiveToast>,
}

impl ToastArea {
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn live(&self) -> impl Iterator<Item = ToastId> + '_ {
        self.live.keys().copied()
    }

    pub fn node(&self, id: ToastId) -> Option<NodeId> {
        self.live.get(&id).map(|t| t.node)
    }

    fn ensure_container(&mut self, doc: &mut Document, config: &ToastConfig) -> NodeId {
        if let Some(container) = self.container.filter(|c| doc.is_connected(*c)) {
            return container;
        }
        let container = match doc.element_by_id(&config.container_id) {
            Some(existing) => existing,
            None => {
                let container = doc.create_element("div");
                doc.set_attr(container, "id", config.container_id.as_str());
                doc.set_attr(container, "class", config.container_class.as_str());
                let body = doc.body();
                doc.append_child(body, container);
                container
            }
        };
        self.container = Some(container);
        container
    }

    /// Build a toast, append it to the container and show it. The message
    /// is inserted as text.
    pub fn show(&mut self, doc: &mut Document, config: &ToastConfig, message: &str, severity: Severity) -> Shown {
        let container = self.ensure_container(doc, config);
        self.next_id += 1;
        let id = ToastId(self.next_id);

        let toast = doc.create_element("div");
        doc.set_attr(
            toast,
            "class",
            format!("toast align-items-center text-white {} border-0", severity.background()),
        );
        doc.set_attr(toast, "role", "alert");
        doc.set_attr(toast, "aria-live", "assertive");
        doc.set_attr(toast, "aria-atomic", "true");

        let row = doc.create_element("div");
        doc.add_class(row, "d-flex");
        let body = doc.create_element("div");
        doc.add_class(body, "toast-body");
        doc.set_text(body, message);
        let dismiss = doc.create_element("button");
        doc.set_attr(dismiss, "type", "button");
        doc.set_attr(dismiss, "class", "btn-close btn-close-white me-2 m-auto");
        doc.set_attr(dismiss, "data-bs-dismiss", "toast");
        doc.set_attr(dismiss, "aria-label", "Close");

        doc.append_child(row, body);
        doc.append_child(row, dismiss);
        doc.append_child(toast, row);
        doc.append_child(container, toast);
        doc.add_class(toast, "show");

        self.live.insert(
            id,
            LiveToast {
                node: toast,
                dismiss,
                hiding: false,
            },
        );
        Shown {
            id,
            node: toast,
            dismiss,
        }
    }

    /// Start the dismissal animation. False when the toast is already
    /// hiding or gone.
    pub fn hide(&mut self, doc: &mut Document, id: ToastId) -> bool {
        let Some(toast) = self.live.get_mut(&id) else {
            return false;
        };
        if toast.hiding {
            return false;
        }
        toast.hiding = true;
        doc.remove_class(toast.node, "show");
        true
    }

    /// Drop the toast from the document once its dismissal finished.
    /// Returns its dismiss button so the caller can forget it.
    pub fn remove(&mut self, doc: &mut Document, id: ToastId) -> Option<NodeId> {
        let toast = self.live.remove(&id)?;
        doc.remove(toast.node);
        Some(toast.dismiss)
    }
}
