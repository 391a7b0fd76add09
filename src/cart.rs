//! Add-to-cart forms, the cart badge and the JSON replies of both cart
//! endpoints.

use serde_json::Value;
use storefront_http_manager::{FormBody, HttpError, HttpResponse};

use crate::config::Settings;
use crate::dom::{Document, NodeId};
use crate::error::CartError;

/// Reply of the update-cart endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReply {
    pub success: bool,
}

/// Reply of the add-to-cart endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddReply {
    pub success: bool,
    /// `cart_count` already rendered as badge text.
    pub cart_count: String,
}

/// Decode a cart endpoint reply. The HTTP status is not consulted: any JSON
/// body counts, and `success` is read with JavaScript truthiness.
fn decode(result: Result<HttpResponse, HttpError>) -> Result<Value, CartError> {
    let response = result?;
    serde_json::from_slice(&response.body).map_err(|e| CartError::Decode {
        status: response.status,
        message: e.to_string(),
    })
}

pub fn decode_update_reply(result: Result<HttpResponse, HttpError>) -> Result<UpdateReply, CartError> {
    let data = decode(result)?;
    Ok(UpdateReply {
        success: truthy(data.get("success")),
    })
}

pub fn decode_add_reply(result: Result<HttpResponse, HttpError>) -> Result<AddReply, CartError> {
    let data = decode(result)?;
    Ok(AddReply {
        success: truthy(data.get("success")),
        cart_count: display_text(data.get("cart_count")),
    })
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Text a JSON value becomes when assigned as element text.
fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

/// Whether `form` asks for script submission.
pub fn is_async_form(doc: &Document, form: NodeId, settings: &Settings) -> bool {
    doc.data(form, &settings.config.cart.ajax_data_key) == Some("true")
}

/// Action URL and payload of an add-to-cart form.
pub fn submission(doc: &Document, form: NodeId) -> (String, FormBody) {
    (doc.form_action(form), doc.form_data(form))
}

/// Outcome of writing a count into the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeWrite {
    Applied(NodeId),
    /// A later request's count is already shown and stale counts are
    /// discarded.
    Stale,
    /// The page has no cart button to hang a badge on.
    NoButton,
}

/// Page-wide cart badge handle. The element is looked up (or created) once
/// and reused. Writes land in arrival order unless
/// `cart.discard_stale_counts` is set, in which case a reply older than the
/// last applied one is dropped.
#[derive(Debug, Clone, Default)]
pub struct BadgeSlot {
    node: Option<NodeId>,
    issued: u64,
    applied: u64,
}

impl BadgeSlot {
    /// Sequence number for the next add-to-cart request.
    pub fn next_seq(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn write(&mut self, doc: &mut Document, settings: &Settings, seq: u64, text: &str) -> BadgeWrite {
        if settings.config.cart.discard_stale_counts && seq <= self.applied {
            return BadgeWrite::Stale;
        }
        let Some(badge) = self.resolve(doc, settings) else {
            return BadgeWrite::NoButton;
        };
        doc.set_text(badge, text);
        self.applied = self.applied.max(seq);
        BadgeWrite::Applied(badge)
    }

    fn resolve(&mut self, doc: &mut Document, settings: &Settings) -> Option<NodeId> {
        if let Some(node) = self.node.filter(|n| doc.is_connected(*n)) {
            return Some(node);
        }
        let markers = &settings.markers;
        let badge = match doc.select(&markers.cart_badge) {
            Some(existing) => existing,
            None => {
                let button = doc.select(&markers.cart_button)?;
                let badge = doc.create_element("span");
                doc.set_attr(badge, "class", settings.config.cart.badge_class.as_str());
                doc.append_child(button, badge);
                badge
            }
        };
        self.node = Some(badge);
        Some(badge)
    }
}
