//! Quantity steppers on the cart page.

use storefront_http_manager::FormBody;

use crate::config::Settings;
use crate::dom::{Document, NodeId};

/// Leading-integer parse of a quantity field: optional surrounding
/// whitespace and sign, digits, anything after the digits ignored.
/// Unparseable, zero and negative input all read as 1.
pub fn parse_quantity(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: &str = &digits[..digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len())];
    if digits.is_empty() || negative {
        return 1;
    }
    let value = digits
        .bytes()
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d - b'0')));
    value.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Decrement,
    Increment,
}

/// One stepper: the group element plus whichever parts it actually has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityControl {
    pub root: NodeId,
    pub minus: Option<NodeId>,
    pub plus: Option<NodeId>,
    pub input: Option<NodeId>,
}

/// What the cart-update request needs from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdate {
    pub action: String,
    pub form: FormBody,
}

impl QuantityControl {
    /// Every stepper currently on the page.
    pub fn discover(doc: &Document, settings: &Settings) -> Vec<QuantityControl> {
        let markers = &settings.markers;
        doc.select_all(&markers.quantity_control)
            .into_iter()
            .map(|root| QuantityControl {
                root,
                minus: doc.query(root, &markers.quantity_minus),
                plus: doc.query(root, &markers.quantity_plus),
                input: doc.query(root, &markers.quantity_input),
            })
            .collect()
    }

    pub fn current(&self, doc: &Document) -> Option<u64> {
        self.input.map(|input| parse_quantity(doc.value(input)))
    }

    /// Apply a button press. Returns the new value when the field changed;
    /// decrementing at 1 changes nothing.
    pub fn step(&self, doc: &mut Document, step: Step) -> Option<u64> {
        let input = self.input?;
        let current = parse_quantity(doc.value(input));
        let next = match step {
            Step::Decrement if current > 1 => current - 1,
            Step::Decrement => return None,
            Step::Increment => current.saturating_add(1),
        };
        doc.set_value(input, next.to_string());
        Some(next)
    }

    /// Take a typed value and write back its normalized form.
    pub fn edit(&self, doc: &mut Document, raw: &str) -> Option<u64> {
        let input = self.input?;
        let value = parse_quantity(raw);
        doc.set_value(input, value.to_string());
        Some(value)
    }

    /// The request to send after a change, if the stepper sits in an
    /// update-cart form.
    pub fn cart_update(&self, doc: &Document, settings: &Settings) -> Option<CartUpdate> {
        let config = &settings.config.quantity;
        let form = doc.closest_tag(self.root, "form")?;
        if !doc.has_class(form, &config.update_form_class) {
            return None;
        }
        let mut body = doc.form_data(form);
        if let Some(input) = self.input {
            body.set(&config.field, doc.value(input));
        }
        Some(CartUpdate {
            action: doc.form_action(form),
            form: body,
        })
    }
}
