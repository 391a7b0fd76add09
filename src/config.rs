//! Page markers and presentation settings.
//!
//! Defaults match the storefront templates; a JSON document may override any
//! subset of fields.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dom::Selector;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub quantity: QuantityConfig,
    pub cart: CartConfig,
    pub gallery: GalleryConfig,
    pub toast: ToastConfig,
    /// Send the named cookie back as a header on cart requests.
    pub csrf: Option<CsrfConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantityConfig {
    pub control: String,
    pub minus: String,
    pub plus: String,
    pub input: String,
    /// Class that marks a form as an update-cart form.
    pub update_form_class: String,
    /// Form field overwritten with the control's value.
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    pub form: String,
    /// `data-*` key that must equal `"true"` for script submission.
    pub ajax_data_key: String,
    pub button: String,
    pub badge: String,
    pub badge_class: String,
    pub added_message: String,
    pub failed_message: String,
    /// Drop a reply's count when a later request's count is already shown.
    /// Off by default: the reply that arrives last sets the badge.
    pub discard_stale_counts: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub main_image: String,
    pub thumbnails: String,
    pub active_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub container_id: String,
    pub container_class: String,
    pub autohide: bool,
    pub delay_ms: u64,
    pub fade_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfConfig {
    pub cookie: String,
    pub header: String,
}

impl Default for QuantityConfig {
    fn default() -> Self {
        Self {
            control: ".quantity-control".into(),
            minus: ".qty-minus".into(),
            plus: ".qty-plus".into(),
            input: "input".into(),
            update_form_class: "update-cart-form".into(),
            field: "quantity".into(),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            form: ".add-to-cart-form".into(),
            ajax_data_key: "ajax".into(),
            button: ".btn-primary-yellow".into(),
            badge: ".btn-primary-yellow .badge".into(),
            badge_class: "position-absolute top-0 start-100 translate-middle badge rounded-pill bg-danger"
                .into(),
            added_message: "Added to cart!".into(),
            failed_message: "Error adding to cart".into(),
            discard_stale_counts: false,
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            main_image: ".main-product-image".into(),
            thumbnails: ".product-gallery .thumbnail".into(),
            active_class: "active".into(),
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            container_id: "toast-container".into(),
            container_class: "toast-container position-fixed bottom-0 end-0 p-3".into(),
            autohide: true,
            delay_ms: 5000,
            fade_ms: 150,
        }
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie: "csrftoken".into(),
            header: "X-CSRFToken".into(),
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            quantity: QuantityConfig::default(),
            cart: CartConfig::default(),
            gallery: GalleryConfig::default(),
            toast: ToastConfig::default(),
            csrf: None,
        }
    }
}

impl ToastConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

impl StorefrontConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse every selector once so the app never handles a bad one at
    /// event time.
    pub fn compile(self) -> Result<Settings, ConfigError> {
        let markers = Markers {
            quantity_control: compile("quantity.control", &self.quantity.control)?,
            quantity_minus: compile("quantity.minus", &self.quantity.minus)?,
            quantity_plus: compile("quantity.plus", &self.quantity.plus)?,
            quantity_input: compile("quantity.input", &self.quantity.input)?,
            cart_form: compile("cart.form", &self.cart.form)?,
            cart_button: compile("cart.button", &self.cart.button)?,
            cart_badge: compile("cart.badge", &self.cart.badge)?,
            main_image: compile("gallery.main_image", &self.gallery.main_image)?,
            thumbnails: compile("gallery.thumbnails", &self.gallery.thumbnails)?,
        };
        Ok(Settings {
            config: self,
            markers,
        })
    }
}

fn compile(field: &'static str, source: &str) -> Result<Selector, ConfigError> {
    Selector::parse(source).map_err(|source| ConfigError::Selector { field, source })
}

/// Compiled selectors for every page marker.
#[derive(Debug, Clone)]
pub struct Markers {
    pub quantity_control: Selector,
    pub quantity_minus: Selector,
    pub quantity_plus: Selector,
    pub quantity_input: Selector,
    pub cart_form: Selector,
    pub cart_button: Selector,
    pub cart_badge: Selector,
    pub main_image: Selector,
    pub thumbnails: Selector,
}

/// Validated configuration handed to the app.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: StorefrontConfig,
    pub markers: Markers,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        StorefrontConfig::from_path(path)?.compile()
    }
}

impl Default for Settings {
    fn default() -> Self {
        // Built-in selectors are known to parse.
        StorefrontConfig::default()
            .compile()
            .unwrap_or_else(|e| unreachable!("default selectors: {e}"))
    }
}
