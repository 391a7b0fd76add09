//! Storefront page behaviour: cart quantity steppers, add-to-cart, the
//! product gallery and toast notifications, run as an Elm-architecture app
//! over an in-memory page.
//!
//! The host owns the real page. It reports clicks, changes and submissions
//! through [`runtime::Ports::dom`], performs navigations published on
//! [`runtime::Ports::navigation`], and reads the rendered page back from the
//! view slot.

pub mod app;
pub mod bindings;
pub mod cart;
pub mod config;
pub mod cookie;
pub mod dom;
pub mod error;
pub mod gallery;
pub mod quantity;
pub mod runtime;
pub mod toast;

use std::sync::Arc;

use storefront_core::{view_slot_reconciler, ViewSlot};

pub use app::{Model, Msg};
pub use bindings::{DomEvent, EventType};
pub use config::{Settings, StorefrontConfig};
pub use dom::{el, Document, NodeId, Selector};
pub use error::{CartError, ConfigError};
pub use runtime::{Cmd, Exit, Ports, Runtime};
pub use storefront_core::Navigation;

/// Wire the storefront app into a runtime. Every rendered page is written to
/// `view`.
#[allow(clippy::type_complexity)]
pub fn build_runtime(
    page: Document,
    settings: Arc<Settings>,
    view: ViewSlot<Document>,
) -> Runtime<
    impl FnOnce() -> (Model, Cmd<Msg>),
    fn(Model, Msg) -> (Model, Cmd<Msg>),
    fn(&Model) -> Document,
    impl FnMut(&Document),
    Model,
    Document,
    Msg,
> {
    Runtime::new(
        move || app::init(page, settings),
        app::update as fn(Model, Msg) -> (Model, Cmd<Msg>),
        app::view as fn(&Model) -> Document,
        view_slot_reconciler(view),
        storefront_core::tracing_observer(),
    )
}
