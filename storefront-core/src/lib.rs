//! Elm-architecture building blocks shared by the storefront runtime and its
//! effect managers.

mod cmd;
mod observation;
mod observer;
mod ports;
mod reconciler;
mod request;
mod router;

pub use cmd::CoreCmd;
pub use observation::Observation;
pub use observer::{filter_observer, no_op_observer, tee_observer, tracing_observer, ObserverFn};
pub use ports::{InPort, OutPort};
pub use reconciler::{no_op_reconciler, view_slot_reconciler, ViewSlot};
pub use request::{reload, shutdown, submit_form, CoreRequest, Navigation};
pub use router::{Router, RouterChannels};
