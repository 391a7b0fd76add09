use std::sync::{Arc, Mutex};

/// Reconciler for hosts that don't read the view back.
pub fn no_op_reconciler<V>() -> impl FnMut(&V) {
    |_view: &V| {}
}

/// Shared cell holding the most recently rendered view.
pub type ViewSlot<V> = Arc<Mutex<Option<V>>>;

/// Reconciler that keeps the latest view in `slot`, for hosts that pull the
/// rendered page instead of patching it.
pub fn view_slot_reconciler<V: Clone>(slot: ViewSlot<V>) -> impl FnMut(&V) {
    move |view: &V| {
        if let Ok(mut latest) = slot.lock() {
            *latest = Some(view.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keeps_latest_view() {
        let slot: ViewSlot<String> = Arc::default();
        let mut reconcile = view_slot_reconciler(slot.clone());
        reconcile(&"first".to_string());
        reconcile(&"second".to_string());
        assert_eq!(slot.lock().unwrap().as_deref(), Some("second"));
    }
}
