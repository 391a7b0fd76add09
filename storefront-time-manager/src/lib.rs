//! Timer effect manager: delayed messages (toast auto-hide, fade-out) and
//! cancellation of the ones that became moot.

mod requests;

pub use requests::{cancel, notify_after, TimeRequest};

use std::collections::HashMap;

use storefront_core::Router;

/// Outstanding timer tasks keyed by app-chosen id.
#[derive(Default)]
pub struct TimerState {
    tasks: HashMap<u64, tokio::task::JoinHandle<()>>,
}

impl TimerState {
    /// Timers that have been scheduled and have neither fired nor been
    /// cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    /// Cancel everything still pending, e.g. when the page goes away.
    pub fn abort_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

pub struct TimeManager;

impl TimeManager {
    pub fn init() -> TimerState {
        TimerState::default()
    }

    pub fn on_effects<Msg: Send + 'static>(
        &self,
        router: &Router<Msg>,
        mut state: TimerState,
        effects: Vec<TimeRequest<Msg>>,
    ) -> TimerState {
        state.tasks.retain(|_, handle| !handle.is_finished());
        for req in effects {
            match req {
                TimeRequest::NotifyAfter {
                    id,
                    duration,
                    returns,
                } => {
                    let router = router.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(duration).await;
                        router.send(returns());
                    });
                    if let Some(previous) = state.tasks.insert(id, handle) {
                        tracing::debug!(id, "timer replaced");
                        previous.abort();
                    }
                }
                TimeRequest::Cancel { id } => {
                    if let Some(handle) = state.tasks.remove(&id) {
                        handle.abort();
                    }
                }
            }
        }
        state
    }
}
