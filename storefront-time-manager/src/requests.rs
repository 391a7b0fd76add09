use std::sync::Arc;
use std::time::Duration;

use storefront_core_macros::Request;

/// Timer requests. Ids are chosen by the app so a pending timer can be
/// cancelled later; reusing a live id replaces the earlier timer.
#[derive(Clone, Request)]
pub enum TimeRequest<Msg> {
    NotifyAfter {
        id: u64,
        duration: Duration,
        returns: Arc<dyn Fn() -> Msg + Send + Sync>,
    },
    Cancel {
        id: u64,
    },
}

impl<Msg: 'static> TimeRequest<Msg> {
    pub fn map<Msg2>(
        self,
        f: impl Fn(Msg) -> Msg2 + Send + Sync + Clone + 'static,
    ) -> TimeRequest<Msg2> {
        match self {
            TimeRequest::NotifyAfter {
                id,
                duration,
                returns,
            } => TimeRequest::NotifyAfter {
                id,
                duration,
                returns: Arc::new(move || f(returns())),
            },
            TimeRequest::Cancel { id } => TimeRequest::Cancel { id },
        }
    }
}

pub fn notify_after<Msg>(
    id: u64,
    duration: Duration,
    returns: impl Fn() -> Msg + Send + Sync + 'static,
) -> TimeRequest<Msg> {
    TimeRequest::NotifyAfter {
        id,
        duration,
        returns: Arc::new(returns),
    }
}

pub fn cancel<Msg>(id: u64) -> TimeRequest<Msg> {
    TimeRequest::Cancel { id }
}
