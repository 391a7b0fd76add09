use crate::Observation;
use std::fmt::Debug;
use std::sync::Arc;

pub type ObserverFn<Msg, Req> = Arc<dyn Fn(&Observation<Msg, Req>) + Send + Sync>;

pub fn no_op_observer<Msg: 'static, Req: 'static>() -> ObserverFn<Msg, Req> {
    Arc::new(|_observation: &Observation<Msg, Req>| {})
}

/// Logs every message at `info` and every effect at `debug`.
pub fn tracing_observer<Msg, Req>() -> ObserverFn<Msg, Req>
where
    Msg: Debug + 'static,
    Req: Debug + 'static,
{
    Arc::new(|observation: &Observation<Msg, Req>| match observation {
        Observation::Event { data, .. } => {
            tracing::info!(target: "storefront::Msg", "Msg({:?})", data);
        }
        Observation::Effect { data, .. } => {
            tracing::debug!(target: "storefront::Cmd", "Cmd({:?})", data);
        }
    })
}

/// Pass through only the observation kinds that are switched on.
pub fn filter_observer<Msg: 'static, Req: 'static>(
    wrapped: ObserverFn<Msg, Req>,
    include_events: bool,
    include_effects: bool,
) -> ObserverFn<Msg, Req> {
    Arc::new(move |observation: &Observation<Msg, Req>| {
        let pass = match observation {
            Observation::Event { .. } => include_events,
            Observation::Effect { .. } => include_effects,
        };
        if pass {
            wrapped(observation);
        }
    })
}

pub fn tee_observer<Msg: 'static, Req: 'static>(
    observers: Vec<ObserverFn<Msg, Req>>,
) -> ObserverFn<Msg, Req> {
    Arc::new(move |observation: &Observation<Msg, Req>| {
        for observer in &observers {
            observer(observation);
        }
    })
}
