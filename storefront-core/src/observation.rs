use std::time::SystemTime;

/// What the runtime reports to its observer on every loop turn: a message
/// about to reach `update`, or an effect about to reach its manager.
pub enum Observation<Msg, Req> {
    Event { ts: SystemTime, data: Msg },
    Effect { ts: SystemTime, data: Req },
}

impl<Msg, Req> Observation<Msg, Req> {
    pub fn event(data: Msg) -> Self {
        Observation::Event {
            ts: SystemTime::now(),
            data,
        }
    }

    pub fn effect(data: Req) -> Self {
        Observation::Effect {
            ts: SystemTime::now(),
            data,
        }
    }
}
