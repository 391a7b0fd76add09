use std::sync::{Arc, Mutex};

use crate::Router;

/// Host → app port. Wraps each payload into the app's message type and
/// queues it on the runtime loop.
pub struct InPort<T, E> {
    router: Router<E>,
    constructor: fn(T) -> E,
}

impl<T, E> Clone for InPort<T, E> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            constructor: self.constructor,
        }
    }
}

impl<T, E: Send + 'static> InPort<T, E> {
    pub fn new(router: Router<E>, constructor: fn(T) -> E) -> Self {
        Self { router, constructor }
    }

    /// False once the runtime loop has ended.
    pub fn send(&self, payload: T) -> bool {
        self.router.send((self.constructor)(payload))
    }
}

type Subscriber<T> = Box<dyn Fn(T) + Send>;

/// App → host port. Subscribers are called synchronously, in subscription
/// order, from the runtime loop.
pub struct OutPort<T> {
    subscribers: Arc<Mutex<Vec<Subscriber<T>>>>,
}

impl<T> Clone for OutPort<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> Default for OutPort<T> {
    fn default() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + 'static> OutPort<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(T) + Send + 'static,
    {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(Box::new(handler));
        }
    }

    pub fn dispatch(&self, payload: T) {
        let Ok(subscribers) = self.subscribers.lock() else {
            return;
        };
        if subscribers.is_empty() {
            tracing::debug!("out-port dispatch with no subscribers");
        }
        for handler in subscribers.iter() {
            handler(payload.clone());
        }
    }
}
