use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Handle given to effect managers (and in-ports) so that work they spawn can
/// deliver app messages back to the runtime loop.
pub struct Router<Msg> {
    app_tx: UnboundedSender<Msg>,
}

impl<Msg> Clone for Router<Msg> {
    fn clone(&self) -> Self {
        Self {
            app_tx: self.app_tx.clone(),
        }
    }
}

impl<Msg: Send + 'static> Router<Msg> {
    pub fn new(app_tx: UnboundedSender<Msg>) -> Self {
        Self { app_tx }
    }

    /// Queue a message for `update`. Returns false once the loop has ended
    /// (the page navigated away); the message is dropped.
    pub fn send(&self, msg: Msg) -> bool {
        let delivered = self.app_tx.send(msg).is_ok();
        if !delivered {
            tracing::trace!("runtime loop gone; message dropped");
        }
        delivered
    }
}

/// A router plus the receiving end owned by the runtime loop.
pub struct RouterChannels<Msg> {
    pub router: Router<Msg>,
    pub app_rx: UnboundedReceiver<Msg>,
}

impl<Msg: Send + 'static> RouterChannels<Msg> {
    pub fn new() -> Self {
        let (app_tx, app_rx) = unbounded_channel();
        Self {
            router: Router::new(app_tx),
            app_rx,
        }
    }
}

impl<Msg: Send + 'static> Default for RouterChannels<Msg> {
    fn default() -> Self {
        Self::new()
    }
}
