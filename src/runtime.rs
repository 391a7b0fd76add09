//! Request enum, `Cmd` alias, command helpers and the event loop that ties
//! the app to its effect managers.

use std::sync::Arc;
use std::time::Duration;

use storefront_core::{
    CoreCmd, CoreRequest, InPort, Navigation, Observation, ObserverFn, OutPort, Router,
};
use storefront_core_macros::Request;
use storefront_http_manager::{HttpError, HttpManager, HttpRequest, OutboundRequest, Transport};
use storefront_time_manager::{TimeManager, TimeRequest};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::bindings::DomEvent;

#[derive(Clone, Request)]
pub enum Request<Msg> {
    Core(CoreRequest),
    Http(HttpRequest<Msg>),
    Time(TimeRequest<Msg>),
}

impl<Msg: 'static> Request<Msg> {
    pub fn map<Msg2: 'static>(
        self,
        f: impl Fn(Msg) -> Msg2 + Send + Sync + Clone + 'static,
    ) -> Request<Msg2> {
        match self {
            Request::Core(r) => Request::Core(r),
            Request::Http(r) => Request::Http(r.map(f)),
            Request::Time(r) => Request::Time(r.map(f)),
        }
    }
}

pub type Cmd<Msg> = CoreCmd<Request<Msg>>;

pub trait CmdExt<Msg> {
    fn map<Msg2: 'static>(self, f: impl Fn(Msg) -> Msg2 + Send + Sync + Clone + 'static) -> Cmd<Msg2>;
}

impl<Msg: 'static> CmdExt<Msg> for Cmd<Msg> {
    fn map<Msg2: 'static>(self, f: impl Fn(Msg) -> Msg2 + Send + Sync + Clone + 'static) -> Cmd<Msg2> {
        self.into_inner()
            .into_iter()
            .map(|req| req.map(f.clone()))
            .collect()
    }
}

pub mod command {
    use super::*;

    pub fn shutdown<Msg>() -> Cmd<Msg> {
        CoreCmd::single(Request::Core(storefront_core::shutdown()))
    }

    pub fn reload<Msg>() -> Cmd<Msg> {
        CoreCmd::single(Request::Core(storefront_core::reload()))
    }

    pub fn submit_form<Msg>(url: impl Into<String>, body: impl Into<String>) -> Cmd<Msg> {
        CoreCmd::single(Request::Core(storefront_core::submit_form(url, body)))
    }

    pub fn http<Msg>(req: HttpRequest<Msg>) -> Cmd<Msg> {
        CoreCmd::single(Request::Http(req))
    }

    pub fn notify_after<Msg>(
        id: u64,
        duration: Duration,
        returns: impl Fn() -> Msg + Send + Sync + 'static,
    ) -> Cmd<Msg> {
        CoreCmd::single(Request::Time(storefront_time_manager::notify_after(
            id, duration, returns,
        )))
    }

    pub fn cancel_timer<Msg>(id: u64) -> Cmd<Msg> {
        CoreCmd::single(Request::Time(storefront_time_manager::cancel(id)))
    }
}

/// Transport used until the host supplies one: every request fails.
struct Unconnected;

#[async_trait::async_trait]
impl Transport for Unconnected {
    async fn send(&self, request: OutboundRequest) -> Result<storefront_http_manager::HttpResponse, HttpError> {
        Err(HttpError::new(format!("no transport configured for {}", request.url)))
    }
}

/// Host-facing handles: DOM events in, navigations out.
pub struct Ports<AppMsg> {
    pub dom: InPort<DomEvent, AppMsg>,
    pub navigation: OutPort<Navigation>,
    req_tx: UnboundedSender<Request<AppMsg>>,
}

impl<AppMsg> Clone for Ports<AppMsg> {
    fn clone(&self) -> Self {
        Self {
            dom: self.dom.clone(),
            navigation: self.navigation.clone(),
            req_tx: self.req_tx.clone(),
        }
    }
}

impl<AppMsg> Ports<AppMsg> {
    /// Stop the loop once already queued effects have been dispatched.
    pub fn shutdown(&self) {
        let _ = self.req_tx.send(Request::Core(CoreRequest::Shutdown));
    }
}

/// How the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Shutdown,
    Navigated(Navigation),
}

pub struct Runtime<Init, Update, ViewFn, Recon, Model, ViewOut, AppMsg>
where
    AppMsg: Clone + Send + 'static,
    Model: Send + 'static,
{
    init: Init,
    update: Update,
    view: ViewFn,
    reconciler: Recon,
    observer: ObserverFn<AppMsg, Request<AppMsg>>,
    http: HttpManager,
    ports: Ports<AppMsg>,
    router: Router<AppMsg>,
    app_rx: UnboundedReceiver<AppMsg>,
    req_tx: UnboundedSender<Request<AppMsg>>,
    req_rx: UnboundedReceiver<Request<AppMsg>>,
    _model: std::marker::PhantomData<Model>,
    _view: std::marker::PhantomData<ViewOut>,
}

impl<Init, Update, ViewFn, Recon, Model, ViewOut, AppMsg>
    Runtime<Init, Update, ViewFn, Recon, Model, ViewOut, AppMsg>
where
    Init: FnOnce() -> (Model, Cmd<AppMsg>),
    Update: Fn(Model, AppMsg) -> (Model, Cmd<AppMsg>),
    ViewFn: Fn(&Model) -> ViewOut,
    Recon: FnMut(&ViewOut),
    Model: Send + 'static,
    AppMsg: Clone + Send + From<DomEvent> + 'static,
{
    pub fn new(
        init: Init,
        update: Update,
        view: ViewFn,
        reconciler: Recon,
        observer: ObserverFn<AppMsg, Request<AppMsg>>,
    ) -> Self {
        let (app_tx, app_rx) = unbounded_channel();
        let (req_tx, req_rx) = unbounded_channel();
        let router = Router::new(app_tx);
        let ports = Ports {
            dom: InPort::new(router.clone(), <AppMsg as From<DomEvent>>::from),
            navigation: OutPort::new(),
            req_tx: req_tx.clone(),
        };

        Self {
            init,
            update,
            view,
            reconciler,
            observer,
            http: HttpManager::new(Arc::new(Unconnected)),
            ports,
            router,
            app_rx,
            req_tx,
            req_rx,
            _model: std::marker::PhantomData,
            _view: std::marker::PhantomData,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.http = HttpManager::new(transport);
        self
    }

    pub fn ports(&self) -> Ports<AppMsg> {
        self.ports.clone()
    }

    fn enqueue_cmd(tx: &UnboundedSender<Request<AppMsg>>, cmd: Cmd<AppMsg>) {
        for req in cmd.into_inner() {
            let _ = tx.send(req);
        }
    }

    /// Run until a shutdown or a navigation. Navigations are handed to the
    /// navigation port before the loop ends; pending timers are dropped.
    pub async fn run(mut self) -> Exit {
        let (mut model, init_cmd) = (self.init)();

        let observer = self.observer.clone();
        Self::enqueue_cmd(&self.req_tx, init_cmd);

        let mut http_state = HttpManager::init();
        let time_manager = TimeManager;
        let mut time_state = TimeManager::init();

        let view_cache = (self.view)(&model);
        (self.reconciler)(&view_cache);

        let exit = loop {
            tokio::select! {
                Some(req) = self.req_rx.recv() => {
                    observer(&Observation::effect(req.clone()));
                    match req {
                        Request::Core(CoreRequest::Shutdown) => break Exit::Shutdown,
                        Request::Core(CoreRequest::Navigate(navigation)) => {
                            self.ports.navigation.dispatch(navigation.clone());
                            break Exit::Navigated(navigation);
                        }
                        Request::Http(r) => {
                            http_state = self.http.on_effects(&self.router, http_state, vec![r]);
                        }
                        Request::Time(r) => {
                            time_state = time_manager.on_effects(&self.router, time_state, vec![r]);
                        }
                    }
                }
                Some(app_evt) = self.app_rx.recv() => {
                    observer(&Observation::event(app_evt.clone()));
                    let (new_model, cmd) = (self.update)(model, app_evt);
                    model = new_model;
                    Self::enqueue_cmd(&self.req_tx, cmd);
                    let view_cache = (self.view)(&model);
                    (self.reconciler)(&view_cache);
                }
            }
        };

        tracing::debug!(requests = http_state.issued(), ?exit, "runtime stopped");
        time_state.abort_all();
        exit
    }
}
