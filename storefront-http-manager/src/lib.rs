//! HTTP effect manager.
//!
//! Requests are plain data plus a `returns` callback that turns the outcome
//! into an app message. The manager spawns one task per request, so replies
//! reach the app in arrival order, not issue order.

mod form;
pub mod requests;
mod transport;

pub use form::FormBody;
pub use requests::{get, post, post_form};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{OutboundRequest, Transport};

use std::sync::Arc;

use storefront_core::Router;
use storefront_core_macros::Request;
use thiserror::Error;

/// Header marking a request as script-issued rather than a page navigation.
pub const REQUESTED_WITH: &str = "X-Requested-With";
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Clone, Request)]
pub struct HttpRequest<Msg> {
    pub method: HttpMethod,
    pub url: String,
    #[request(redact)]
    pub headers: Vec<(String, String)>,
    #[request(redact)]
    pub body: Option<Vec<u8>>, // None for GET
    pub returns: Arc<dyn Fn(Result<HttpResponse, HttpError>) -> Msg + Send + Sync>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport-level failure: the request never produced a response.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    pub message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<Msg: 'static> HttpRequest<Msg> {
    /// Add a header, keeping any existing ones.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Mark the request as programmatic so the server answers with data
    /// instead of a redirect.
    pub fn programmatic(self) -> Self {
        self.header(REQUESTED_WITH, XML_HTTP_REQUEST)
    }

    pub fn map<Msg2>(
        self,
        f: impl Fn(Msg) -> Msg2 + Send + Sync + Clone + 'static,
    ) -> HttpRequest<Msg2> {
        let f = Arc::new(f);
        let returns = self.returns;
        HttpRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            returns: Arc::new(move |r| f(returns(r))),
        }
    }

    fn split(self) -> (OutboundRequest, Arc<dyn Fn(Result<HttpResponse, HttpError>) -> Msg + Send + Sync>) {
        let outbound = OutboundRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        };
        (outbound, self.returns)
    }
}

/// Bookkeeping carried between `on_effects` calls.
#[derive(Debug, Default)]
pub struct HttpState {
    issued: u64,
}

impl HttpState {
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

// === Effect Manager ===

pub struct HttpManager {
    transport: Arc<dyn Transport>,
}

impl HttpManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn init() -> HttpState {
        HttpState::default()
    }

    /// Start every request on its own task. There is no in-flight guard,
    /// cancellation or timeout: each reply is delivered whenever it lands.
    pub fn on_effects<Msg: Send + 'static>(
        &self,
        router: &Router<Msg>,
        mut state: HttpState,
        effects: Vec<HttpRequest<Msg>>,
    ) -> HttpState {
        for req in effects {
            state.issued += 1;
            let (outbound, returns) = req.split();
            tracing::debug!(
                method = outbound.method.as_str(),
                url = %outbound.url,
                seq = state.issued,
                "dispatching http request"
            );
            let router = router.clone();
            let transport = Arc::clone(&self.transport);
            tokio::spawn(async move {
                let result = transport.send(outbound).await;
                if let Err(err) = &result {
                    tracing::debug!(error = %err, "http transport failed");
                }
                router.send(returns(result));
            });
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_is_a_std_error() {
        let err: Box<dyn std::error::Error + Send + Sync> = Box::new(HttpError::new("connection reset"));
        assert_eq!(err.to_string(), "connection reset");
        assert!(err.source().is_none());
    }
}
