use std::sync::Arc;

use crate::{FormBody, HttpError, HttpMethod, HttpRequest, HttpResponse};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub fn get<Msg>(
    url: impl Into<String>,
    returns: impl Fn(Result<HttpResponse, HttpError>) -> Msg + Send + Sync + 'static,
) -> HttpRequest<Msg> {
    HttpRequest {
        method: HttpMethod::Get,
        url: url.into(),
        headers: Vec::new(),
        body: None,
        returns: Arc::new(returns),
    }
}

pub fn post<Msg>(
    url: impl Into<String>,
    body: impl Into<Vec<u8>>,
    returns: impl Fn(Result<HttpResponse, HttpError>) -> Msg + Send + Sync + 'static,
) -> HttpRequest<Msg> {
    HttpRequest {
        method: HttpMethod::Post,
        url: url.into(),
        headers: Vec::new(),
        body: Some(body.into()),
        returns: Arc::new(returns),
    }
}

/// POST a url-encoded form body.
pub fn post_form<Msg>(
    url: impl Into<String>,
    form: &FormBody,
    returns: impl Fn(Result<HttpResponse, HttpError>) -> Msg + Send + Sync + 'static,
) -> HttpRequest<Msg> {
    let mut req = post(url, form.encode(), returns);
    req.headers
        .push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
    req
}
