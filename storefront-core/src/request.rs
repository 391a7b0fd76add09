/// Where the page goes when the app hands control back to the browser.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Navigation {
    /// Reload the current document.
    Reload,
    /// Native (non-script) form submission.
    Submit { url: String, body: String },
}

/// Core requests (runtime-level, no callbacks)
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum CoreRequest {
    Shutdown,
    Navigate(Navigation),
}

pub fn shutdown() -> CoreRequest {
    CoreRequest::Shutdown
}

pub fn reload() -> CoreRequest {
    CoreRequest::Navigate(Navigation::Reload)
}

pub fn submit_form(url: impl Into<String>, body: impl Into<String>) -> CoreRequest {
    CoreRequest::Navigate(Navigation::Submit {
        url: url.into(),
        body: body.into(),
    })
}
