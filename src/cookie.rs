/// Value of the first cookie called `name` in a `document.cookie` style
/// string, percent-decoded. The string is rescanned on every call.
pub fn get_cookie(cookies: &str, name: &str) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let prefix = format!("{name}=");
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(decode)
}

fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(value) => value.into_owned(),
        Err(err) => {
            tracing::debug!(error = %err, "cookie value is not valid UTF-8 once decoded, using it raw");
            raw.to_string()
        }
    }
}
