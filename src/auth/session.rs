use axum::http::{header, HeaderMap};

/// Cookie carrying the session token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Finds the session token on a request: the `accessToken` cookie wins,
/// otherwise the `Authorization` header with any `Bearer ` prefix stripped.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_TOKEN_COOKIE).or_else(|| {
        let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        (!token.is_empty()).then(|| token.to_string())
    })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

/// `Set-Cookie` value that stores the token in the browser.
pub fn session_cookie(token: &str) -> String {
    format!("{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; Secure")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_session_cookie() -> String {
    format!(
        "{ACCESS_TOKEN_COOKIE}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure"
    )
}
