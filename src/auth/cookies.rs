use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName};

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Returns the value of cookie `name` from the request's `Cookie` headers.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value for an http-only, secure token cookie.
pub fn token_cookie(name: &str, value: &str, max_age: Duration) -> String {
    format!(
        "{name}={value}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        max_age.as_secs()
    )
}

/// `Set-Cookie` value that makes the browser drop cookie `name`.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0")
}

pub type SetCookies = [(HeaderName, String); 2];

pub fn clear_token_cookies() -> SetCookies {
    [
        (header::SET_COOKIE, clear_cookie(ACCESS_COOKIE_NAME)),
        (header::SET_COOKIE, clear_cookie(REFRESH_COOKIE_NAME)),
    ]
}
