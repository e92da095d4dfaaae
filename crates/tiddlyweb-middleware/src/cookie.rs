//! Identity cookies.
//!
//! A signed cookie value is `value:digest`, where `digest` is the hex
//! SHA-256 of `value` followed by the server secret.

use std::fmt::Write as _;

use tiddlyweb_core::util::sha256_hex;

/// Name of the cookie carrying the signed user name.
pub const USER_COOKIE: &str = "tiddlyweb_user";

/// Builds a `Set-Cookie` header value.
///
/// With a `mac_key` the value is signed. `Secure` is never set.
#[must_use]
pub fn make_cookie(
    name: &str,
    value: &str,
    mac_key: Option<&str>,
    path: Option<&str>,
    max_age: Option<u64>,
    httponly: bool,
    domain: Option<&str>,
) -> String {
    let mut cookie = match mac_key {
        Some(key) => format!("{name}={value}:{}", sign(value, key)),
        None => format!("{name}={value}"),
    };

    if let Some(domain) = domain {
        let _ = write!(cookie, "; Domain={domain}");
    }
    if let Some(max_age) = max_age {
        let _ = write!(cookie, "; Max-Age={max_age}");
    }
    if let Some(path) = path {
        let _ = write!(cookie, "; Path={path}");
    }
    if httponly {
        cookie.push_str("; httponly");
    }
    cookie
}

/// Returns the signature of `value` under `secret`.
#[must_use]
pub fn sign(value: &str, secret: &str) -> String {
    sha256_hex(format!("{value}{secret}"))
}

/// Checks a signed `value:digest` string and returns the value.
#[must_use]
pub fn verify_signed(signed: &str, secret: &str) -> Option<String> {
    let (value, digest) = signed.rsplit_once(':')?;
    (!value.is_empty() && sign(value, secret) == digest).then(|| value.to_string())
}

/// Finds a cookie in a `Cookie` request header. Surrounding double quotes
/// are removed from the value.
#[must_use]
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"'))
    })
}
