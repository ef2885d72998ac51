//! Shared handler helpers.

use axum::{
    http::{header, StatusCode},
    response::Response,
};
use sha2::{Digest, Sha256};

/// Build a 302 Found redirect.
///
/// `axum::response::Redirect` answers 303/307/308; the login flow is
/// specified as plain 302, so build it directly.
pub fn found(location: &str) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .body(axum::body::Body::empty())
        .unwrap_or_default()
}

/// Short stable fingerprint of a sensitive value, safe to log.
pub fn hash_for_log(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}
