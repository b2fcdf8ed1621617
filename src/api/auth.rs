//! Static basic-auth gate.
//!
//! One user/password pair from the configuration protects every route except
//! the liveness probe. Failed attempts get a `401` with a `Basic` challenge and
//! never reach the handler.

use super::state::AppState;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Paths reachable without credentials.
pub const PUBLIC_PATHS: &[&str] = &["/health"];

pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if PUBLIC_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let authorized = basic_credentials(req.headers()).is_some_and(|(user, password)| {
        credentials_match(
            &user,
            &password,
            &state.config.admin_user,
            &state.config.admin_password,
        )
    });

    if authorized {
        next.run(req).await
    } else {
        tracing::debug!("Rejected unauthenticated request to {}", req.uri().path());
        unauthorized()
    }
}

/// Extracts `(user, password)` from an `Authorization: Basic ...` header.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

pub fn credentials_match(user: &str, password: &str, expected_user: &str, expected_password: &str) -> bool {
    // Non-short-circuiting `&`: both comparisons always run.
    let user_ok = constant_time_eq(user.as_bytes(), expected_user.as_bytes());
    let password_ok = constant_time_eq(password.as_bytes(), expected_password.as_bytes());
    user_ok & password_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn unauthorized() -> Response {
    let challenge = HeaderValue::from_static("Basic realm=\"feedback-dashboard\"");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, challenge)],
        "Access denied",
    )
        .into_response()
}
