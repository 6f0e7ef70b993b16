//! Request authentication gate
//!
//! Wraps every inbound request: public paths pass through untouched, a
//! presented bearer token is always verified (even on paths that would
//! not have required one), and protected paths without a token are
//! rejected. The verified identity rides on the request extensions; no
//! state is carried between requests.

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, warn};

use super::token::{Identity, VerificationError};
use crate::api::types::ErrorBody;
use crate::api::AppState;

/// Identity context attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
    pub token: String,
}

pub async fn auth_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if is_public_path(&path) {
        return next.run(req).await;
    }

    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    if let Some(token) = bearer {
        return match state.verifier.verify(&token) {
            Ok(identity) => {
                debug!(
                    "Token validated for user: {} (ID: {:?}, Role: {:?})",
                    identity.subject, identity.user_id, identity.role
                );
                req.extensions_mut().insert(AuthContext { identity, token });
                next.run(req).await
            }
            Err(err) => {
                warn!("Token rejected on {}: {:?}", path, err);
                reject(verification_code(&err), verification_message(&err))
            }
        };
    }

    if requires_auth(&path) {
        return reject(
            "TOKEN_MISSING",
            "Authorization token is required for this endpoint.",
        );
    }

    // No token on a path that is neither public nor protected: pass
    // through without identity.
    next.run(req).await
}

fn is_public_path(path: &str) -> bool {
    path == "/health"
        || path == "/favicon.ico"
        || path.starts_with("/docs")
        || path.starts_with("/public")
        || path.starts_with("/swagger-ui")
        || path.starts_with("/v3/api-docs")
        || path.starts_with("/actuator")
}

fn requires_auth(path: &str) -> bool {
    path.starts_with("/account") || path.starts_with("/api/protected")
}

fn verification_code(err: &VerificationError) -> &'static str {
    match err {
        VerificationError::Expired => "TOKEN_EXPIRED",
        VerificationError::Malformed(_) => "TOKEN_MALFORMED",
        VerificationError::UnsupportedScheme(_) => "TOKEN_UNSUPPORTED",
        VerificationError::InvalidClaims(_) | VerificationError::Unknown(_) => "TOKEN_INVALID",
    }
}

fn verification_message(err: &VerificationError) -> &'static str {
    match err {
        VerificationError::Expired => "The token has expired. Please login again.",
        VerificationError::Malformed(_) => "The token is malformed.",
        VerificationError::UnsupportedScheme(_) => "The token format is not supported.",
        VerificationError::InvalidClaims(_) => "The token is empty or invalid.",
        VerificationError::Unknown(_) => "An error occurred while validating the token.",
    }
}

fn reject(code: &'static str, message: &str) -> Response {
    let body = ErrorBody::unauthorized(code, message);
    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Authorization, Content-Type"),
    );
    response
}
