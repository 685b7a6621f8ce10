// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication for internal callers.
//!
//! Login assertions are only accepted from the auth front end that completed
//! the provider round-trip. It presents a shared bearer token.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <INTERNAL_API_TOKEN>` for `/internal/*` routes.
pub async fn require_internal_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(presented) = presented else {
        tracing::warn!("Blocked internal request without bearer token");
        return Err(StatusCode::FORBIDDEN);
    };

    if !token_matches(presented, &state.config.internal_api_token) {
        tracing::warn!("Blocked internal request with invalid token");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

fn token_matches(presented: &str, expected: &str) -> bool {
    // An unset token must never match an empty header.
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
