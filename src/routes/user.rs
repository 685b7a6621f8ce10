// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User routes: login resolution (internal) and session user lookup.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{LoginAssertion, LoginSummary, User};
use crate::services::LookupOutcome;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Routes for the session user (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/current", get(current_user))
        .route("/user/current/logins", get(current_logins))
}

/// Routes for the auth front end (internal auth applied in routes/mod.rs).
pub fn internal_routes() -> Router<Arc<AppState>> {
    Router::new().route("/internal/user/login", post(login))
}

// ─── Login ───────────────────────────────────────────────────

/// Login response: the action outcome plus a session token on success.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Resolve a provider login to a local user and issue a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(assertion): Json<LoginAssertion>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    assertion
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid login assertion: {}", e)))?;

    let outcome = state.accounts.login(&assertion).await;

    let user = match outcome.user {
        Some(user) if outcome.success => user,
        _ => {
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LoginResponse {
                    success: false,
                    user: None,
                    err: outcome.err,
                    token: None,
                }),
            ))
        }
    };

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(
        user_id = %user.id,
        provider = %assertion.provider,
        "Login resolved, session issued"
    );

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            user: Some(user),
            err: None,
            token: Some(token),
        }),
    ))
}

// ─── Current User ────────────────────────────────────────────

/// Look up the session user. Any failed lookup is a 500.
async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<LookupOutcome>) {
    let outcome = state.accounts.get_user(&user.user_id).await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(outcome))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginsResponse {
    pub logins: Vec<LoginSummary>,
}

/// List the providers linked to the session user.
async fn current_logins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LoginsResponse>> {
    let logins = state.accounts.logins_for(&user.user_id).await?;

    Ok(Json(LoginsResponse {
        logins: logins.into_iter().map(LoginSummary::from).collect(),
    }))
}
