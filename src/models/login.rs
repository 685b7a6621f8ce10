// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider login records.
//!
//! A login ties one external account (`identifier`) to exactly one local user.
//! It starts life as a [`PendingLogin`] with no owner and only becomes a
//! [`Login`] when the store links and persists it.

use crate::time_utils::now_rfc3339;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Build the composite key naming one external account.
pub fn login_identifier(provider: &str, provider_local_id: &str) -> String {
    format!("{}-{}", provider, provider_local_id)
}

/// Persisted login, stored in the `logins` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    /// System-generated ID
    pub id: String,
    /// Owning user (foreign key into `users`)
    pub user_id: String,
    /// Identity provider name ("github", "twitter", ...)
    pub provider: String,
    /// `<provider>-<provider local id>`
    pub identifier: String,
    /// Provider account ID, when the provider reports one separately
    pub account_id: Option<String>,
    /// Provider access token
    pub token: Option<String>,
    /// Provider token secret (OAuth 1.0a providers)
    pub secret: Option<String>,
    /// When this login was linked (RFC3339)
    pub created_at: String,
}

/// Login fields taken from an assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginFields {
    pub provider: String,
    pub identifier: String,
    pub account_id: Option<String>,
    pub token: Option<String>,
    pub secret: Option<String>,
}

/// A login that has been instantiated but not yet linked to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
    id: String,
    fields: LoginFields,
}

impl PendingLogin {
    pub fn new(fields: LoginFields) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fields,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.fields.identifier
    }

    /// Attach the owning user, producing the record to persist.
    pub fn link_to(self, user_id: &str) -> Login {
        Login {
            id: self.id,
            user_id: user_id.to_string(),
            provider: self.fields.provider,
            identifier: self.fields.identifier,
            account_id: self.fields.account_id,
            token: self.fields.token,
            secret: self.fields.secret,
            created_at: now_rfc3339(),
        }
    }
}

/// Login as shown to its owner. Credentials are never exposed.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginSummary {
    pub id: String,
    pub provider: String,
    pub identifier: String,
    pub created_at: String,
}

impl From<Login> for LoginSummary {
    fn from(login: Login) -> Self {
        Self {
            id: login.id,
            provider: login.provider,
            identifier: login.identifier,
            created_at: login.created_at,
        }
    }
}
