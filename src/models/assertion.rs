// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized identity-provider login assertion.
//!
//! This is the profile payload handed over by the auth front end after a
//! provider round-trip. Field names follow the common OAuth profile shape
//! (`emails: [{ value }]`, `photos: [{ value }]`).

use crate::models::login::{login_identifier, LoginFields};
use crate::models::user::UserFields;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError};

/// A login assertion from an identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginAssertion {
    /// Provider name ("github", "google", ...)
    #[validate(length(min = 1, max = 64))]
    pub provider: String,
    /// Provider-local account ID
    #[validate(length(min = 1, max = 256))]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Ordered email list; the first entry is treated as primary
    #[serde(default)]
    #[validate(custom(function = "validate_primary_email"))]
    pub emails: Vec<ProfileEmail>,
    /// Ordered photo list; the first entry is used as the avatar
    #[serde(default)]
    pub photos: Vec<ProfilePhoto>,
    /// Provider account ID, if distinct from `id`
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEmail {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePhoto {
    pub value: String,
}

/// Only the primary email takes part in linking, so only it must be well formed.
fn validate_primary_email(emails: &[ProfileEmail]) -> Result<(), ValidationError> {
    match emails.first() {
        Some(primary) if !primary.value.validate_email() => Err(ValidationError::new("email")),
        _ => Ok(()),
    }
}

impl LoginAssertion {
    /// `<provider>-<id>`
    pub fn identifier(&self) -> String {
        login_identifier(&self.provider, &self.id)
    }

    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(|e| e.value.as_str())
    }

    pub fn avatar(&self) -> Option<&str> {
        self.photos.first().map(|p| p.value.as_str())
    }

    /// Fields for a user created from this assertion.
    pub fn user_fields(&self) -> UserFields {
        UserFields {
            name: self.name.clone().unwrap_or_default(),
            email: self.primary_email().map(str::to_string),
            avatar: self.avatar().map(str::to_string),
        }
    }

    /// Fields for the login created from this assertion.
    pub fn login_fields(&self) -> LoginFields {
        LoginFields {
            provider: self.provider.clone(),
            identifier: self.identifier(),
            account_id: self.account_id.clone(),
            token: self.token.clone(),
            secret: self.secret.clone(),
        }
    }
}
