// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::time_utils::now_rfc3339;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Canonical local user, stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// System-generated ID (also used as document ID)
    pub id: String,
    /// Display name from the first provider that created this user
    pub name: String,
    /// Primary email (lookup hint for linking, not guaranteed unique)
    pub email: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
    /// When the user was first created (RFC3339)
    pub created_at: String,
}

/// Profile fields a new user is created from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

impl User {
    /// Instantiate an unsaved user with a fresh ID.
    pub fn new(fields: UserFields) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: fields.name,
            email: fields.email,
            avatar: fields.avatar,
            created_at: now_rfc3339(),
        }
    }
}
