// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record store for users and logins.
//!
//! The account resolver only talks to [`RecordStore`]; backends are picked at
//! startup (`STORE_BACKEND`).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::models::{Login, LoginFields, PendingLogin, User, UserFields};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Logins keyed by encoded identifier
    pub const LOGINS: &str = "logins";
}

/// Record store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another writer linked this identifier first.
    #[error("Login identifier already linked: {0}")]
    Conflict(String),

    #[error("Database not connected (offline mode)")]
    Offline,

    #[error("Database error: {0}")]
    Backend(String),
}

/// Persistence for users and logins.
///
/// Lookups return `Ok(None)` for missing records; `Err` is reserved for
/// genuine I/O or backend failures.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the login for an identifier (at most one is expected).
    async fn find_login_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Login>, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Find a user by exact email. If several share it, the first wins.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Load every login owned by a user.
    async fn find_logins_for_user(&self, user_id: &str) -> Result<Vec<Login>, StoreError>;

    /// Instantiate an unsaved login.
    fn create_login(&self, fields: LoginFields) -> PendingLogin {
        PendingLogin::new(fields)
    }

    /// Instantiate an unsaved user.
    fn create_user(&self, fields: UserFields) -> User {
        User::new(fields)
    }

    /// Attach `login` to `user` and write both records.
    ///
    /// Either both writes land or neither does. Returns
    /// [`StoreError::Conflict`] if the identifier is already linked.
    async fn link_and_persist(
        &self,
        login: PendingLogin,
        user: &User,
    ) -> Result<Login, StoreError>;
}
