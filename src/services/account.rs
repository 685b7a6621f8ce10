// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account resolution: map a provider login onto a local user.
//!
//! Order of checks for an assertion:
//! 1. Known identifier: return the login's owner untouched.
//! 2. Unknown identifier, primary email matches a user: link a new login to
//!    that user.
//! 3. Otherwise: create a user and link a new login to it.
//!
//! No locks are taken here. Duplicate identifiers are refused by the store at
//! link time; the loser of such a race re-reads and returns the winner's user.

use crate::db::{RecordStore, StoreError};
use crate::models::{Login, LoginAssertion, User};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid login assertion: {0}")]
    InvalidAssertion(#[from] validator::ValidationErrors),

    #[error("Login {identifier} references missing user {user_id}")]
    OrphanLogin { identifier: String, user_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Short label that is safe to log (no profile data).
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::InvalidAssertion(_) => "invalid_assertion",
            ResolveError::OrphanLogin { .. } => "orphan_login",
            ResolveError::Store(StoreError::Conflict(_)) => "conflict",
            ResolveError::Store(StoreError::Offline) => "store_offline",
            ResolveError::Store(StoreError::Backend(_)) => "store_failure",
        }
    }
}

/// Which branch produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Identifier already linked
    Existing,
    /// New login linked to a user found by email
    LinkedByEmail,
    /// New user and new login
    Created,
}

/// A resolved (user, login) pair.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub user: User,
    pub login: Login,
    pub resolution: Resolution,
}

/// Result of the `user.login` action.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Result of the `user.get` action.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LookupOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Resolves login assertions against a record store.
#[derive(Clone)]
pub struct AccountResolver {
    store: Arc<dyn RecordStore>,
}

impl AccountResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Resolve an assertion to a linked (user, login) pair, creating records
    /// as needed.
    pub async fn resolve_login(
        &self,
        assertion: &LoginAssertion,
    ) -> Result<Resolved, ResolveError> {
        assertion.validate()?;

        let identifier = assertion.identifier();

        if let Some(login) = self.store.find_login_by_identifier(&identifier).await? {
            let user = self.owner_of(&login).await?;
            tracing::debug!(identifier = %identifier, user_id = %user.id, "Known login");
            return Ok(Resolved {
                user,
                login,
                resolution: Resolution::Existing,
            });
        }

        let pending = self.store.create_login(assertion.login_fields());

        let by_email = match assertion.primary_email() {
            Some(email) => self.store.find_user_by_email(email).await?,
            None => None,
        };
        let (user, resolution) = match by_email {
            Some(user) => (user, Resolution::LinkedByEmail),
            None => (
                self.store.create_user(assertion.user_fields()),
                Resolution::Created,
            ),
        };

        match self.store.link_and_persist(pending, &user).await {
            Ok(login) => {
                tracing::info!(
                    identifier = %identifier,
                    provider = %assertion.provider,
                    user_id = %user.id,
                    ?resolution,
                    "Login linked"
                );
                Ok(Resolved {
                    user,
                    login,
                    resolution,
                })
            }
            Err(StoreError::Conflict(_)) => {
                tracing::info!(
                    identifier = %identifier,
                    "Identifier linked concurrently, using existing login"
                );
                let login = self
                    .store
                    .find_login_by_identifier(&identifier)
                    .await?
                    .ok_or(StoreError::Conflict(identifier))?;
                let user = self.owner_of(&login).await?;
                Ok(Resolved {
                    user,
                    login,
                    resolution: Resolution::Existing,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `user.login`: resolve an assertion, never failing past this boundary.
    pub async fn login(&self, assertion: &LoginAssertion) -> LoginOutcome {
        match self.resolve_login(assertion).await {
            Ok(resolved) => LoginOutcome {
                success: true,
                user: Some(resolved.user),
                err: None,
            },
            Err(err) => {
                tracing::error!(
                    provider = %assertion.provider,
                    kind = err.kind(),
                    "Login resolution failed"
                );
                LoginOutcome {
                    success: false,
                    user: None,
                    err: Some(err.to_string()),
                }
            }
        }
    }

    /// `user.get`: look up a user by ID.
    pub async fn get_user(&self, id: &str) -> LookupOutcome {
        match self.store.find_user_by_id(id).await {
            Ok(Some(user)) => LookupOutcome {
                success: true,
                user: Some(user),
            },
            Ok(None) => {
                tracing::debug!(user_id = %id, "User not found");
                LookupOutcome {
                    success: false,
                    user: None,
                }
            }
            Err(e) => {
                tracing::error!(user_id = %id, error = %e, "User lookup failed");
                LookupOutcome {
                    success: false,
                    user: None,
                }
            }
        }
    }

    /// Logins owned by a user, loaded on demand.
    pub async fn logins_for(&self, user_id: &str) -> Result<Vec<Login>, StoreError> {
        self.store.find_logins_for_user(user_id).await
    }

    async fn owner_of(&self, login: &Login) -> Result<User, ResolveError> {
        self.store
            .find_user_by_id(&login.user_id)
            .await?
            .ok_or_else(|| ResolveError::OrphanLogin {
                identifier: login.identifier.clone(),
                user_id: login.user_id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{ProfileEmail, ProfilePhoto};

    fn assertion(provider: &str, id: &str, email: Option<&str>) -> LoginAssertion {
        LoginAssertion {
            provider: provider.to_string(),
            id: id.to_string(),
            name: Some("Ada".to_string()),
            emails: email
                .map(|value| {
                    vec![ProfileEmail {
                        value: value.to_string(),
                    }]
                })
                .unwrap_or_default(),
            photos: vec![ProfilePhoto {
                value: "https://img/ada.png".to_string(),
            }],
            ..Default::default()
        }
    }

    fn resolver() -> (AccountResolver, MemoryStore) {
        let store = MemoryStore::new();
        (AccountResolver::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_branches() {
        let (resolver, store) = resolver();

        let created = resolver
            .resolve_login(&assertion("github", "42", Some("ada@x.io")))
            .await
            .unwrap();
        assert_eq!(created.resolution, Resolution::Created);
        assert_eq!(created.user.avatar.as_deref(), Some("https://img/ada.png"));

        let existing = resolver
            .resolve_login(&assertion("github", "42", Some("ada@x.io")))
            .await
            .unwrap();
        assert_eq!(existing.resolution, Resolution::Existing);
        assert_eq!(existing.login.id, created.login.id);

        let linked = resolver
            .resolve_login(&assertion("twitter", "99", Some("ada@x.io")))
            .await
            .unwrap();
        assert_eq!(linked.resolution, Resolution::LinkedByEmail);
        assert_eq!(linked.user.id, created.user.id);

        assert_eq!(store.user_count(), 1);
        assert_eq!(store.login_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_assertion_fails_fast() {
        let (resolver, store) = resolver();

        let err = resolver
            .resolve_login(&assertion("", "42", None))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "invalid_assertion");
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_login_action_reports_store_failure() {
        let resolver = AccountResolver::new(Arc::new(MemoryStore::new_failing()));

        let outcome = resolver.login(&assertion("github", "1", None)).await;

        assert!(!outcome.success);
        assert!(outcome.user.is_none());
        assert!(outcome.err.unwrap().contains("injected failure"));
    }

    #[tokio::test]
    async fn test_outcome_json_shape() {
        let (resolver, _) = resolver();

        let ok = resolver.login(&assertion("github", "7", None)).await;
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("err").is_none());

        let missing = resolver.get_user("nope").await;
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false }));
    }
}
