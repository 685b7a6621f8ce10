// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed record store.
//!
//! Layout:
//! - `users/{user_id}`
//! - `logins/{urlencoded identifier}`
//!
//! Keying logins by identifier means a second login for the same external
//! account can never exist as a separate document.

use crate::db::{collections, RecordStore, StoreError};
use crate::models::{Login, PendingLogin, User};
use async_trait::async_trait;
use firestore::FirestoreWritePrecondition;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Document ID for a login identifier.
pub fn login_doc_id(identifier: &str) -> String {
    urlencoding::encode(identifier).into_owned()
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| backend(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| backend(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return [`StoreError::Offline`].
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or(StoreError::Offline)
    }
}

#[async_trait]
impl RecordStore for FirestoreDb {
    async fn find_login_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Login>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LOGINS)
            .obj()
            .one(&login_doc_id(identifier))
            .await
            .map_err(backend)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(backend)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(backend)?;

        Ok(users.into_iter().next())
    }

    async fn find_logins_for_user(&self, user_id: &str) -> Result<Vec<Login>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LOGINS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    /// Write the user and the login in a single transaction.
    ///
    /// The login document is written with an `exists: false` precondition,
    /// so of two concurrent links for one identifier only one commits.
    async fn link_and_persist(
        &self,
        login: PendingLogin,
        user: &User,
    ) -> Result<Login, StoreError> {
        let client = self.get_client()?;
        let doc_id = login_doc_id(login.identifier());

        // Refuse to overwrite an identifier someone else already linked.
        let existing: Option<Login> = client
            .fluent()
            .select()
            .by_id_in(collections::LOGINS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(backend)?;
        if existing.is_some() {
            tracing::warn!(
                identifier = login.identifier(),
                "Identifier already linked, refusing to overwrite"
            );
            return Err(StoreError::Conflict(login.identifier().to_string()));
        }

        let login = login.link_to(&user.id);

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| backend(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| backend(format!("Failed to add user to transaction: {}", e)))?;

        // Only create the login; the commit fails if a racer created it first.
        client
            .fluent()
            .update()
            .in_col(collections::LOGINS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&doc_id)
            .object(&login)
            .add_to_transaction(&mut transaction)
            .map_err(|e| backend(format!("Failed to add login to transaction: {}", e)))?;

        if let Err(e) = transaction.commit().await {
            let winner: Option<Login> = client
                .fluent()
                .select()
                .by_id_in(collections::LOGINS)
                .obj()
                .one(&doc_id)
                .await
                .map_err(backend)?;
            return match winner {
                Some(winner) if winner.id != login.id => {
                    tracing::warn!(
                        identifier = %login.identifier,
                        winner_user_id = %winner.user_id,
                        "Identifier linked concurrently, commit refused"
                    );
                    Err(StoreError::Conflict(login.identifier))
                }
                _ => Err(backend(format!("Transaction commit failed: {}", e))),
            };
        }

        tracing::info!(
            identifier = %login.identifier,
            user_id = %user.id,
            "Login linked"
        );

        Ok(login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_doc_id_is_path_safe() {
        assert_eq!(login_doc_id("github-42"), "github-42");
        assert!(!login_doc_id("weird-a/b").contains('/'));
    }

    #[tokio::test]
    async fn test_offline_client_reports_offline() {
        let db = FirestoreDb::new_mock();
        assert!(matches!(
            db.find_user_by_id("u1").await,
            Err(StoreError::Offline)
        ));
        assert!(matches!(
            db.find_login_by_identifier("github-1").await,
            Err(StoreError::Offline)
        ));
    }
}
