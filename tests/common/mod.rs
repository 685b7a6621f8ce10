// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use account_resolver::config::Config;
use account_resolver::db::{FirestoreDb, MemoryStore, RecordStore};
use account_resolver::models::{LoginAssertion, ProfileEmail, ProfilePhoto};
use account_resolver::routes::create_router;
use account_resolver::services::AccountResolver;
use account_resolver::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Build an assertion the way the auth front end would.
#[allow(dead_code)]
pub fn assertion(
    provider: &str,
    id: &str,
    name: Option<&str>,
    emails: &[&str],
    photos: &[&str],
) -> LoginAssertion {
    LoginAssertion {
        provider: provider.to_string(),
        id: id.to_string(),
        name: name.map(str::to_string),
        emails: emails
            .iter()
            .map(|value| ProfileEmail {
                value: value.to_string(),
            })
            .collect(),
        photos: photos
            .iter()
            .map(|value| ProfilePhoto {
                value: value.to_string(),
            })
            .collect(),
        ..Default::default()
    }
}

/// Create a test app over the given store.
#[allow(dead_code)]
pub fn create_test_app_with_store(store: Arc<dyn RecordStore>) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        accounts: AccountResolver::new(store),
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by a fresh in-memory store.
/// Returns the router, the shared state, and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryStore) {
    let store = MemoryStore::new();
    let (app, state) = create_test_app_with_store(Arc::new(store.clone()));
    (app, state, store)
}

/// Create a session JWT for a user ID.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    account_resolver::middleware::auth::create_jwt(user_id, signing_key)
        .expect("Failed to create JWT")
}
