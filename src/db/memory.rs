// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process record store.
//!
//! Backs local development and tests. Index maps mirror the secondary indexes
//! a real backend would keep (login by identifier, user by email).

use crate::db::{RecordStore, StoreError};
use crate::models::{Login, PendingLogin, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    users: DashMap<String, User>,
    /// Login ID -> login
    logins: DashMap<String, Login>,
    /// Identifier -> login ID
    identifiers: DashMap<String, String>,
    /// Email -> user IDs in insertion order
    emails: DashMap<String, Vec<String>>,
}

/// Record store held entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, for exercising error paths.
    pub fn new_failing() -> Self {
        Self {
            tables: Arc::default(),
            failing: true,
        }
    }

    pub fn user_count(&self) -> usize {
        self.tables.users.len()
    }

    pub fn login_count(&self) -> usize {
        self.tables.logins.len()
    }

    /// Insert a user directly, bypassing linking (seeding fixtures).
    pub fn insert_user(&self, user: User) {
        self.put_user(user);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        Ok(())
    }

    fn put_user(&self, user: User) {
        let previous = self.tables.users.insert(user.id.clone(), user.clone());

        let old_email = previous.and_then(|u| u.email);
        if old_email == user.email {
            return;
        }
        if let Some(old) = old_email {
            if let Some(mut ids) = self.tables.emails.get_mut(&old) {
                ids.retain(|id| id != &user.id);
            }
        }
        if let Some(email) = user.email {
            self.tables.emails.entry(email).or_default().push(user.id);
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_login_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Login>, StoreError> {
        self.check()?;
        let login_id = match self.tables.identifiers.get(identifier) {
            Some(id) => id.value().clone(),
            None => return Ok(None),
        };
        Ok(self.tables.logins.get(&login_id).map(|l| l.value().clone()))
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.tables.users.get(id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let first = self
            .tables
            .emails
            .get(email)
            .and_then(|ids| ids.first().cloned());
        Ok(first.and_then(|id| self.tables.users.get(&id).map(|u| u.value().clone())))
    }

    async fn find_logins_for_user(&self, user_id: &str) -> Result<Vec<Login>, StoreError> {
        self.check()?;
        let mut logins: Vec<Login> = self
            .tables
            .logins
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.value().clone())
            .collect();
        logins.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(logins)
    }

    async fn link_and_persist(
        &self,
        login: PendingLogin,
        user: &User,
    ) -> Result<Login, StoreError> {
        self.check()?;

        // The identifier entry stays locked until both records are written.
        match self.tables.identifiers.entry(login.identifier().to_string()) {
            Entry::Occupied(entry) => Err(StoreError::Conflict(entry.key().clone())),
            Entry::Vacant(entry) => {
                let login = login.link_to(&user.id);
                self.put_user(user.clone());
                self.tables.logins.insert(login.id.clone(), login.clone());
                entry.insert(login.id.clone());
                Ok(login)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoginFields, UserFields};

    fn pending(identifier: &str) -> PendingLogin {
        PendingLogin::new(LoginFields {
            provider: "github".to_string(),
            identifier: identifier.to_string(),
            ..Default::default()
        })
    }

    fn user(email: Option<&str>) -> User {
        User::new(UserFields {
            name: "Test".to_string(),
            email: email.map(str::to_string),
            avatar: None,
        })
    }

    #[tokio::test]
    async fn test_link_writes_both_records() {
        let store = MemoryStore::new();
        let user = user(Some("a@x.io"));

        let login = store
            .link_and_persist(pending("github-1"), &user)
            .await
            .unwrap();

        assert_eq!(login.user_id, user.id);
        assert_eq!(
            store.find_login_by_identifier("github-1").await.unwrap(),
            Some(login)
        );
        assert_eq!(
            store.find_user_by_id(&user.id).await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(
            store.find_user_by_email("a@x.io").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn test_duplicate_identifier_conflicts_without_writing() {
        let store = MemoryStore::new();
        store
            .link_and_persist(pending("github-1"), &user(None))
            .await
            .unwrap();

        let err = store
            .link_and_persist(pending("github-1"), &user(None))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(ref id) if id == "github-1"));
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.login_count(), 1);
    }

    #[tokio::test]
    async fn test_email_lookup_first_match_wins() {
        let store = MemoryStore::new();
        let first = user(Some("dup@x.io"));
        let second = user(Some("dup@x.io"));
        store.insert_user(first.clone());
        store.insert_user(second);

        let found = store.find_user_by_email("dup@x.io").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(store.find_user_by_email("DUP@x.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logins_for_user() {
        let store = MemoryStore::new();
        let owner = user(None);
        store
            .link_and_persist(pending("github-1"), &owner)
            .await
            .unwrap();
        store
            .link_and_persist(pending("twitter-2"), &owner)
            .await
            .unwrap();
        store
            .link_and_persist(pending("google-3"), &user(None))
            .await
            .unwrap();

        let logins = store.find_logins_for_user(&owner.id).await.unwrap();
        let mut identifiers: Vec<_> = logins.iter().map(|l| l.identifier.as_str()).collect();
        identifiers.sort();
        assert_eq!(identifiers, vec!["github-1", "twitter-2"]);
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryStore::new_failing();
        assert!(matches!(
            store.find_user_by_id("x").await,
            Err(StoreError::Backend(_))
        ));
        assert!(store
            .link_and_persist(pending("github-1"), &user(None))
            .await
            .is_err());
    }
}
