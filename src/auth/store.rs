//! Persistence-collaborator boundary for user credentials and reset state.
//!
//! The relational store is owned by an external collaborator; this subsystem
//! only reads and writes the `password`, `reset_token`, and
//! `reset_token_expiry` fields through the [`UserStore`] trait. The bundled
//! [`MemoryUserStore`] backs tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::password::Credential;
use super::reset::ResetRecord;
use super::utils::normalize_email;

/// The collaborator-owned user shape this subsystem consumes.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub tier: String,
    pub password: Credential,
    pub reset_token: Option<Credential>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// The active reset record, if both persisted fields are present.
    #[must_use]
    pub fn reset_record(&self) -> Option<ResetRecord> {
        let token_hash = self.reset_token.clone()?;
        let expires_at = self.reset_token_expiry?;
        Some(ResetRecord {
            token_hash,
            expires_at,
        })
    }
}

/// Fields required to create a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub tier: String,
    pub password: Credential,
}

/// Outcome when attempting to create a user.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(UserRecord),
    Conflict,
}

/// Collaborator failure. Logged with detail server-side, surfaced to callers
/// as an opaque 500-class fault; never retried inside this subsystem.
#[derive(Debug, Error)]
#[error("user store failure: {0}")]
pub struct StoreError(pub anyhow::Error);

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn create(&self, new_user: NewUser) -> Result<CreateOutcome, StoreError>;

    async fn set_password(&self, user_id: Uuid, password: Credential) -> Result<(), StoreError>;

    /// Overwrite the reset record; each user has at most one active record.
    async fn set_reset_record(&self, user_id: Uuid, record: ResetRecord)
    -> Result<(), StoreError>;

    /// Consume the reset record after a completed password reset.
    async fn clear_reset_record(&self, user_id: Uuid) -> Result<(), StoreError>;
}

/// In-memory store keyed by normalized email.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, user_id: Uuid, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut users = self.users.write().await;
        let record = users
            .values_mut()
            .find(|record| record.id == user_id)
            .ok_or_else(|| StoreError(anyhow::anyhow!("unknown user id {user_id}")))?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&normalize_email(email)).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<CreateOutcome, StoreError> {
        let key = normalize_email(&new_user.email);
        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Ok(CreateOutcome::Conflict);
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: key.clone(),
            display_name: new_user.display_name,
            tier: new_user.tier,
            password: new_user.password,
            reset_token: None,
            reset_token_expiry: None,
        };
        users.insert(key, record.clone());
        Ok(CreateOutcome::Created(record))
    }

    async fn set_password(&self, user_id: Uuid, password: Credential) -> Result<(), StoreError> {
        self.update(user_id, |record| record.password = password)
            .await
    }

    async fn set_reset_record(
        &self,
        user_id: Uuid,
        record: ResetRecord,
    ) -> Result<(), StoreError> {
        self.update(user_id, |user| {
            user.reset_token = Some(record.token_hash);
            user.reset_token_expiry = Some(record.expires_at);
        })
        .await
    }

    async fn clear_reset_record(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.update(user_id, |user| {
            user.reset_token = None;
            user.reset_token_expiry = None;
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            display_name: "Ada".to_string(),
            tier: "free".to_string(),
            password: Credential::from_phc("$argon2id$stub"),
        }
    }

    #[tokio::test]
    async fn create_then_find_normalizes_email() -> Result<(), StoreError> {
        let store = MemoryUserStore::new();
        let outcome = store.create(new_user(" Ada@Example.COM ")).await?;
        assert!(matches!(outcome, CreateOutcome::Created(_)));

        let found = store.find_by_email("ada@example.com").await?;
        assert_eq!(found.map(|user| user.email), Some("ada@example.com".into()));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() -> Result<(), StoreError> {
        let store = MemoryUserStore::new();
        store.create(new_user("ada@example.com")).await?;
        let outcome = store.create(new_user("ADA@example.com")).await?;
        assert!(matches!(outcome, CreateOutcome::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn reset_record_overwrite_and_clear() -> Result<(), StoreError> {
        let store = MemoryUserStore::new();
        let CreateOutcome::Created(user) = store.create(new_user("ada@example.com")).await? else {
            panic!("expected creation");
        };

        let record = ResetRecord {
            token_hash: Credential::from_phc("$argon2id$first"),
            expires_at: Utc::now(),
        };
        store.set_reset_record(user.id, record).await?;

        let second = ResetRecord {
            token_hash: Credential::from_phc("$argon2id$second"),
            expires_at: Utc::now(),
        };
        store.set_reset_record(user.id, second).await?;

        let stored = store
            .find_by_email("ada@example.com")
            .await?
            .expect("user exists");
        assert_eq!(
            stored.reset_token.as_ref().map(Credential::as_str),
            Some("$argon2id$second")
        );
        assert!(stored.reset_record().is_some());

        store.clear_reset_record(user.id).await?;
        let cleared = store
            .find_by_email("ada@example.com")
            .await?
            .expect("user exists");
        assert!(cleared.reset_token.is_none());
        assert!(cleared.reset_token_expiry.is_none());
        assert!(cleared.reset_record().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn updates_for_unknown_user_fail() {
        let store = MemoryUserStore::new();
        let result = store
            .set_password(Uuid::new_v4(), Credential::from_phc("$argon2id$stub"))
            .await;
        assert!(result.is_err());
    }
}
