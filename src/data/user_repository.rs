use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{EMAIL_IN_USE, NewUser, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email_address))]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        if storage
            .values()
            .any(|u| u.email_address == user.email_address)
        {
            debug!(email = %user.email_address, "Email already stored");
            return Err(DomainError::validation(EMAIL_IN_USE).into());
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        storage.insert(user.id, user.clone());
        debug!(user_id = user.id, email = %user.email_address, "User saved to memory storage");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage.values().find(|u| u.email_address == email).cloned();
        match &user {
            Some(u) => debug!(user_id = u.id, "User found in storage"),
            None => trace!("User not found in storage"),
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Joe".to_string(),
            last_name: "Smith".to_string(),
            email_address: email.to_string(),
            password_hash: "hash123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create_user(new_user("a@example.com")).await.unwrap();
        let second = repo.create_user(new_user("b@example.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_find_user_by_email_and_id() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create_user(new_user("alice@example.com")).await.unwrap();

        let by_email = repo.find_user_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, user.id);

        let by_id = repo.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email_address, "alice@example.com");
        assert_eq!(by_id.password_hash, "hash123");
    }

    #[tokio::test]
    async fn test_lookups_return_none_when_absent() {
        let repo = InMemoryUserRepository::new();

        assert!(repo.find_user_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(repo.find_user_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_validation_error() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(new_user("dup@example.com")).await.unwrap();

        let err = repo.create_user(new_user("dup@example.com")).await.unwrap_err();
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(messages)) => {
                assert_eq!(messages, &vec![EMAIL_IN_USE.to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_registrations_of_one_email_admit_one() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create_user(new_user("race@example.com")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }
}
