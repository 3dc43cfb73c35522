use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, EMAIL_IN_USE, User};
use crate::infrastructure::security::{BasicCredentials, hash_password, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

pub const ACCESS_DENIED: &str = "Access Denied";

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    #[instrument(skip(self, req), fields(email = %req.email()))]
    pub async fn register_user(&self, req: CreateUser) -> Result<User> {
        trace!("Starting user registration");

        let errors = req.validate();
        if !errors.is_empty() {
            warn!(?errors, "User payload failed validation");
            return Err(DomainError::Validation(errors).into());
        }

        if self
            .user_repository
            .find_user_by_email(req.email())
            .await?
            .is_some()
        {
            warn!("User already exists");
            return Err(DomainError::validation(EMAIL_IN_USE).into());
        }

        let password = req.password.clone().unwrap_or_default();
        let password_hash = hash_password(&password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = self
            .user_repository
            .create_user(req.into_new_user(password_hash))
            .await?;

        info!(user_id = user.id, email = %user.email_address, "User registered successfully");
        Ok(user)
    }

    /// Resolves basic-auth credentials to a stored user.
    ///
    /// Unknown emails and wrong passwords both come back as
    /// `DomainError::Unauthorized` and are only told apart in the logs.
    #[instrument(skip(self, credentials), fields(email = %credentials.name))]
    pub async fn authenticate(&self, credentials: &BasicCredentials) -> Result<User> {
        let Some(user) = self
            .user_repository
            .find_user_by_email(&credentials.name)
            .await?
        else {
            warn!(email = %credentials.name, "User not found for email");
            return Err(DomainError::Unauthorized(ACCESS_DENIED.to_string()).into());
        };

        let is_valid = verify_password(&credentials.pass, &user.password_hash).map_err(|e| {
            error!(user_id = user.id, error = %e, "Stored password hash is unreadable");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(email = %user.email_address, "Authentication failure for email");
            return Err(DomainError::Unauthorized(ACCESS_DENIED.to_string()).into());
        }

        info!(email = %user.email_address, "Authentication successful");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn current_user(&self, user_id: i64) -> Result<User> {
        debug!("Loading authenticated user");
        self.user_repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User not found: {}", user_id)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::InMemoryUserRepository;

    fn service() -> AuthService {
        AuthService::new(Arc::new(InMemoryUserRepository::new()))
    }

    fn joe() -> CreateUser {
        CreateUser {
            first_name: Some("Joe".to_string()),
            last_name: Some("Smith".to_string()),
            email_address: Some("joe@smith.com".to_string()),
            password: Some("joepassword".to_string()),
        }
    }

    fn creds(name: &str, pass: &str) -> BasicCredentials {
        BasicCredentials {
            name: name.to_string(),
            pass: pass.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let service = service();
        let user = service.register_user(joe()).await.unwrap();

        assert_ne!(user.password_hash, "joepassword");
        assert!(verify_password("joepassword", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_payload() {
        let service = service();
        let err = service
            .register_user(CreateUser::default())
            .await
            .unwrap_err();
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(messages)) => assert_eq!(messages.len(), 4),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let service = service();
        service.register_user(joe()).await.unwrap();

        let err = service.register_user(joe()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(m)) if m == &vec![EMAIL_IN_USE.to_string()]
        ));
    }

    #[tokio::test]
    async fn test_authenticate_accepts_correct_password() {
        let service = service();
        let registered = service.register_user(joe()).await.unwrap();

        let user = service
            .authenticate(&creds("joe@smith.com", "joepassword"))
            .await
            .unwrap();
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_password_and_unknown_email() {
        let service = service();
        service.register_user(joe()).await.unwrap();

        for c in [creds("joe@smith.com", "nope"), creds("ghost@smith.com", "joepassword")] {
            let err = service.authenticate(&c).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DomainError>(),
                Some(DomainError::Unauthorized(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_current_user_not_found() {
        let err = service().current_user(404).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound(_))
        ));
    }
}
