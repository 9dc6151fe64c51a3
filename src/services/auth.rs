//! Authentication service
//!
//! Registration, credential verification and token resolution. Login
//! reports the same `InvalidCredentials` error whether the username is
//! unknown or the password is wrong, so responses never reveal which
//! accounts exist.

use crate::db::repositories::UserRepository;
use crate::models::User;
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{TokenCodec, TokenError};
use anyhow::Result;
use std::sync::Arc;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Wrong username or password; deliberately does not say which
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Authentication service
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    tokens: TokenCodec,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: TokenCodec) -> Self {
        Self { user_repo, tokens }
    }

    /// Register a new user account.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if username or password is empty
    /// - `UserExists` if the username is already taken
    /// - `InternalError` for database errors
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Username is required".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Password is required".to_string(),
            ));
        }

        if self.user_repo.get_by_username(username).await?.is_some() {
            return Err(AuthServiceError::UserExists(username.to_string()));
        }

        let password_hash = hash_password(password)?;
        let user = self
            .user_repo
            .create(&User::new(username.to_string(), password_hash))
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a signed token.
    ///
    /// Unknown username and wrong password both yield
    /// `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthServiceError> {
        let user = self
            .user_repo
            .get_by_username(username.trim())
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, token))
    }

    /// Resolve a token to its user. Returns `None` for any bad token:
    /// malformed, forged, expired, or pointing at a deleted account.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<User>, AuthServiceError> {
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                tracing::debug!("Rejected expired token");
                return Ok(None);
            }
            Err(_) => return Ok(None),
        };

        Ok(self.user_repo.get_by_id(claims.sub).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> AuthService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        AuthService::new(
            SqlxUserRepository::shared(pool),
            TokenCodec::new("test-secret", 7),
        )
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = setup().await;

        let user = service
            .register("alice", "password123")
            .await
            .expect("Registration failed");
        assert_eq!(user.username, "alice");

        let (logged_in, token) = service
            .login("alice", "password123")
            .await
            .expect("Login failed");
        assert_eq!(logged_in.id, user.id);
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_register_empty_username_rejected() {
        let service = setup().await;

        let result = service.register("   ", "password123").await;
        assert!(matches!(result, Err(AuthServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_empty_password_rejected() {
        let service = setup().await;

        let result = service.register("alice", "").await;
        assert!(matches!(result, Err(AuthServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_rejected() {
        let service = setup().await;

        service
            .register("alice", "password123")
            .await
            .expect("First registration failed");
        let result = service.register("alice", "other-password").await;

        assert!(matches!(result, Err(AuthServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = setup().await;
        service
            .register("alice", "password123")
            .await
            .expect("Registration failed");

        let unknown_user = service.login("nobody", "password123").await;
        let wrong_password = service.login("alice", "wrong").await;

        assert!(matches!(unknown_user, Err(AuthServiceError::InvalidCredentials)));
        assert!(matches!(wrong_password, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_resolve_token_round_trip() {
        let service = setup().await;
        let (user, token) = {
            service
                .register("alice", "password123")
                .await
                .expect("Registration failed");
            service.login("alice", "password123").await.expect("Login failed")
        };

        let resolved = service
            .resolve_token(&token)
            .await
            .expect("Token resolution failed")
            .expect("Token did not resolve to a user");

        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_resolve_garbage_token_is_none() {
        let service = setup().await;

        let resolved = service
            .resolve_token("not-a-token")
            .await
            .expect("Token resolution failed");
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_resolve_token_signed_with_other_secret_is_none() {
        let service = setup().await;
        service
            .register("alice", "password123")
            .await
            .expect("Registration failed");

        let forged = TokenCodec::new("other-secret", 7)
            .issue(1)
            .expect("Failed to issue token");
        let resolved = service
            .resolve_token(&forged)
            .await
            .expect("Token resolution failed");

        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_resolve_expired_token_is_none() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = AuthService::new(
            SqlxUserRepository::shared(pool),
            TokenCodec::new("test-secret", 0),
        );

        service
            .register("alice", "password123")
            .await
            .expect("Registration failed");
        let (_, token) = service
            .login("alice", "password123")
            .await
            .expect("Login failed");

        let resolved = service
            .resolve_token(&token)
            .await
            .expect("Token resolution failed");
        assert!(resolved.is_none());
    }
}
