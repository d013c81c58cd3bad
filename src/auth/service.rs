// Authentication service - business logic layer

use chrono::Duration;
use mockable::Clock;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{
    error::AuthError,
    models::{LoginResponse, NewUser, PasswordReset, RegisterRequest, User, UserSummary},
    password::PasswordService,
    repository::{hash_reset_token, ResetTokenRepository, UserRepository},
    token::TokenService,
};
use crate::object_id::ObjectId;

/// Length of the raw reset token handed to the user
const RESET_TOKEN_LENGTH: usize = 43;

/// Authentication service coordinating all auth operations
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    resets: Arc<dyn ResetTokenRepository>,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
    reset_token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        resets: Arc<dyn ResetTokenRepository>,
        tokens: TokenService,
        clock: Arc<dyn Clock>,
        reset_token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            resets,
            tokens,
            clock,
            reset_token_ttl,
        }
    }

    /// Register a new active user and return its id
    pub async fn register(&self, request: RegisterRequest) -> Result<ObjectId, AuthError> {
        PasswordService::validate_password_strength(&request.password)?;
        let password_hash = PasswordService::hash_password(&request.password)?;

        let id = self
            .users
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role: request.role_id,
                is_active: true,
                created_at: self.clock.utc(),
                created_by: None,
            })
            .await?;

        info!("Registered user {} with role {}", id, request.role_id);
        Ok(id)
    }

    /// Check credentials and issue an access token
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                debug!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !PasswordService::verify_password(password, &user.password_hash)? {
            debug!("Login attempt with wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(&user.id, &user.email)?;
        info!("User {} logged in", user.id);

        Ok(LoginResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: UserSummary::from(&user),
        })
    }

    /// Resolve a bearer token to an active user
    pub async fn resolve_bearer(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        let id = ObjectId::parse(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = self.users.find_by_id(&id).await?.ok_or(AuthError::UnknownSubject)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }

        Ok(user)
    }

    /// Create a reset token if the email belongs to a user
    ///
    /// Returns the raw token for out-of-band delivery; `None` when the email
    /// is unknown. Callers must answer both cases identically.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let expires_at = self
            .clock
            .utc()
            .checked_add_signed(self.reset_token_ttl)
            .ok_or_else(|| AuthError::TokenGenerationError("reset token expiry out of range".to_string()))?;

        let token = generate_reset_token();
        self.resets
            .store(PasswordReset {
                email: user.email,
                token_hash: hash_reset_token(&token),
                expires_at,
                used: false,
            })
            .await?;

        info!("Issued password reset token for user {}", user.id);
        Ok(Some(token))
    }

    /// Redeem a reset token and set a new password
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        PasswordService::validate_password_strength(new_password)?;
        let password_hash = PasswordService::hash_password(new_password)?;
        let now = self.clock.utc();

        let email = self
            .resets
            .consume(&hash_reset_token(token), now)
            .await?
            .ok_or_else(|| {
                warn!("Rejected invalid or expired reset token");
                AuthError::InvalidOrExpiredResetToken
            })?;

        if !self.users.set_password_by_email(&email, &password_hash, now).await? {
            warn!("Reset token redeemed for an account that no longer exists");
            return Err(AuthError::InvalidOrExpiredResetToken);
        }

        info!("Password reset completed");
        Ok(())
    }

    /// Replace the caller's password after verifying the old one
    pub async fn change_password(&self, user: &User, old_password: &str, new_password: &str) -> Result<(), AuthError> {
        if !PasswordService::verify_password(old_password, &user.password_hash)? {
            return Err(AuthError::IncorrectPassword);
        }
        PasswordService::validate_password_strength(new_password)?;
        let password_hash = PasswordService::hash_password(new_password)?;

        if !self.users.set_password(&user.id, &password_hash, self.clock.utc()).await? {
            return Err(AuthError::UserNotFound);
        }

        info!("User {} changed password", user.id);
        Ok(())
    }
}

fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::test_support::{InMemoryResetTokenRepository, InMemoryUserRepository, ManualClock};
    use chrono::Utc;
    use jsonwebtoken::Algorithm;

    struct Fixture {
        service: AuthService,
        users: Arc<InMemoryUserRepository>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let users = Arc::new(InMemoryUserRepository::default());
        let resets = Arc::new(InMemoryResetTokenRepository::default());
        let tokens = TokenService::new("unit-test-secret", Algorithm::HS256, Duration::minutes(60), clock.clone());
        let service = AuthService::new(users.clone(), resets, tokens, clock.clone(), Duration::minutes(60));
        Fixture { service, users, clock }
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Asha".into(),
            email: email.into(),
            password: "sprayer-pass".into(),
            role_id: Role::Operator,
        }
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let fx = fixture();
        let id = fx.service.register(register_request("asha@example.com")).await.unwrap();

        let login = fx.service.authenticate("ASHA@example.com", "sprayer-pass").await.unwrap();
        assert_eq!(login.token_type, "bearer");
        assert_eq!(login.user.id, id);
        assert_eq!(login.user.role, "operator");

        let user = fx.service.resolve_bearer(&login.access_token).await.unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected_case_insensitively() {
        let fx = fixture();
        fx.service.register(register_request("asha@example.com")).await.unwrap();
        let err = fx.service.register(register_request("Asha@Example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let fx = fixture();
        fx.service.register(register_request("asha@example.com")).await.unwrap();

        let unknown = fx.service.authenticate("nobody@example.com", "sprayer-pass").await.unwrap_err();
        let wrong = fx.service.authenticate("asha@example.com", "bad-password").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status_code(), wrong.status_code());
    }

    #[tokio::test]
    async fn test_resolve_bearer_rejects_inactive_user() {
        let fx = fixture();
        let id = fx.service.register(register_request("asha@example.com")).await.unwrap();
        let login = fx.service.authenticate("asha@example.com", "sprayer-pass").await.unwrap();

        fx.users.set_active(&id, false);
        let err = fx.service.resolve_bearer(&login.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InactiveUser));
    }

    #[tokio::test]
    async fn test_resolve_bearer_rejects_deleted_subject() {
        let fx = fixture();
        let id = fx.service.register(register_request("asha@example.com")).await.unwrap();
        let login = fx.service.authenticate("asha@example.com", "sprayer-pass").await.unwrap();

        fx.users.delete(&id).await.unwrap();
        let err = fx.service.resolve_bearer(&login.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownSubject));
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use() {
        let fx = fixture();
        fx.service.register(register_request("asha@example.com")).await.unwrap();

        let token = fx.service.request_password_reset("asha@example.com").await.unwrap().unwrap();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);

        fx.service.reset_password(&token, "new-password-1").await.unwrap();
        let err = fx.service.reset_password(&token, "new-password-2").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredResetToken));

        assert!(fx.service.authenticate("asha@example.com", "new-password-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_token_expires() {
        let fx = fixture();
        fx.service.register(register_request("asha@example.com")).await.unwrap();
        let token = fx.service.request_password_reset("asha@example.com").await.unwrap().unwrap();

        fx.clock.advance(Duration::minutes(61));
        let err = fx.service.reset_password(&token, "new-password-1").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredResetToken));
    }

    #[tokio::test]
    async fn test_reset_expiry_overflow_is_an_error() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let users = Arc::new(InMemoryUserRepository::default());
        let resets = Arc::new(InMemoryResetTokenRepository::default());
        let tokens = TokenService::new("unit-test-secret", Algorithm::HS256, Duration::minutes(60), clock.clone());
        let service = AuthService::new(users, resets.clone(), tokens, clock, Duration::days(365 * 1_000_000));
        service.register(register_request("asha@example.com")).await.unwrap();

        let err = service.request_password_reset("asha@example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenGenerationError(_)));
        assert_eq!(resets.len(), 0);
    }

    #[tokio::test]
    async fn test_reset_request_for_unknown_email_issues_nothing() {
        let fx = fixture();
        assert!(fx.service.request_password_reset("ghost@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_password_requires_old_password() {
        let fx = fixture();
        let id = fx.service.register(register_request("asha@example.com")).await.unwrap();
        let user = fx.users.find_by_id(&id).await.unwrap().unwrap();

        let err = fx.service.change_password(&user, "not-it", "another-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword));

        fx.service.change_password(&user, "sprayer-pass", "another-pass").await.unwrap();
        assert!(fx.service.authenticate("asha@example.com", "another-pass").await.is_ok());
    }

    #[test]
    fn test_reset_tokens_are_random_alphanumeric() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
