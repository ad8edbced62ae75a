//! Account and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Caller, RegisterUser, UpdateProfile, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account. Open to anyone; new accounts are never staff.
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;

        if self.repository.users.email_exists(&request.email, None).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                request.email
            )));
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(&request.email, &password_hash)
            .await?;

        tracing::info!("User {} registered", user.id);
        Ok(user)
    }

    /// Authenticate by email and password, returning a bearer token.
    ///
    /// Unknown email and wrong password produce the same message.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            exp,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user))
    }

    /// Get the caller's own profile
    pub async fn get_me(&self, caller: Caller) -> AppResult<User> {
        self.repository.users.get_by_id(caller.user_id).await
    }

    /// Update the caller's own profile; a new password is re-hashed
    pub async fn update_me(&self, caller: Caller, update: UpdateProfile) -> AppResult<User> {
        update.validate()?;

        if let Some(ref email) = update.email {
            if self
                .repository
                .users
                .email_exists(email, Some(caller.user_id))
                .await?
            {
                return Err(AppError::Conflict(format!(
                    "Email {} is already registered",
                    email
                )));
            }
        }

        let password_hash = update
            .password
            .as_deref()
            .map(|p| self.hash_password(p))
            .transpose()?;

        self.repository
            .users
            .update_profile(
                caller.user_id,
                update.email.as_deref(),
                password_hash.as_deref(),
            )
            .await
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
