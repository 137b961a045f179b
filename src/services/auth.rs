//! Registration, login and token verification

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult, INVALID_CREDENTIALS},
    models::user::{LoginInput, NewUser, PublicUser, RegisterInput, UserClaims},
    repository::{StoreError, UserStore},
};

const DUPLICATE_USER: &str = "username or email already exists";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Create an account; a taken username or email is a conflict
    pub async fn register(&self, input: RegisterInput) -> AppResult<PublicUser> {
        let existing = self
            .store
            .find_by_username_or_email(&input.username, &input.email)
            .await
            .map_err(AppError::database("error registering user"))?;
        if existing.is_some() {
            return Err(AppError::Conflict(DUPLICATE_USER.to_string()));
        }

        let password_hash = hash_password(input.password).await?;

        let new_user = NewUser {
            username: input.username,
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
        };

        // The unique constraints settle concurrent registrations that both passed the check above
        let user = match self.store.insert(&new_user).await {
            Ok(user) => user,
            Err(StoreError::UniqueViolation(detail)) => {
                tracing::info!("Registration lost a uniqueness race: {}", detail);
                return Err(AppError::Conflict(DUPLICATE_USER.to_string()));
            }
            Err(e) => return Err(AppError::database("error registering user")(e)),
        };

        tracing::info!(user_id = user.id, "User registered");
        Ok(PublicUser::from(&user))
    }

    /// Check credentials and issue a token
    pub async fn login(&self, input: LoginInput) -> AppResult<(String, PublicUser)> {
        let user = self
            .store
            .find_by_username(&input.username)
            .await
            .map_err(AppError::database("Error logging in"))?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(input.password, user.password_hash.clone()).await? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = UserClaims::for_user(&user, Utc::now())
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, PublicUser::from(&user)))
    }

    /// Decode a bearer token into its claims
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }
}

/// Hash a password using Argon2 with a random salt
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Compare a password against a stored hash
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}
