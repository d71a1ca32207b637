use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::auth::password::{self, MIN_PASSWORD_CHARS};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::{NewUser, User};
use crate::auth::tokens::TokenRegistry;
use crate::error::AppError;

pub const MAX_NAME_CHARS: usize = 50;
pub const MAX_EMAIL_CHARS: usize = 255;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login, and bearer-token sessions.
///
/// Every call takes the caller's token or user explicitly; the service holds
/// no per-client state.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenRegistry,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenRegistry) -> Self {
        Self { users, tokens }
    }

    /// Creates the account and returns it with a fresh plaintext token.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "The name field is required."));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::validation(
                "name",
                format!("The name may not be greater than {MAX_NAME_CHARS} characters."),
            ));
        }

        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::validation(
                "email",
                "The email must be a valid email address.",
            ));
        }
        if email.chars().count() > MAX_EMAIL_CHARS {
            return Err(AppError::validation(
                "email",
                format!("The email may not be greater than {MAX_EMAIL_CHARS} characters."),
            ));
        }

        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::validation(
                "password",
                format!("The password must be at least {MIN_PASSWORD_CHARS} characters."),
            ));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(
                "The email has already been taken.".into(),
            ));
        }

        let password_hash = password::hash_password(password)?;
        // The store re-checks uniqueness, so a racing registration still ends in Conflict.
        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email,
                password_hash,
            })
            .await?;
        let issued = self.tokens.issue(user.id).await?;

        info!(user_id = %user.id, "user registered");
        Ok((user, issued.plaintext))
    }

    /// Checks credentials and issues an additional token; earlier tokens stay valid.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AppError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::validation("email", "The email field is required."));
        }
        if password.is_empty() {
            return Err(AppError::validation(
                "password",
                "The password field is required.",
            ));
        }

        let user = match self.users.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                password::burn_verification(password);
                warn!("login unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !password::verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let issued = self.tokens.issue(user.id).await?;
        info!(user_id = %user.id, token_id = issued.record.id, "user logged in");
        Ok((user, issued.plaintext))
    }

    #[instrument(skip_all)]
    pub async fn resolve_current_user(&self, token: Option<&str>) -> Result<User, AppError> {
        let token = token.ok_or(AppError::Unauthenticated)?;
        let user_id = self
            .tokens
            .validate(token)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthenticated)
    }

    /// Revokes exactly the presented token.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if !self.tokens.revoke(token).await? {
            return Err(AppError::Unauthenticated);
        }
        info!("token revoked");
        Ok(())
    }

    /// Revokes every token of `user`; returns how many were dropped.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn logout_all(&self, user: &User) -> Result<u64, AppError> {
        let revoked = self.tokens.revoke_all(user.id).await?;
        info!(revoked, "all tokens revoked");
        Ok(revoked)
    }
}
