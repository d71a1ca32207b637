use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewToken, NewUser, TokenRecord, User};
use crate::error::StoreError;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; `StoreError::Duplicate("email")` when the email is taken.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, new: NewToken) -> Result<TokenRecord, StoreError>;
    /// Returns the live token with this digest and stamps `last_used_at`, in one step.
    async fn touch_valid(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<TokenRecord>, StoreError>;
    async fn delete(&self, token_hash: &str) -> Result<bool, StoreError>;
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate("email"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

#[derive(Clone)]
pub struct PgTokenStore {
    db: PgPool,
}

impl PgTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, new: NewToken) -> Result<TokenRecord, StoreError> {
        let row = sqlx::query_as::<_, TokenRecord>(
            r#"
            INSERT INTO personal_access_tokens (user_id, name, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, token_hash, created_at, last_used_at, expires_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.token_hash)
        .bind(new.expires_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn touch_valid(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, TokenRecord>(
            r#"
            UPDATE personal_access_tokens
               SET last_used_at = $2
             WHERE token_hash = $1
               AND (expires_at IS NULL OR expires_at > $2)
            RETURNING id, user_id, name, token_hash, created_at, last_used_at, expires_at
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, StoreError> {
        let res = sqlx::query(r#"DELETE FROM personal_access_tokens WHERE token_hash = $1"#)
            .bind(token_hash)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let res = sqlx::query(r#"DELETE FROM personal_access_tokens WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
