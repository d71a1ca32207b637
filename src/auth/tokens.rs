//! Opaque bearer tokens.
//!
//! The plaintext is 32 bytes from the OS CSPRNG, hex encoded, and is handed
//! to the client exactly once. Only its SHA-256 digest is persisted, so the
//! token table is useless to whoever reads it.

use std::sync::Arc;

use rand::RngCore;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo::TokenStore;
use crate::auth::repo_types::{NewToken, TokenRecord};
use crate::error::StoreError;

const TOKEN_BYTES: usize = 32;
const TOKEN_NAME: &str = "api-token";

/// Plaintext token plus the stored record it belongs to.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub plaintext: String,
    pub record: TokenRecord,
}

#[derive(Clone)]
pub struct TokenRegistry {
    store: Arc<dyn TokenStore>,
    ttl: Option<Duration>,
}

impl TokenRegistry {
    pub fn new(store: Arc<dyn TokenStore>, ttl_minutes: Option<i64>) -> Self {
        Self {
            store,
            ttl: ttl_minutes.map(Duration::minutes),
        }
    }

    pub async fn issue(&self, user_id: Uuid) -> Result<IssuedToken, StoreError> {
        let plaintext = generate_token();
        let expires_at = self.ttl.map(|ttl| OffsetDateTime::now_utc() + ttl);
        let record = self
            .store
            .insert(NewToken {
                user_id,
                name: TOKEN_NAME.to_string(),
                token_hash: hash_token(&plaintext),
                expires_at,
            })
            .await?;
        debug!(%user_id, token_id = record.id, "token issued");
        Ok(IssuedToken { plaintext, record })
    }

    /// Owner of a live token, `None` for unknown, revoked or expired ones.
    pub async fn validate(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        if token.is_empty() {
            return Ok(None);
        }
        let found = self
            .store
            .touch_valid(&hash_token(token), OffsetDateTime::now_utc())
            .await?;
        Ok(found.map(|t| t.user_id))
    }

    pub async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        self.store.delete(&hash_token(token)).await
    }

    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, StoreError> {
        self.store.delete_all_for_user(user_id).await
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut h = Sha256::new();
    h.update(token.as_bytes());
    hex::encode(h.finalize())
}
