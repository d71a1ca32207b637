//! In-memory storage backends.
//!
//! Same semantics as the Postgres stores, nothing persisted. Used when no
//! `DATABASE_URL` is configured and by the test suite. Each store keeps its
//! whole table behind one lock, so a revoke that has returned is visible to
//! every validation that starts afterwards.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::{TokenStore, UserStore};
use crate::auth::repo_types::{NewToken, NewUser, TokenRecord, User};
use crate::error::StoreError;
use crate::notes::repo::NoteStore;
use crate::notes::repo_types::{Note, NoteDraft};

#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<UsersInner>,
}

#[derive(Default)]
struct UsersInner {
    by_id: HashMap<Uuid, User>,
    /// email -> user id
    by_email: HashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&new.email) {
            return Err(StoreError::Duplicate("email"));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.by_email.insert(user.email.clone(), user.id);
        inner.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<TokensInner>,
}

#[derive(Default)]
struct TokensInner {
    next_id: i64,
    /// token digest -> record
    by_hash: HashMap<String, TokenRecord>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn get(&self, token_hash: &str) -> Option<TokenRecord> {
        self.inner.read().await.by_hash.get(token_hash).cloned()
    }

    #[cfg(test)]
    pub async fn set_expiry(&self, token_hash: &str, expires_at: OffsetDateTime) {
        if let Some(rec) = self.inner.write().await.by_hash.get_mut(token_hash) {
            rec.expires_at = Some(expires_at);
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, new: NewToken) -> Result<TokenRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_hash.contains_key(&new.token_hash) {
            return Err(StoreError::Duplicate("token"));
        }
        inner.next_id += 1;
        let record = TokenRecord {
            id: inner.next_id,
            user_id: new.user_id,
            name: new.name,
            token_hash: new.token_hash,
            created_at: OffsetDateTime::now_utc(),
            last_used_at: None,
            expires_at: new.expires_at,
        };
        inner.by_hash.insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn touch_valid(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.by_hash.get_mut(token_hash) {
            Some(rec) if rec.is_live(now) => {
                rec.last_used_at = Some(now);
                Ok(Some(rec.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.by_hash.remove(token_hash).is_some())
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.by_hash.len();
        inner.by_hash.retain(|_, rec| rec.user_id != user_id);
        Ok((before - inner.by_hash.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryNoteStore {
    inner: RwLock<NotesInner>,
}

#[derive(Default)]
struct NotesInner {
    next_id: i64,
    notes: BTreeMap<i64, Note>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, owner: Uuid, draft: NoteDraft) -> Result<Note, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let note = Note {
            id: inner.next_id,
            user_id: owner,
            title: draft.title,
            body: draft.body,
            created_at: now,
            updated_at: now,
        };
        inner.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn find(&self, id: i64) -> Result<Option<Note>, StoreError> {
        Ok(self.inner.read().await.notes.get(&id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Note>, StoreError> {
        let inner = self.inner.read().await;
        let mut owned: Vec<&Note> = inner.notes.values().filter(|n| n.user_id == owner).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_by_owner(&self, owner: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.notes.values().filter(|n| n.user_id == owner).count() as i64)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: i64,
        draft: NoteDraft,
    ) -> Result<Option<Note>, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.notes.get_mut(&id) {
            Some(note) if note.user_id == owner => {
                note.title = draft.title;
                note.body = draft.body;
                note.updated_at = OffsetDateTime::now_utc();
                Ok(Some(note.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_owned(&self, owner: Uuid, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let owned = inner.notes.get(&id).is_some_and(|n| n.user_id == owner);
        if owned {
            inner.notes.remove(&id);
        }
        Ok(owned)
    }
}
