use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::notes::repo_types::{Note, NoteDraft};

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, owner: Uuid, draft: NoteDraft) -> Result<Note, StoreError>;
    async fn find(&self, id: i64) -> Result<Option<Note>, StoreError>;
    /// Newest first; ties broken by id, descending.
    async fn list_by_owner(
        &self,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Note>, StoreError>;
    async fn count_by_owner(&self, owner: Uuid) -> Result<i64, StoreError>;
    /// Rewrites title/body only if `id` exists and still belongs to `owner`.
    async fn update_owned(
        &self,
        owner: Uuid,
        id: i64,
        draft: NoteDraft,
    ) -> Result<Option<Note>, StoreError>;
    /// Deletes only if `id` exists and still belongs to `owner`.
    async fn delete_owned(&self, owner: Uuid, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgNoteStore {
    db: PgPool,
}

impl PgNoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn insert(&self, owner: Uuid, draft: NoteDraft) -> Result<Note, StoreError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (user_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, body, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.body)
        .fetch_one(&self.db)
        .await?;
        Ok(note)
    }

    async fn find(&self, id: i64) -> Result<Option<Note>, StoreError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, user_id, title, body, created_at, updated_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(note)
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Note>, StoreError> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, user_id, title, body, created_at, updated_at
            FROM notes
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count_by_owner(&self, owner: Uuid) -> Result<i64, StoreError> {
        let (total,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM notes WHERE user_id = $1"#)
            .bind(owner)
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: i64,
        draft: NoteDraft,
    ) -> Result<Option<Note>, StoreError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
               SET title = $3, body = $4, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, body, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.body)
        .fetch_optional(&self.db)
        .await?;
        Ok(note)
    }

    async fn delete_owned(&self, owner: Uuid, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query(r#"DELETE FROM notes WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
