use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::auth::repo_types::User;
use crate::config::NotesConfig;
use crate::error::AppError;
use crate::notes::gate::{authorize, NoteAction};
use crate::notes::repo::NoteStore;
use crate::notes::repo_types::{Note, NoteDraft, NotePage};

pub const MAX_TITLE_CHARS: usize = 200;

fn validate_draft(title: &str, body: &str) -> Result<NoteDraft, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title", "The title field is required."));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation(
            "title",
            format!("The title may not be greater than {MAX_TITLE_CHARS} characters."),
        ));
    }
    if body.trim().is_empty() {
        return Err(AppError::validation("body", "The body field is required."));
    }
    Ok(NoteDraft {
        title: title.to_string(),
        body: body.to_string(),
    })
}

/// Note CRUD scoped to the calling user.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    config: NotesConfig,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, config: NotesConfig) -> Self {
        Self { store, config }
    }

    pub fn default_per_page(&self) -> i64 {
        self.config.per_page
    }

    /// `page` is 1-based. Oversized pages are clamped to the configured max.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list(&self, user: &User, page: i64, per_page: i64) -> Result<NotePage, AppError> {
        if per_page < 1 {
            return Err(AppError::validation(
                "per_page",
                "The per page must be at least 1.",
            ));
        }
        if page < 1 {
            return Err(AppError::validation("page", "The page must be at least 1."));
        }
        let per_page = per_page.min(self.config.max_per_page);
        let offset = (page - 1).saturating_mul(per_page);

        let total = self.store.count_by_owner(user.id).await?;
        let items = if offset < total {
            self.store.list_by_owner(user.id, per_page, offset).await?
        } else {
            Vec::new()
        };
        debug!(total, returned = items.len(), "notes listed");
        Ok(NotePage {
            items,
            page,
            per_page,
            total,
        })
    }

    #[instrument(skip(self, user, body), fields(user_id = %user.id))]
    pub async fn create(&self, user: &User, title: &str, body: &str) -> Result<Note, AppError> {
        let draft = validate_draft(title, body)?;
        let note = self.store.insert(user.id, draft).await?;
        info!(note_id = note.id, "note created");
        Ok(note)
    }

    /// Unchecked lookup by id.
    pub async fn get(&self, id: i64) -> Result<Note, AppError> {
        self.store.find(id).await?.ok_or(AppError::NotFound)
    }

    async fn load_authorized(
        &self,
        user: &User,
        id: i64,
        action: NoteAction,
    ) -> Result<Note, AppError> {
        let note = self.get(id).await?;
        authorize(user, &note, action, self.config.read_policy)?;
        Ok(note)
    }

    /// Single-note read, subject to the configured read policy.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn show(&self, user: &User, id: i64) -> Result<Note, AppError> {
        self.load_authorized(user, id, NoteAction::View).await
    }

    #[instrument(skip(self, user, body), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        title: &str,
        body: &str,
    ) -> Result<Note, AppError> {
        self.load_authorized(user, id, NoteAction::Update).await?;
        let draft = validate_draft(title, body)?;
        // Ownership is re-checked by the store; a note deleted in between is NotFound.
        let note = self
            .store
            .update_owned(user.id, id, draft)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(note_id = id, "note updated");
        Ok(note)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &User, id: i64) -> Result<(), AppError> {
        self.load_authorized(user, id, NoteAction::Delete).await?;
        if !self.store.delete_owned(user.id, id).await? {
            return Err(AppError::NotFound);
        }
        info!(note_id = id, "note deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoteReadPolicy;
    use crate::memory::MemoryNoteStore;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn service(read_policy: NoteReadPolicy) -> NoteService {
        NoteService::new(
            Arc::new(MemoryNoteStore::new()),
            NotesConfig {
                read_policy,
                ..NotesConfig::default()
            },
        )
    }

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@x.com", name.to_lowercase()),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        let created = notes.create(&alice, "T", "B").await.unwrap();
        let fetched = notes.get(created.id).await.unwrap();
        assert_eq!(fetched.title, "T");
        assert_eq!(fetched.body, "B");
        assert_eq!(fetched.user_id, alice.id);
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        let long_title = "t".repeat(MAX_TITLE_CHARS + 1);
        let max_title = "t".repeat(MAX_TITLE_CHARS);

        for (title, body, field) in [
            ("", "body", "title"),
            ("   ", "body", "title"),
            (long_title.as_str(), "body", "title"),
            ("Title", "", "body"),
        ] {
            let err = notes.create(&alice, title, body).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { field: f, .. } if f == field));
        }
        assert!(notes.create(&alice, &max_title, "body").await.is_ok());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let notes = service(NoteReadPolicy::Owner);
        assert!(matches!(notes.get(42).await.unwrap_err(), AppError::NotFound));
    }

    #[tokio::test]
    async fn pagination_splits_twenty_notes() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        for i in 0..20 {
            notes.create(&alice, &format!("note {i}"), "body").await.unwrap();
        }

        let first = notes.list(&alice, 1, 15).await.unwrap();
        assert_eq!(first.items.len(), 15);
        assert_eq!(first.total, 20);
        assert_eq!(first.items[0].title, "note 19");

        let second = notes.list(&alice, 2, 15).await.unwrap();
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.total, 20);
        assert_eq!(second.items[4].title, "note 0");

        assert!(notes.list(&alice, 3, 15).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn list_rejects_non_positive_paging() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        assert!(matches!(
            notes.list(&alice, 1, 0).await.unwrap_err(),
            AppError::Validation { field: "per_page", .. }
        ));
        assert!(matches!(
            notes.list(&alice, 0, 15).await.unwrap_err(),
            AppError::Validation { field: "page", .. }
        ));
    }

    #[tokio::test]
    async fn list_clamps_page_size() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        let page = notes.list(&alice, 1, 10_000).await.unwrap();
        assert_eq!(page.per_page, NotesConfig::default().max_per_page);
    }

    #[tokio::test]
    async fn other_users_notes_are_invisible_and_untouchable() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        let bob = user("Bob");
        let note = notes.create(&alice, "Shopping", "Milk, eggs").await.unwrap();

        assert_eq!(notes.list(&bob, 1, 15).await.unwrap().total, 0);
        assert!(matches!(notes.show(&bob, note.id).await.unwrap_err(), AppError::Forbidden));
        assert!(matches!(
            notes.update(&bob, note.id, "Hacked", "x").await.unwrap_err(),
            AppError::Forbidden
        ));
        assert!(matches!(notes.delete(&bob, note.id).await.unwrap_err(), AppError::Forbidden));

        let untouched = notes.show(&alice, note.id).await.unwrap();
        assert_eq!(untouched, note);
    }

    #[tokio::test]
    async fn authenticated_read_policy_allows_foreign_show() {
        let notes = service(NoteReadPolicy::Authenticated);
        let alice = user("Alice");
        let bob = user("Bob");
        let note = notes.create(&alice, "Shopping", "Milk, eggs").await.unwrap();

        assert_eq!(notes.show(&bob, note.id).await.unwrap().id, note.id);
        assert!(matches!(
            notes.update(&bob, note.id, "Hacked", "x").await.unwrap_err(),
            AppError::Forbidden
        ));
    }

    #[tokio::test]
    async fn update_checks_existence_then_owner_then_fields() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        let bob = user("Bob");

        assert!(matches!(
            notes.update(&alice, 99, "T", "B").await.unwrap_err(),
            AppError::NotFound
        ));

        let note = notes.create(&alice, "T", "B").await.unwrap();
        assert!(matches!(
            notes.update(&bob, note.id, "", "").await.unwrap_err(),
            AppError::Forbidden
        ));
        assert!(matches!(
            notes.update(&alice, note.id, "", "B").await.unwrap_err(),
            AppError::Validation { field: "title", .. }
        ));
    }

    #[tokio::test]
    async fn update_replaces_content_keeps_identity() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        let note = notes.create(&alice, "T", "B").await.unwrap();

        let updated = notes.update(&alice, note.id, "T2", "B2").await.unwrap();
        assert_eq!(updated.id, note.id);
        assert_eq!(updated.user_id, alice.id);
        assert_eq!(updated.title, "T2");
        assert_eq!(updated.body, "B2");
        assert!(updated.updated_at >= note.updated_at);
    }

    #[tokio::test]
    async fn delete_removes_permanently() {
        let notes = service(NoteReadPolicy::Owner);
        let alice = user("Alice");
        let note = notes.create(&alice, "T", "B").await.unwrap();

        notes.delete(&alice, note.id).await.unwrap();
        assert!(matches!(notes.get(note.id).await.unwrap_err(), AppError::NotFound));
        assert!(matches!(
            notes.delete(&alice, note.id).await.unwrap_err(),
            AppError::NotFound
        ));
    }
}
