//! Ownership checks for single-note operations.
//!
//! Invoked explicitly by every show/update/delete path in [`NoteService`],
//! never inferred from where a request came from.
//!
//! [`NoteService`]: crate::notes::services::NoteService

use tracing::warn;

use crate::auth::repo_types::User;
use crate::config::NoteReadPolicy;
use crate::error::AppError;
use crate::notes::repo_types::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    View,
    Update,
    Delete,
}

pub fn authorize(
    user: &User,
    note: &Note,
    action: NoteAction,
    read_policy: NoteReadPolicy,
) -> Result<(), AppError> {
    if note.user_id == user.id {
        return Ok(());
    }
    if action == NoteAction::View && read_policy == NoteReadPolicy::Authenticated {
        return Ok(());
    }
    warn!(user_id = %user.id, note_id = note.id, ?action, "forbidden note access");
    Err(AppError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "u".into(),
            email: "u@x.com".into(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn note_of(owner: &User) -> Note {
        let now = OffsetDateTime::now_utc();
        Note {
            id: 1,
            user_id: owner.id,
            title: "t".into(),
            body: "b".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_may_do_everything() {
        let owner = user();
        let note = note_of(&owner);
        for action in [NoteAction::View, NoteAction::Update, NoteAction::Delete] {
            assert!(authorize(&owner, &note, action, NoteReadPolicy::Owner).is_ok());
        }
    }

    #[test]
    fn stranger_is_forbidden_under_owner_policy() {
        let note = note_of(&user());
        let stranger = user();
        for action in [NoteAction::View, NoteAction::Update, NoteAction::Delete] {
            let err = authorize(&stranger, &note, action, NoteReadPolicy::Owner).unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
        }
    }

    #[test]
    fn authenticated_policy_opens_reads_only() {
        let note = note_of(&user());
        let stranger = user();
        let policy = NoteReadPolicy::Authenticated;
        assert!(authorize(&stranger, &note, NoteAction::View, policy).is_ok());
        assert!(authorize(&stranger, &note, NoteAction::Update, policy).is_err());
        assert!(authorize(&stranger, &note, NoteAction::Delete, policy).is_err());
    }
}
