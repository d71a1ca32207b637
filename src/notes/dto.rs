use serde::{Deserialize, Serialize};

use crate::notes::repo_types::{Note, NotePage};

/// Body of `POST /notes` and `PUT|PATCH /notes/:id`.
#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "note")]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Paginator envelope the SPA already understands.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub data: Vec<T>,
}

impl From<NotePage> for Paginated<Note> {
    fn from(p: NotePage) -> Self {
        let last_page = ((p.total + p.per_page - 1) / p.per_page).max(1);
        let (from, to) = if p.items.is_empty() {
            (None, None)
        } else {
            let offset = (p.page - 1).saturating_mul(p.per_page);
            (
                Some(offset.saturating_add(1)),
                Some(offset.saturating_add(p.items.len() as i64)),
            )
        };
        Self {
            current_page: p.page,
            per_page: p.per_page,
            total: p.total,
            last_page,
            from,
            to,
            data: p.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteMessage {
    pub message: &'static str,
    pub note: Note,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginator_bounds() {
        let empty = Paginated::from(NotePage {
            items: vec![],
            page: 1,
            per_page: 15,
            total: 0,
        });
        assert_eq!(empty.last_page, 1);
        assert_eq!((empty.from, empty.to), (None, None));

        let past_end = Paginated::from(NotePage {
            items: vec![],
            page: 4,
            per_page: 15,
            total: 20,
        });
        assert_eq!(past_end.last_page, 2);
        assert!(past_end.data.is_empty());

        let far = Paginated::from(NotePage {
            items: vec![],
            page: i64::MAX,
            per_page: 100,
            total: 3,
        });
        assert_eq!(far.current_page, i64::MAX);
        assert_eq!((far.from, far.to), (None, None));
    }

    #[test]
    fn accepts_note_alias_for_body() {
        let req: NoteRequest =
            serde_json::from_str(r#"{"title":"Shopping","note":"Milk, eggs"}"#).unwrap();
        assert_eq!(req.body, "Milk, eggs");
        let req: NoteRequest = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert!(req.body.is_empty());
    }
}
