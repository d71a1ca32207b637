use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    notes::{
        dto::{NoteMessage, NoteRequest, PageQuery, Paginated},
        repo_types::Note,
    },
    state::AppState,
};

#[derive(Debug, serde::Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

pub fn notes_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/:id",
            get(show_note)
                .put(update_note)
                .patch(update_note)
                .delete(delete_note),
        )
}

#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Paginated<Note>>, AppError> {
    let Query(q) = query?;
    let page = q.page.unwrap_or(1);
    let per_page = q.per_page.unwrap_or_else(|| state.notes.default_per_page());
    let notes = state.notes.list(&auth.user, page, per_page).await?;
    Ok(Json(notes.into()))
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.user.id))]
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<NoteMessage>), AppError> {
    let Json(body) = body?;
    let note = state
        .notes
        .create(&auth.user, &body.title, &body.body)
        .await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/notes/{}", note.id)) {
        headers.insert(LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(NoteMessage {
            message: "Created successfully",
            note,
        }),
    ))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn show_note(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Note>, AppError> {
    let Path(id) = id?;
    let note = state.notes.show(&auth.user, id).await?;
    Ok(Json(note))
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.user.id))]
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<Json<NoteMessage>, AppError> {
    let (Path(id), Json(body)) = (id?, body?);
    let note = state
        .notes
        .update(&auth.user, id, &body.title, &body.body)
        .await?;
    Ok(Json(NoteMessage {
        message: "Updated successfully",
        note,
    }))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, AppError> {
    let Path(id) = id?;
    state.notes.delete(&auth.user, id).await?;
    Ok(Json(DeletedResponse {
        message: "Deleted successfully",
    }))
}
