use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;
    let (user, token) = state
        .auth
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let (user, token) = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.logout(&auth.token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully",
    }))
}

#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.logout_all(&auth.user).await?;
    Ok(Json(MessageResponse {
        message: "Logged out from all devices",
    }))
}

pub async fn get_me(auth: AuthUser) -> Json<PublicUser> {
    Json(auth.user.into())
}

#[cfg(test)]
mod me_tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn public_user_hides_password_hash() {
        let user = crate::auth::repo_types::User {
            id: uuid::Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            created_at: OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_string(&PublicUser::from(user.clone())).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("argon2"));

        let raw = serde_json::to_string(&user).unwrap();
        assert!(!raw.contains("password_hash"));
    }
}
