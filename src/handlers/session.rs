use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    models::author::{Author, SessionResponse},
    service::CommentService,
    utils::jwt::Session,
};

/// Who the caller will be posting as.
pub async fn get_session(
    State(service): State<Arc<CommentService>>,
    Session(identity): Session,
) -> impl IntoResponse {
    let author = Author::from_identity(identity.as_ref());
    let moderator = identity
        .as_ref()
        .is_some_and(|i| i.is_moderator(service.moderator_name()));

    Json(SessionResponse {
        author_email: author.email,
        author_display_name: author.display_name,
        moderator,
    })
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
