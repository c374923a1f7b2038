// src/handlers/comments.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{CreateCommentRequest, CreateReplyRequest},
    service::CommentService,
    utils::jwt::Session,
};

/// List root comments (with their reply trees) for an article.
pub async fn list_comments(
    State(service): State<Arc<CommentService>>,
    Path(article_title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let comments = service.list_comments(&article_title).await?;
    Ok(Json(comments))
}

/// Post a top-level comment on an article.
pub async fn create_comment(
    State(service): State<Arc<CommentService>>,
    Session(identity): Session,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let comment = service
        .post_comment(&payload.article_title, &payload.text, identity.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Reply to any comment, however deeply nested.
pub async fn create_reply(
    State(service): State<Arc<CommentService>>,
    Session(identity): Session,
    Path(target_id): Path<String>,
    Json(payload): Json<CreateReplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let reply = service
        .post_reply(&target_id, &payload.text, identity.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

/// Remove a comment and its replies.
/// Requires: moderator session.
pub async fn delete_comment(
    State(service): State<Arc<CommentService>>,
    Session(identity): Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    service.redact_comment(&id, identity.as_ref()).await?;

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}
