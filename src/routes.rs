// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{articles, comments, session},
    state::AppState,
    utils::jwt::identity_middleware,
};

/// Assembles the main application router.
///
/// * Comment routes run behind the optional-session middleware.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (comment service, config, HTTP client).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let comment_routes = Router::new()
        .route("/", post(comments::create_comment))
        .route(
            "/{id}",
            get(comments::list_comments).delete(comments::delete_comment),
        )
        .route("/{id}/reply", post(comments::create_reply));

    let session_routes = Router::new()
        .route("/api/session", get(session::get_session))
        .nest("/api/comments", comment_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    let article_routes = Router::new().route(
        "/{locations}/{date}",
        get(articles::find_article),
    );

    Router::new()
        .merge(session_routes)
        .nest("/api/findArticle", article_routes)
        .route("/health", get(session::health))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
