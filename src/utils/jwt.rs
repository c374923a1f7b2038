// src/utils/jwt.rs

use std::{
    convert::Infallible,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Method, Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::author::Identity};

/// Session token claims, as issued by the identity provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a session token for `identity`.
pub fn sign_session(
    identity: &Identity,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        email: identity.email.clone(),
        name: identity.name.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a session token.
pub fn verify_session(token: &str, secret: &str) -> Result<Identity, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid session token".to_string()))?;

    Ok(Identity {
        email: token_data.claims.email,
        name: token_data.claims.name,
    })
}

/// Axum Middleware: optional session.
///
/// No `Authorization` header means a guest request. A valid
/// `Bearer <token>` puts the `Identity` into the request extensions.
/// A bad token is rejected with 401 on writes; reads carry on as a guest.
pub async fn identity_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());

    if let Some(header) = auth_header {
        let identity = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::AuthError("Expected a Bearer token".to_string()))
            .and_then(|token| verify_session(token, &config.jwt_secret));

        match identity {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
            }
            Err(_) if req.method() == Method::GET => {
                tracing::warn!(path = %req.uri().path(), "Ignoring invalid session token on read");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(next.run(req).await)
}

/// The caller's identity, if the request carried a valid session.
#[derive(Debug, Clone)]
pub struct Session(pub Option<Identity>);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Session(parts.extensions.get::<Identity>().cloned()))
    }
}
