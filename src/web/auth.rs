use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Config, Permission};
use crate::ephemeris::AyanamsaSource;
use crate::reading::ReadingGenerator;
use crate::render::ChartRenderer;

use super::api::error::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ephemeris: Arc<dyn AyanamsaSource>,
    pub renderer: Arc<ChartRenderer>,
    /// `None` when no language model key is configured.
    pub reading: Option<ReadingGenerator>,
}

/// The API key holder behind a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub name: String,
    permissions: HashSet<Permission>,
}

impl Caller {
    fn open_access() -> Self {
        Caller {
            name: "anonymous".to_string(),
            permissions: Permission::ALL.into_iter().collect(),
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), Forbidden> {
        if self.permissions.contains(&permission) {
            return Ok(());
        }
        log::info!("Key '{}' refused: may not {}", self.name, permission.action());
        Err(Forbidden {
            caller: self.name.clone(),
            permission,
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("an API key is required as `Authorization: Bearer <key>`")]
    MissingKey,
    #[error("Authorization header is not `Bearer <key>`")]
    Malformed,
    #[error("unknown API key")]
    UnknownKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::with_message("unauthorized", &self.to_string());
        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

/// A known key without the permission an endpoint needs.
#[derive(Debug)]
pub struct Forbidden {
    pub caller: String,
    pub permission: Permission,
}

impl IntoResponse for Forbidden {
    fn into_response(self) -> Response {
        let message = format!("key '{}' may not {}", self.caller, self.permission.action());
        (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::with_message("forbidden", &message)),
        )
            .into_response()
    }
}

/// Extracts the key from `Authorization: Bearer <key>`. The scheme is
/// matched case-insensitively.
fn bearer_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingKey)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    match value.trim().split_once(' ') {
        Some((scheme, key)) if scheme.eq_ignore_ascii_case("bearer") && !key.trim().is_empty() => {
            Ok(key.trim())
        }
        _ => Err(AuthError::Malformed),
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.api_keys.is_empty() {
            return Ok(Caller::open_access());
        }

        let key = bearer_key(&parts.headers)?;
        let api_key = state
            .config
            .find_api_key(key)
            .ok_or(AuthError::UnknownKey)?;

        Ok(Caller {
            name: api_key.name.clone(),
            permissions: api_key.permissions.clone(),
        })
    }
}
