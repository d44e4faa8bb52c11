// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Shared plumbing for the HTTP handlers: viewer extraction, pagination
//! parameters and the failure-kind to status-code mapping.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::config::Config;
use crate::db::{DbConnection, DbPool};
use crate::error::StoreError;
use crate::feed::visibility::Viewer;

/// The identity provider upstream resolves authentication and forwards the
/// viewer id in this header; no header means anonymous.
pub const VIEWER_HEADER: &str = "x-user-id";

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(VIEWER_HEADER) {
            None => Ok(Viewer::Anonymous),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|s| s.parse::<i32>().ok())
                .map(Viewer::User)
                .ok_or_else(|| {
                    ApiError(StoreError::validation(format!(
                        "invalid {VIEWER_HEADER} header"
                    )))
                }),
        }
    }
}

/// Core failure carried out of a handler.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Database(_) | StoreError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Check out a pooled connection for the duration of one request.
pub async fn acquire(pool: &DbPool) -> ApiResult<DbConnection> {
    pool.get()
        .await
        .map_err(|e| ApiError(StoreError::Pool(e.to_string())))
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

impl FeedQuery {
    pub fn limit(&self) -> i64 {
        let feed = &Config::get().feed;
        self.limit.unwrap_or(feed.default_limit).clamp(1, feed.max_limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        let feed = &Config::get().feed;
        self.limit.unwrap_or(feed.default_limit).clamp(1, feed.max_limit)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Keyset pagination for group and page streams.
#[derive(Debug, Deserialize)]
pub struct CursorQuery {
    pub limit: Option<i64>,
    pub last_post_id: Option<i32>,
}

impl CursorQuery {
    pub fn limit(&self) -> i64 {
        let feed = &Config::get().feed;
        self.limit.unwrap_or(feed.default_limit).clamp(1, feed.max_limit)
    }
}
