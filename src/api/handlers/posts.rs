// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::routes::{acquire, ApiResult, FeedQuery};
use crate::content::posts::{self, NewPostRequest, ShareRequest};
use crate::db::DbPool;
use crate::feed::assembler;
use crate::feed::visibility::{Viewer, ViewerContext};
use crate::metrics;

/// Home feed for the viewer (or the public stream for anonymous callers).
pub async fn get_feed(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Query(query): Query<FeedQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let ctx = ViewerContext::load(&mut conn, viewer).await?;
    let feed = assembler::build_feed(&mut conn, &ctx, query.limit()).await?;
    metrics::FEED_BUILDS_TOTAL.inc();
    debug!(posts = feed.len(), "feed assembled");
    Ok((StatusCode::OK, Json(json!(feed))))
}

pub async fn create_post(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Json(req): Json<NewPostRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let (post, location) = posts::create_post(&mut conn, viewer_id, req).await?;
    metrics::POSTS_CREATED_TOTAL.inc();
    Ok((
        StatusCode::CREATED,
        Json(json!({ "post": post, "location": location })),
    ))
}

/// A directly-addressed post, gated by the visibility resolver.
pub async fn get_post(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(post_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let ctx = ViewerContext::load(&mut conn, viewer).await?;
    let summary = assembler::single_post(&mut conn, &ctx, post_id).await?;
    Ok((StatusCode::OK, Json(json!(summary))))
}

pub async fn share_post(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(post_id): Path<i32>,
    Json(req): Json<ShareRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let share = posts::share_post(&mut conn, viewer_id, post_id, req).await?;
    metrics::POSTS_CREATED_TOTAL.inc();
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "post_id": share.post_id,
            "parent_post_id": share.parent_post_id,
        })),
    ))
}
