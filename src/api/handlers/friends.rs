// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::routes::{acquire, ApiResult, PageQuery};
use crate::db::DbPool;
use crate::feed::visibility::Viewer;
use crate::graph::relationships;
use crate::metrics;

/// Send a friend request to `target_id`.
pub async fn send_request(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let edge = relationships::request(&mut conn, viewer_id, target_id).await?;
    metrics::FRIEND_REQUESTS_TOTAL.inc();
    debug!(viewer_id, target_id, "friend request created");
    Ok((StatusCode::CREATED, Json(json!(edge))))
}

pub async fn accept_request(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let edge = relationships::accept(&mut conn, viewer_id, target_id).await?;
    Ok((StatusCode::OK, Json(json!(edge))))
}

pub async fn reject_request(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    relationships::reject(&mut conn, viewer_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel_request(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    relationships::cancel(&mut conn, viewer_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfriend(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    relationships::unfriend(&mut conn, viewer_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn block_user(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let edge = relationships::block(&mut conn, viewer_id, target_id).await?;
    Ok((StatusCode::OK, Json(json!({ "status": edge.status }))))
}

pub async fn unblock_user(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    relationships::unblock(&mut conn, viewer_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Relationship between the viewer and a target user.
pub async fn friendship_status(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(target_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let status = relationships::status(&mut conn, viewer.id(), target_id).await?;
    Ok((StatusCode::OK, Json(json!({ "status": status }))))
}

/// Accepted friends of the viewer.
pub async fn list_friends(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Query(page): Query<PageQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let friends =
        relationships::friends_with_profiles(&mut conn, viewer_id, page.limit(), page.offset())
            .await?;
    Ok((StatusCode::OK, Json(json!(friends))))
}

/// Pending requests where the viewer is the recipient.
pub async fn incoming_requests(
    State(pool): State<DbPool>,
    viewer: Viewer,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let requests = relationships::incoming_requests(&mut conn, viewer_id).await?;
    Ok((StatusCode::OK, Json(json!(requests))))
}
