// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::routes::{acquire, ApiResult, CursorQuery};
use crate::db::DbPool;
use crate::feed::assembler;
use crate::feed::visibility::Viewer;
use crate::graph::pages::{self, NewPageRequest};

#[derive(Debug, Deserialize)]
pub struct RoleGrant {
    pub user_id: i32,
    pub role: String,
}

pub async fn create_page(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Json(req): Json<NewPageRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let page = pages::create_page(&mut conn, viewer_id, req).await?;
    Ok((StatusCode::CREATED, Json(json!(page))))
}

pub async fn page_detail(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(page_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let detail = pages::page_detail(&mut conn, viewer.id(), page_id).await?;
    Ok((StatusCode::OK, Json(json!(detail))))
}

pub async fn follow_page(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(page_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    pages::follow(&mut conn, viewer_id, page_id).await?;
    Ok((StatusCode::OK, Json(json!({ "status": "FOLLOWED" }))))
}

pub async fn unfollow_page(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(page_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    pages::unfollow(&mut conn, viewer_id, page_id).await?;
    Ok((StatusCode::OK, Json(json!({ "status": "UNFOLLOWED" }))))
}

/// Posts on a page timeline.
pub async fn page_posts(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(page_id): Path<i32>,
    Query(cursor): Query<CursorQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let posts = assembler::page_posts(
        &mut conn,
        viewer.id(),
        page_id,
        cursor.limit(),
        cursor.last_post_id,
    )
    .await?;
    Ok((StatusCode::OK, Json(json!(posts))))
}

pub async fn assign_role(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(page_id): Path<i32>,
    Json(grant): Json<RoleGrant>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let role =
        pages::assign_role(&mut conn, viewer_id, grant.user_id, page_id, grant.role).await?;
    Ok((StatusCode::CREATED, Json(json!(role))))
}
