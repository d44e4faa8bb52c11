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
use crate::graph::membership::{self, MemberUpdate, NewGroupRequest};
use crate::metrics;
use crate::models::enums::MemberStatus;
use crate::models::group::SubmittedAnswer;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    pub status: Option<String>,
}

pub async fn create_group(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Json(req): Json<NewGroupRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let group = membership::create_group(&mut conn, viewer_id, req).await?;
    Ok((StatusCode::CREATED, Json(json!(group))))
}

pub async fn group_detail(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(group_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let detail = membership::group_detail(&mut conn, viewer.id(), group_id).await?;
    Ok((StatusCode::OK, Json(json!(detail))))
}

pub async fn group_questions(
    State(pool): State<DbPool>,
    Path(group_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    membership::load_group(&mut conn, group_id).await?;
    let questions = membership::questions_for(&mut conn, group_id).await?;
    Ok((StatusCode::OK, Json(json!(questions))))
}

pub async fn join_group(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(group_id): Path<i32>,
    Json(req): Json<JoinRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let status = membership::join(&mut conn, viewer_id, group_id, req.answers).await?;
    metrics::GROUP_JOINS_TOTAL.inc();
    Ok((StatusCode::OK, Json(json!({ "status": status }))))
}

pub async fn leave_group(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(group_id): Path<i32>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    membership::leave(&mut conn, viewer_id, group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn group_feed(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(group_id): Path<i32>,
    Query(cursor): Query<CursorQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let posts = assembler::group_feed(
        &mut conn,
        viewer.id(),
        group_id,
        cursor.limit(),
        cursor.last_post_id,
    )
    .await?;
    Ok((StatusCode::OK, Json(json!(posts))))
}

pub async fn group_members(
    State(pool): State<DbPool>,
    Path(group_id): Path<i32>,
    Query(filter): Query<MembersQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<MemberStatus>)
        .transpose()?;
    let mut conn = acquire(&pool).await?;
    membership::load_group(&mut conn, group_id).await?;
    let rows = membership::members(&mut conn, group_id, status).await?;
    Ok((StatusCode::OK, Json(json!(rows))))
}

pub async fn update_member(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path((group_id, user_id)): Path<(i32, i32)>,
    Json(update): Json<MemberUpdate>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let row = membership::update_member(&mut conn, viewer_id, user_id, group_id, update).await?;
    Ok((StatusCode::OK, Json(json!(row))))
}

pub async fn approve_member(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path((group_id, user_id)): Path<(i32, i32)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let row = membership::approve(&mut conn, viewer_id, user_id, group_id).await?;
    Ok((StatusCode::OK, Json(json!(row))))
}

pub async fn reject_member(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path((group_id, user_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    membership::reject(&mut conn, viewer_id, user_id, group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn ban_member(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path((group_id, user_id)): Path<(i32, i32)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let row = membership::ban(&mut conn, viewer_id, user_id, group_id).await?;
    Ok((StatusCode::OK, Json(json!(row))))
}

pub async fn unban_member(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path((group_id, user_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    membership::unban(&mut conn, viewer_id, user_id, group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn invite_member(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path((group_id, user_id)): Path<(i32, i32)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let row = membership::invite(&mut conn, viewer_id, user_id, group_id).await?;
    Ok((StatusCode::OK, Json(json!(row))))
}

pub async fn pending_requests(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(group_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let rows = membership::pending_requests(&mut conn, viewer_id, group_id).await?;
    Ok((StatusCode::OK, Json(json!(rows))))
}
