// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::accounts::{self, NewAccount};
use crate::api::routes::{acquire, ApiResult, PageQuery};
use crate::db::DbPool;
use crate::feed::assembler;
use crate::feed::visibility::Viewer;
use crate::graph::relationships;
use crate::models::user::UpdateProfile;

/// Register a new account; the profile insert is best-effort.
pub async fn register(
    State(pool): State<DbPool>,
    Json(account): Json<NewAccount>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let user = accounts::register(&mut conn, account).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user_id": user.user_id, "email": user.email })),
    ))
}

/// Profile of a user, with private fields only for the owner.
pub async fn get_profile(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(user_id): Path<i32>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let view = accounts::profile_view(&mut conn, viewer.id(), user_id).await?;
    Ok((StatusCode::OK, Json(json!(view))))
}

pub async fn update_profile(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Json(update): Json<UpdateProfile>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let profile = accounts::update_profile(&mut conn, viewer_id, update).await?;
    Ok((StatusCode::OK, Json(json!(profile))))
}

/// Posts on a user's timeline, filtered by the viewer's standing.
pub async fn user_posts(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Path(user_id): Path<i32>,
    Query(page): Query<PageQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let timeline = assembler::user_timeline(
        &mut conn,
        viewer.id(),
        user_id,
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok((StatusCode::OK, Json(json!(timeline))))
}

/// Accepted friends of an arbitrary user.
pub async fn user_friends(
    State(pool): State<DbPool>,
    Path(user_id): Path<i32>,
    Query(page): Query<PageQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut conn = acquire(&pool).await?;
    let friends =
        relationships::friends_with_profiles(&mut conn, user_id, page.limit(), page.offset())
            .await?;
    Ok((StatusCode::OK, Json(json!(friends))))
}

/// People the viewer may know: users with no edge to them yet.
pub async fn suggestions(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Query(page): Query<PageQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let rows = relationships::suggestions(&mut conn, viewer_id, page.limit()).await?;
    Ok((StatusCode::OK, Json(json!(rows))))
}
