// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::routes::{acquire, ApiResult};
use crate::content::comments::{self, NewCommentRequest};
use crate::content::reactions::{self, ReactionOutcome};
use crate::db::DbPool;
use crate::feed::visibility::Viewer;
use crate::metrics;
use crate::models::enums::{CommentableType, ReactableType, ReactionType};

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub reactable_id: i32,
    pub reactable_type: String,
    pub reaction_type: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub commentable_id: i32,
    pub commentable_type: String,
}

/// Toggle a reaction: create, remove on repeat, overwrite on a new type.
pub async fn react(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Json(req): Json<ReactionRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let target: ReactableType = req.reactable_type.parse()?;
    let kind: ReactionType = req.reaction_type.parse()?;

    let mut conn = acquire(&pool).await?;
    let outcome = reactions::react(&mut conn, viewer_id, req.reactable_id, target, kind).await?;
    metrics::REACTIONS_TOGGLED_TOTAL.inc();

    Ok(match outcome {
        ReactionOutcome::Added(reaction) => (
            StatusCode::CREATED,
            Json(json!({ "outcome": "ADDED", "reaction": reaction })),
        ),
        ReactionOutcome::Updated(reaction) => (
            StatusCode::OK,
            Json(json!({ "outcome": "UPDATED", "reaction": reaction })),
        ),
        ReactionOutcome::Removed => (StatusCode::OK, Json(json!({ "outcome": "REMOVED" }))),
    })
}

pub async fn create_comment(
    State(pool): State<DbPool>,
    viewer: Viewer,
    Json(req): Json<NewCommentRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let viewer_id = viewer.require_user()?;
    let mut conn = acquire(&pool).await?;
    let comment = comments::create_comment(&mut conn, viewer_id, req).await?;
    Ok((StatusCode::CREATED, Json(json!(comment))))
}

/// Comments on one target, oldest first.
pub async fn list_comments(
    State(pool): State<DbPool>,
    Query(query): Query<CommentsQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let target: CommentableType = query.commentable_type.parse()?;
    let mut conn = acquire(&pool).await?;
    let rows = comments::comments_for(&mut conn, target, query.commentable_id).await?;
    Ok((StatusCode::OK, Json(json!(rows))))
}
