// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{StoreError, StoreResult};
use crate::models::comment::{Comment, NewComment};
use crate::models::enums::CommentableType;
use crate::models::user::Profile;
use crate::schema::{comments, profiles};

#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    pub commentable_id: i32,
    pub commentable_type: String,
    pub parent_comment_id: Option<i32>,
    pub text_content: String,
}

/// Comment with the commenter's display info attached.
#[derive(Debug, Serialize)]
pub struct CommentView {
    pub comment_id: i32,
    pub commenter_user_id: i32,
    pub commenter_name: Option<String>,
    pub commenter_avatar: Option<String>,
    pub commentable_id: i32,
    pub commentable_type: String,
    pub parent_comment_id: Option<i32>,
    pub text_content: String,
    pub created_at: NaiveDateTime,
}

impl CommentView {
    fn new(comment: Comment, profile: Option<&Profile>) -> Self {
        CommentView {
            comment_id: comment.comment_id,
            commenter_user_id: comment.commenter_user_id,
            commenter_name: profile.and_then(|p| p.display_name()),
            commenter_avatar: profile.and_then(|p| p.profile_picture_url.clone()),
            commentable_id: comment.commentable_id,
            commentable_type: comment.commentable_type,
            parent_comment_id: comment.parent_comment_id,
            text_content: comment.text_content,
            created_at: comment.created_at,
        }
    }
}

pub async fn create_comment(
    conn: &mut AsyncPgConnection,
    commenter: i32,
    req: NewCommentRequest,
) -> StoreResult<CommentView> {
    let target: CommentableType = req.commentable_type.parse()?;
    let text = req.text_content.trim().to_string();
    if text.is_empty() {
        return Err(StoreError::validation("comment text must not be empty"));
    }

    let comment = diesel::insert_into(comments::table)
        .values(&NewComment {
            commenter_user_id: commenter,
            commentable_id: req.commentable_id,
            commentable_type: target.as_str().to_string(),
            parent_comment_id: req.parent_comment_id,
            text_content: text,
            created_at: Utc::now().naive_utc(),
        })
        .get_result::<Comment>(conn)
        .await?;

    let profile = profiles::table
        .filter(profiles::user_id.eq(commenter))
        .first::<Profile>(conn)
        .await
        .optional()?;
    Ok(CommentView::new(comment, profile.as_ref()))
}

/// Comments on one target, oldest first, with commenter display info.
pub async fn comments_for(
    conn: &mut AsyncPgConnection,
    target: CommentableType,
    commentable_id: i32,
) -> StoreResult<Vec<CommentView>> {
    let rows: Vec<Comment> = comments::table
        .filter(comments::commentable_type.eq(target.as_str()))
        .filter(comments::commentable_id.eq(commentable_id))
        .order(comments::created_at.asc())
        .load(conn)
        .await?;

    let commenter_ids: Vec<i32> = rows.iter().map(|c| c.commenter_user_id).collect();
    let profile_map: HashMap<i32, Profile> = profiles::table
        .filter(profiles::user_id.eq_any(commenter_ids))
        .load::<Profile>(conn)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();

    Ok(rows
        .into_iter()
        .map(|comment| {
            let profile = profile_map.get(&comment.commenter_user_id);
            CommentView::new(comment, profile)
        })
        .collect())
}
