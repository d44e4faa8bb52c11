// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::models::enums::CommentableType;
use crate::schema::comments;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub comment_id: i32,
    pub commenter_user_id: i32,
    pub commentable_id: i32,
    pub commentable_type: String,
    pub parent_comment_id: Option<i32>,
    pub text_content: String,
    pub created_at: NaiveDateTime,
}

impl Comment {
    pub fn target_type(&self) -> StoreResult<CommentableType> {
        self.commentable_type.parse()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewComment {
    pub commenter_user_id: i32,
    pub commentable_id: i32,
    pub commentable_type: String,
    pub parent_comment_id: Option<i32>,
    pub text_content: String,
    pub created_at: NaiveDateTime,
}
