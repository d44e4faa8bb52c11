// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::models::enums::{AuthorType, LocationType, PostType, PrivacySetting};
use crate::schema::{files, post_files, post_locations, posts};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub post_id: i32,
    pub author_id: i32,
    pub author_type: String,
    pub text_content: Option<String>,
    pub privacy_setting: String,
    pub post_type: String,
    pub parent_post_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl Post {
    pub fn privacy(&self) -> StoreResult<PrivacySetting> {
        self.privacy_setting.parse()
    }

    pub fn kind(&self) -> StoreResult<PostType> {
        self.post_type.parse()
    }

    pub fn author(&self) -> StoreResult<AuthorType> {
        self.author_type.parse()
    }

    /// Immediate parent of a share; None for originals or dangling data.
    pub fn share_parent(&self) -> StoreResult<Option<i32>> {
        Ok(match self.kind()? {
            PostType::Share => self.parent_post_id,
            PostType::Original => None,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    pub author_id: i32,
    pub author_type: String,
    pub text_content: Option<String>,
    pub privacy_setting: String,
    pub post_type: String,
    pub parent_post_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = post_locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostLocation {
    pub post_id: i32,
    pub location_id: i32,
    pub location_type: String,
}

impl PostLocation {
    pub fn kind(&self) -> StoreResult<LocationType> {
        self.location_type.parse()
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = post_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostFile {
    pub post_id: i32,
    pub file_id: i32,
    pub display_order: i32,
}

/// File record produced by the external upload collaborator; consumed
/// read-only by the core.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct File {
    pub file_id: i32,
    pub uploader_user_id: i32,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub file_size: i32,
}
