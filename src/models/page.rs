// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{page_follows, page_roles, pages};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Page {
    pub page_id: i32,
    pub page_name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub creator_user_id: i32,
    pub created_at: NaiveDateTime,
}

/// Follower relation on a page; independent of page roles.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = page_follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PageFollow {
    pub user_id: i32,
    pub page_id: i32,
    pub followed_at: NaiveDateTime,
}

/// Privileged role on a page; grants page-timeline posting.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = page_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PageRole {
    pub user_id: i32,
    pub page_id: i32,
    pub role: String,
}
