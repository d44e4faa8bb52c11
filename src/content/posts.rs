// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Post creation and sharing.
//!
//! Location rules: users post only to their own timeline; group posts
//! require a JOINED membership and are forced PUBLIC (the group gates
//! visibility, not the post); page posts require a page role, are forced
//! PUBLIC and are attributed to the page itself. Post, location and file
//! links are written in one transaction.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::graph::membership;
use crate::models::enums::{
    AuthorType, LocationType, MemberStatus, PostType, PrivacySetting,
};
use crate::models::post::{File, NewPost, Post, PostFile, PostLocation};
use crate::schema::{files, page_roles, post_files, post_locations, posts};

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    pub text_content: Option<String>,
    pub privacy_setting: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<i32>,
    pub location_type: Option<String>,
    pub location_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub text_content: Option<String>,
    pub privacy_setting: Option<String>,
}

/// Create a post together with its location and file links.
pub async fn create_post(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    req: NewPostRequest,
) -> StoreResult<(Post, PostLocation)> {
    let text = req
        .text_content
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    if text.is_none() && req.file_ids.is_empty() {
        return Err(StoreError::validation(
            "a post needs text or at least one attached file",
        ));
    }

    let location_type: LocationType = req
        .location_type
        .as_deref()
        .unwrap_or(LocationType::UserTimeline.as_str())
        .parse()?;

    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let (location_id, privacy, author_id, author_type) = match location_type {
                LocationType::UserTimeline => {
                    let location_id = req.location_id.unwrap_or(user_id);
                    if location_id != user_id {
                        return Err(StoreError::forbidden(
                            "cannot post to another user's timeline",
                        ));
                    }
                    let privacy: PrivacySetting = req
                        .privacy_setting
                        .as_deref()
                        .unwrap_or(PrivacySetting::Public.as_str())
                        .parse()?;
                    (location_id, privacy, user_id, AuthorType::User)
                }
                LocationType::Group => {
                    let group_id = req
                        .location_id
                        .ok_or_else(|| StoreError::validation("location_id is required"))?;
                    let joined = membership::membership_of(conn, user_id, group_id)
                        .await?
                        .map(|m| m.member_status())
                        .transpose()?
                        == Some(MemberStatus::Joined);
                    if !joined {
                        return Err(StoreError::forbidden("join the group before posting"));
                    }
                    // group privacy governs visibility; the post itself is public
                    (group_id, PrivacySetting::Public, user_id, AuthorType::User)
                }
                LocationType::PageTimeline => {
                    let page_id = req
                        .location_id
                        .ok_or_else(|| StoreError::validation("location_id is required"))?;
                    let has_role: i64 = page_roles::table
                        .find((user_id, page_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if has_role == 0 {
                        return Err(StoreError::forbidden(
                            "requires a role on this page",
                        ));
                    }
                    // page posts are published as the page
                    (page_id, PrivacySetting::Public, page_id, AuthorType::Page)
                }
            };

            let now = Utc::now().naive_utc();
            let post = diesel::insert_into(posts::table)
                .values(&NewPost {
                    author_id,
                    author_type: author_type.as_str().to_string(),
                    text_content: text,
                    privacy_setting: privacy.as_str().to_string(),
                    post_type: PostType::Original.as_str().to_string(),
                    parent_post_id: None,
                    created_at: now,
                })
                .get_result::<Post>(conn)
                .await?;

            let location = diesel::insert_into(post_locations::table)
                .values(&PostLocation {
                    post_id: post.post_id,
                    location_id,
                    location_type: location_type.as_str().to_string(),
                })
                .get_result::<PostLocation>(conn)
                .await?;

            link_files(conn, post.post_id, user_id, &req.file_ids).await?;

            debug!(post_id = post.post_id, location = location_type.as_str(), "post created");
            Ok((post, location))
        }
        .scope_boxed()
    })
    .await
}

/// Attach uploaded files to a post, preserving submission order. Files that
/// do not exist or belong to someone else are skipped.
async fn link_files(
    conn: &mut AsyncPgConnection,
    post_id: i32,
    uploader: i32,
    file_ids: &[i32],
) -> StoreResult<()> {
    for (order, file_id) in file_ids.iter().enumerate() {
        let owned: Option<File> = files::table
            .find(*file_id)
            .filter(files::uploader_user_id.eq(uploader))
            .first::<File>(conn)
            .await
            .optional()?;
        if owned.is_none() {
            continue;
        }
        diesel::insert_into(post_files::table)
            .values(&PostFile {
                post_id,
                file_id: *file_id,
                display_order: order as i32,
            })
            .on_conflict_do_nothing()
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Share an existing post onto the sharer's own timeline, storing the
/// immediate parent (shares of shares chain, they do not flatten).
pub async fn share_post(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    post_id: i32,
    req: ShareRequest,
) -> StoreResult<Post> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let original = posts::table
                .find(post_id)
                .first::<Post>(conn)
                .await
                .optional()?
                .ok_or(StoreError::NotFound("post"))?;
            if original.privacy()? == PrivacySetting::OnlyMe {
                return Err(StoreError::validation("cannot share a private post"));
            }

            let privacy: PrivacySetting = req
                .privacy_setting
                .as_deref()
                .unwrap_or(PrivacySetting::Friends.as_str())
                .parse()?;

            let now = Utc::now().naive_utc();
            let share = diesel::insert_into(posts::table)
                .values(&NewPost {
                    author_id: user_id,
                    author_type: AuthorType::User.as_str().to_string(),
                    text_content: req.text_content,
                    privacy_setting: privacy.as_str().to_string(),
                    post_type: PostType::Share.as_str().to_string(),
                    parent_post_id: Some(original.post_id),
                    created_at: now,
                })
                .get_result::<Post>(conn)
                .await?;

            diesel::insert_into(post_locations::table)
                .values(&PostLocation {
                    post_id: share.post_id,
                    location_id: user_id,
                    location_type: LocationType::UserTimeline.as_str().to_string(),
                })
                .execute(conn)
                .await?;

            debug!(share_id = share.post_id, parent_id = original.post_id, "post shared");
            Ok(share)
        }
        .scope_boxed()
    })
    .await
}
