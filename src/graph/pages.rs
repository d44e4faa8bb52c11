// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Page follows and page roles. The two relations are independent: a follow
//! feeds the follower's home stream, a role grants page-timeline posting.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::models::page::{Page, PageFollow, PageRole};
use crate::schema::{page_follows, page_roles, pages};

const PAGE_ROLE_ADMIN: &str = "ADMIN";

#[derive(Debug, Deserialize)]
pub struct NewPageRequest {
    pub page_name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageDetail {
    pub page_id: i32,
    pub page_name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub creator_user_id: i32,
    pub created_at: NaiveDateTime,
    pub follower_count: i64,
    pub is_followed: bool,
    pub my_role: Option<String>,
}

async fn load_page(conn: &mut AsyncPgConnection, page_id: i32) -> StoreResult<Page> {
    pages::table
        .find(page_id)
        .first::<Page>(conn)
        .await
        .optional()?
        .ok_or(StoreError::NotFound("page"))
}

/// Create a page; the creator receives the ADMIN role.
pub async fn create_page(
    conn: &mut AsyncPgConnection,
    creator: i32,
    req: NewPageRequest,
) -> StoreResult<Page> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let page = diesel::insert_into(pages::table)
                .values((
                    pages::page_name.eq(req.page_name),
                    pages::description.eq(req.description),
                    pages::avatar_url.eq(req.avatar_url),
                    pages::creator_user_id.eq(creator),
                    pages::created_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<Page>(conn)
                .await?;

            diesel::insert_into(page_roles::table)
                .values(&PageRole {
                    user_id: creator,
                    page_id: page.page_id,
                    role: PAGE_ROLE_ADMIN.to_string(),
                })
                .execute(conn)
                .await?;

            Ok(page)
        }
        .scope_boxed()
    })
    .await
}

/// Follow a page; repeating the call is a no-op.
pub async fn follow(conn: &mut AsyncPgConnection, user_id: i32, page_id: i32) -> StoreResult<()> {
    load_page(conn, page_id).await?;
    diesel::insert_into(page_follows::table)
        .values(&PageFollow {
            user_id,
            page_id,
            followed_at: Utc::now().naive_utc(),
        })
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

/// Drop the follow relation, if present.
pub async fn unfollow(conn: &mut AsyncPgConnection, user_id: i32, page_id: i32) -> StoreResult<()> {
    diesel::delete(page_follows::table.find((user_id, page_id)))
        .execute(conn)
        .await?;
    Ok(())
}

/// Page info with follower count and the viewer's standing.
pub async fn page_detail(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    page_id: i32,
) -> StoreResult<PageDetail> {
    let page = load_page(conn, page_id).await?;

    let follower_count: i64 = page_follows::table
        .filter(page_follows::page_id.eq(page_id))
        .count()
        .get_result(conn)
        .await?;

    let (is_followed, my_role) = match viewer {
        Some(viewer_id) => {
            let followed: i64 = page_follows::table
                .find((viewer_id, page_id))
                .count()
                .get_result(conn)
                .await?;
            let role = page_roles::table
                .find((viewer_id, page_id))
                .first::<PageRole>(conn)
                .await
                .optional()?
                .map(|r| r.role);
            (followed > 0, role)
        }
        None => (false, None),
    };

    Ok(PageDetail {
        page_id: page.page_id,
        page_name: page.page_name,
        description: page.description,
        avatar_url: page.avatar_url,
        creator_user_id: page.creator_user_id,
        created_at: page.created_at,
        follower_count,
        is_followed,
        my_role,
    })
}

/// Grant a role on a page; caller must hold the ADMIN role.
pub async fn assign_role(
    conn: &mut AsyncPgConnection,
    admin: i32,
    user_id: i32,
    page_id: i32,
    role: String,
) -> StoreResult<PageRole> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let admin_role = page_roles::table
                .find((admin, page_id))
                .first::<PageRole>(conn)
                .await
                .optional()?;
            if admin_role.map(|r| r.role) != Some(PAGE_ROLE_ADMIN.to_string()) {
                return Err(StoreError::forbidden("requires the page admin role"));
            }

            let granted = diesel::insert_into(page_roles::table)
                .values(&PageRole {
                    user_id,
                    page_id,
                    role: role.clone(),
                })
                .on_conflict((page_roles::user_id, page_roles::page_id))
                .do_update()
                .set(page_roles::role.eq(role))
                .get_result::<PageRole>(conn)
                .await?;
            Ok(granted)
        }
        .scope_boxed()
    })
    .await
}
