// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Friendship edge lifecycle: PENDING -> ACCEPTED | (deleted) | BLOCKED.
//!
//! Edges are stored canonically (`user_one_id < user_two_id`); the composite
//! primary key is the backstop against two users creating the pair
//! concurrently. Every mutation runs inside a single transaction.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::enums::{FriendshipState, PairStatus};
use crate::models::friendship::{canonical_pair, Friendship, NewFriendship};
use crate::models::user::Profile;
use crate::schema::{friendships, profiles, users};

/// Profile info attached to friend/request listings.
#[derive(Debug, Serialize)]
pub struct FriendSummary {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

impl FriendSummary {
    fn from_profile(user_id: i32, profile: Option<&Profile>) -> Self {
        FriendSummary {
            user_id,
            first_name: profile.map(|p| p.first_name.clone()).unwrap_or_default(),
            last_name: profile.map(|p| p.last_name.clone()).unwrap_or_default(),
            avatar_url: profile.and_then(|p| p.profile_picture_url.clone()),
        }
    }
}

async fn load_edge(
    conn: &mut AsyncPgConnection,
    a: i32,
    b: i32,
) -> StoreResult<Option<Friendship>> {
    let (one, two) = canonical_pair(a, b);
    friendships::table
        .find((one, two))
        .first::<Friendship>(conn)
        .await
        .optional()
        .map_err(StoreError::from)
}

/// Create a PENDING edge from `viewer` to `target`.
pub async fn request(
    conn: &mut AsyncPgConnection,
    viewer: i32,
    target: i32,
) -> StoreResult<Friendship> {
    if viewer == target {
        return Err(StoreError::forbidden("cannot send a friend request to yourself"));
    }

    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let target_exists: i64 = users::table
                .filter(users::user_id.eq(target))
                .count()
                .get_result(conn)
                .await?;
            if target_exists == 0 {
                return Err(StoreError::NotFound("user"));
            }

            if load_edge(conn, viewer, target).await?.is_some() {
                return Err(StoreError::conflict("friendship already exists"));
            }

            let (one, two) = canonical_pair(viewer, target);
            let now = Utc::now().naive_utc();
            debug!(viewer, target, "creating pending friendship edge");
            let edge = diesel::insert_into(friendships::table)
                .values(&NewFriendship {
                    user_one_id: one,
                    user_two_id: two,
                    status: FriendshipState::Pending.as_str().to_string(),
                    action_user_id: viewer,
                    created_at: now,
                    updated_at: now,
                })
                .get_result::<Friendship>(conn)
                .await?;
            Ok(edge)
        }
        .scope_boxed()
    })
    .await
}

/// Accept a PENDING request; only the recipient may accept.
pub async fn accept(
    conn: &mut AsyncPgConnection,
    viewer: i32,
    target: i32,
) -> StoreResult<Friendship> {
    if viewer == target {
        return Err(StoreError::forbidden("cannot accept a request from yourself"));
    }

    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let edge = load_edge(conn, viewer, target)
                .await?
                .ok_or(StoreError::NotFound("friend request"))?;
            edge.check_accept(viewer)?;

            let (one, two) = canonical_pair(viewer, target);
            let updated = diesel::update(friendships::table.find((one, two)))
                .set((
                    friendships::status.eq(FriendshipState::Accepted.as_str()),
                    friendships::action_user_id.eq(viewer),
                    friendships::updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<Friendship>(conn)
                .await?;
            Ok(updated)
        }
        .scope_boxed()
    })
    .await
}

/// Reject a PENDING request; only the recipient may reject. Deletes the edge.
pub async fn reject(conn: &mut AsyncPgConnection, viewer: i32, target: i32) -> StoreResult<()> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let edge = load_edge(conn, viewer, target)
                .await?
                .ok_or(StoreError::NotFound("friend request"))?;
            edge.check_reject(viewer)?;
            delete_edge(conn, viewer, target).await
        }
        .scope_boxed()
    })
    .await
}

/// Cancel a PENDING request; only the original requester may cancel.
pub async fn cancel(conn: &mut AsyncPgConnection, viewer: i32, target: i32) -> StoreResult<()> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let edge = load_edge(conn, viewer, target)
                .await?
                .ok_or(StoreError::NotFound("friend request"))?;
            edge.check_cancel(viewer)?;
            delete_edge(conn, viewer, target).await
        }
        .scope_boxed()
    })
    .await
}

/// Delete an ACCEPTED edge; either party may unfriend.
pub async fn unfriend(conn: &mut AsyncPgConnection, viewer: i32, target: i32) -> StoreResult<()> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let edge = load_edge(conn, viewer, target)
                .await?
                .ok_or(StoreError::NotFound("friendship"))?;
            edge.check_unfriend()?;
            delete_edge(conn, viewer, target).await
        }
        .scope_boxed()
    })
    .await
}

/// Block overwrites any existing edge state; a missing edge is created.
pub async fn block(
    conn: &mut AsyncPgConnection,
    viewer: i32,
    target: i32,
) -> StoreResult<Friendship> {
    if viewer == target {
        return Err(StoreError::forbidden("cannot block yourself"));
    }

    let (one, two) = canonical_pair(viewer, target);
    let now = Utc::now().naive_utc();
    debug!(viewer, target, "blocking user");
    diesel::insert_into(friendships::table)
        .values(&NewFriendship {
            user_one_id: one,
            user_two_id: two,
            status: FriendshipState::Blocked.as_str().to_string(),
            action_user_id: viewer,
            created_at: now,
            updated_at: now,
        })
        .on_conflict((friendships::user_one_id, friendships::user_two_id))
        .do_update()
        .set((
            friendships::status.eq(FriendshipState::Blocked.as_str()),
            friendships::action_user_id.eq(viewer),
            friendships::updated_at.eq(now),
        ))
        .get_result::<Friendship>(conn)
        .await
        .map_err(StoreError::from)
}

/// Unblock deletes the edge only while it is BLOCKED.
pub async fn unblock(conn: &mut AsyncPgConnection, viewer: i32, target: i32) -> StoreResult<()> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let edge = load_edge(conn, viewer, target)
                .await?
                .ok_or(StoreError::NotFound("block"))?;
            edge.check_unblock()?;
            delete_edge(conn, viewer, target).await
        }
        .scope_boxed()
    })
    .await
}

async fn delete_edge(conn: &mut AsyncPgConnection, a: i32, b: i32) -> StoreResult<()> {
    let (one, two) = canonical_pair(a, b);
    diesel::delete(friendships::table.find((one, two)))
        .execute(conn)
        .await?;
    Ok(())
}

/// Relationship between a viewer and a target user, for profile views.
pub async fn status(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    target: i32,
) -> StoreResult<PairStatus> {
    let viewer_id = match viewer {
        None => return Ok(PairStatus::None),
        Some(id) if id == target => return Ok(PairStatus::Own),
        Some(id) => id,
    };
    Ok(match load_edge(conn, viewer_id, target).await? {
        Some(edge) => edge.state()?.into(),
        None => PairStatus::None,
    })
}

/// Ids of users with an ACCEPTED edge to `user_id`.
pub async fn friends_of(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> StoreResult<HashSet<i32>> {
    let rows: Vec<(i32, i32)> = friendships::table
        .filter(friendships::status.eq(FriendshipState::Accepted.as_str()))
        .filter(
            friendships::user_one_id
                .eq(user_id)
                .or(friendships::user_two_id.eq(user_id)),
        )
        .select((friendships::user_one_id, friendships::user_two_id))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(one, two)| if one == user_id { two } else { one })
        .collect())
}

async fn profiles_by_user(
    conn: &mut AsyncPgConnection,
    user_ids: &[i32],
) -> StoreResult<HashMap<i32, Profile>> {
    let rows: Vec<Profile> = profiles::table
        .filter(profiles::user_id.eq_any(user_ids.to_vec()))
        .load(conn)
        .await?;
    Ok(rows.into_iter().map(|p| (p.user_id, p)).collect())
}

/// ACCEPTED friends of `user_id` with profile info.
pub async fn friends_with_profiles(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    limit: i64,
    offset: i64,
) -> StoreResult<Vec<FriendSummary>> {
    let edges: Vec<Friendship> = friendships::table
        .filter(friendships::status.eq(FriendshipState::Accepted.as_str()))
        .filter(
            friendships::user_one_id
                .eq(user_id)
                .or(friendships::user_two_id.eq(user_id)),
        )
        .order(friendships::updated_at.desc())
        .offset(offset)
        .limit(limit)
        .load(conn)
        .await?;

    let other_ids: Vec<i32> = edges.iter().map(|e| e.other_user(user_id)).collect();
    let profile_map = profiles_by_user(conn, &other_ids).await?;
    Ok(other_ids
        .into_iter()
        .map(|id| FriendSummary::from_profile(id, profile_map.get(&id)))
        .collect())
}

/// PENDING requests where `user_id` is the recipient.
pub async fn incoming_requests(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> StoreResult<Vec<FriendSummary>> {
    let edges: Vec<Friendship> = friendships::table
        .filter(friendships::status.eq(FriendshipState::Pending.as_str()))
        .filter(
            friendships::user_one_id
                .eq(user_id)
                .or(friendships::user_two_id.eq(user_id)),
        )
        .filter(friendships::action_user_id.ne(user_id))
        .order(friendships::created_at.desc())
        .load(conn)
        .await?;

    let other_ids: Vec<i32> = edges.iter().map(|e| e.other_user(user_id)).collect();
    let profile_map = profiles_by_user(conn, &other_ids).await?;
    Ok(other_ids
        .into_iter()
        .map(|id| FriendSummary::from_profile(id, profile_map.get(&id)))
        .collect())
}

/// Users with no edge of any state to `user_id`, for the "people you may
/// know" rail.
pub async fn suggestions(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    limit: i64,
) -> StoreResult<Vec<FriendSummary>> {
    let related: Vec<(i32, i32)> = friendships::table
        .filter(
            friendships::user_one_id
                .eq(user_id)
                .or(friendships::user_two_id.eq(user_id)),
        )
        .select((friendships::user_one_id, friendships::user_two_id))
        .load(conn)
        .await?;

    let mut exclude: Vec<i32> = related
        .into_iter()
        .map(|(one, two)| if one == user_id { two } else { one })
        .collect();
    exclude.push(user_id);

    let candidate_ids: Vec<i32> = users::table
        .filter(users::user_id.ne_all(exclude))
        .filter(users::is_active.eq(true))
        .order(users::user_id.asc())
        .limit(limit)
        .select(users::user_id)
        .load(conn)
        .await?;

    let profile_map = profiles_by_user(conn, &candidate_ids).await?;
    Ok(candidate_ids
        .into_iter()
        .map(|id| FriendSummary::from_profile(id, profile_map.get(&id)))
        .collect())
}
