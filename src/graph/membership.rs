// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Group membership lifecycle.
//!
//! State machine per (user, group): absent -> PENDING -> JOINED, absent ->
//! JOINED for public groups, any non-BANNED state -> BANNED, and BANNED ->
//! absent via explicit unban. Admin invites short-circuit PENDING straight
//! to JOINED. Exactly one row exists per (user, group).

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::enums::{GroupPrivacy, GroupRole, MemberStatus};
use crate::models::group::{
    check_required_answers, decide_join_status, Group, GroupMembership, MembershipAnswer,
    MembershipQuestion, NewGroup, NewGroupMembership, NewMembershipQuestion, SubmittedAnswer,
};
use crate::models::user::Profile;
use crate::schema::{
    group_memberships, groups, membership_answers, membership_questions, profiles, users,
};

#[derive(Debug, Deserialize)]
pub struct NewGroupRequest {
    pub group_name: String,
    pub description: Option<String>,
    pub cover_photo_url: Option<String>,
    pub privacy_type: Option<String>,
    pub is_visible: Option<bool>,
    #[serde(default)]
    pub questions: Vec<NewQuestionRequest>,
}

#[derive(Debug, Deserialize)]
pub struct NewQuestionRequest {
    pub question_text: String,
    #[serde(default)]
    pub is_required: bool,
}

/// Requested changes to a member row; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct MemberUpdate {
    pub status: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupDetail {
    pub group_id: i32,
    pub group_name: String,
    pub description: Option<String>,
    pub cover_photo_url: Option<String>,
    pub privacy_type: String,
    pub is_visible: bool,
    pub creator_user_id: i32,
    pub creator_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub member_count: i64,
    pub my_status: Option<MemberStatus>,
    pub my_role: Option<GroupRole>,
}

#[derive(Debug, Serialize)]
pub struct PendingRequest {
    pub user_id: i32,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
    pub joined_at: NaiveDateTime,
    pub answers: Vec<SubmittedAnswer>,
}

pub async fn load_group(conn: &mut AsyncPgConnection, group_id: i32) -> StoreResult<Group> {
    groups::table
        .find(group_id)
        .first::<Group>(conn)
        .await
        .optional()?
        .ok_or(StoreError::NotFound("group"))
}

pub async fn membership_of(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    group_id: i32,
) -> StoreResult<Option<GroupMembership>> {
    group_memberships::table
        .find((user_id, group_id))
        .first::<GroupMembership>(conn)
        .await
        .optional()
        .map_err(StoreError::from)
}

/// Caller must hold a JOINED membership with a moderating role.
async fn require_moderator(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    group_id: i32,
) -> StoreResult<GroupRole> {
    let membership = membership_of(conn, user_id, group_id).await?.ok_or_else(|| {
        StoreError::forbidden("requires an admin or moderator membership in this group")
    })?;
    membership.check_moderator()
}

/// Create a group together with its membership questions, seeding an
/// ADMIN/JOINED membership for the creator.
pub async fn create_group(
    conn: &mut AsyncPgConnection,
    creator: i32,
    req: NewGroupRequest,
) -> StoreResult<Group> {
    let privacy: GroupPrivacy = req
        .privacy_type
        .as_deref()
        .unwrap_or(GroupPrivacy::Public.as_str())
        .parse()?;

    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let now = Utc::now().naive_utc();
            let group = diesel::insert_into(groups::table)
                .values(&NewGroup {
                    group_name: req.group_name,
                    description: req.description,
                    cover_photo_url: req.cover_photo_url,
                    privacy_type: privacy.as_str().to_string(),
                    is_visible: req.is_visible.unwrap_or(true),
                    creator_user_id: creator,
                    created_at: now,
                })
                .get_result::<Group>(conn)
                .await?;

            diesel::insert_into(group_memberships::table)
                .values(&NewGroupMembership {
                    user_id: creator,
                    group_id: group.group_id,
                    role: GroupRole::Admin.as_str().to_string(),
                    status: MemberStatus::Joined.as_str().to_string(),
                    joined_at: now,
                })
                .execute(conn)
                .await?;

            for question in req.questions {
                diesel::insert_into(membership_questions::table)
                    .values(&NewMembershipQuestion {
                        group_id: group.group_id,
                        question_text: question.question_text,
                        is_required: question.is_required,
                    })
                    .execute(conn)
                    .await?;
            }

            Ok(group)
        }
        .scope_boxed()
    })
    .await
}

pub async fn questions_for(
    conn: &mut AsyncPgConnection,
    group_id: i32,
) -> StoreResult<Vec<MembershipQuestion>> {
    membership_questions::table
        .filter(membership_questions::group_id.eq(group_id))
        .order(membership_questions::question_id.asc())
        .load(conn)
        .await
        .map_err(StoreError::from)
}

/// Request membership. Public groups join directly; private groups queue a
/// PENDING request. All required questions must be answered; answers are
/// upserted idempotently.
pub async fn join(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    group_id: i32,
    answers: Vec<SubmittedAnswer>,
) -> StoreResult<MemberStatus> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let group = load_group(conn, group_id).await?;
            let existing = membership_of(conn, user_id, group_id)
                .await?
                .map(|m| m.member_status())
                .transpose()?;

            let target = decide_join_status(existing, group.privacy()?)?;

            let questions = questions_for(conn, group_id).await?;
            check_required_answers(&questions, &answers)?;

            let now = Utc::now().naive_utc();
            debug!(user_id, group_id, status = target.as_str(), "group join request");
            diesel::insert_into(group_memberships::table)
                .values(&NewGroupMembership {
                    user_id,
                    group_id,
                    role: GroupRole::Member.as_str().to_string(),
                    status: target.as_str().to_string(),
                    joined_at: now,
                })
                .on_conflict((group_memberships::user_id, group_memberships::group_id))
                .do_update()
                .set((
                    group_memberships::status.eq(target.as_str()),
                    group_memberships::role.eq(GroupRole::Member.as_str()),
                ))
                .execute(conn)
                .await?;

            for answer in answers {
                diesel::insert_into(membership_answers::table)
                    .values(&MembershipAnswer {
                        user_id,
                        group_id,
                        question_id: answer.question_id,
                        answer_text: answer.answer_text.clone(),
                    })
                    .on_conflict((
                        membership_answers::user_id,
                        membership_answers::group_id,
                        membership_answers::question_id,
                    ))
                    .do_update()
                    .set(membership_answers::answer_text.eq(answer.answer_text))
                    .execute(conn)
                    .await?;
            }

            Ok(target)
        }
        .scope_boxed()
    })
    .await
}

/// Delete the caller's own membership row, if any.
pub async fn leave(conn: &mut AsyncPgConnection, user_id: i32, group_id: i32) -> StoreResult<()> {
    diesel::delete(group_memberships::table.find((user_id, group_id)))
        .execute(conn)
        .await?;
    Ok(())
}

/// Flip a PENDING request to JOINED. Moderator+ only.
pub async fn approve(
    conn: &mut AsyncPgConnection,
    admin: i32,
    user_id: i32,
    group_id: i32,
) -> StoreResult<GroupMembership> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            require_moderator(conn, admin, group_id).await?;
            let membership = membership_of(conn, user_id, group_id)
                .await?
                .ok_or(StoreError::NotFound("membership request"))?;
            if membership.member_status()? != MemberStatus::Pending {
                return Err(StoreError::NotFound("membership request"));
            }
            let updated = diesel::update(group_memberships::table.find((user_id, group_id)))
                .set(group_memberships::status.eq(MemberStatus::Joined.as_str()))
                .get_result::<GroupMembership>(conn)
                .await?;
            Ok(updated)
        }
        .scope_boxed()
    })
    .await
}

/// Delete a PENDING request. Moderator+ only.
pub async fn reject(
    conn: &mut AsyncPgConnection,
    admin: i32,
    user_id: i32,
    group_id: i32,
) -> StoreResult<()> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            require_moderator(conn, admin, group_id).await?;
            let membership = membership_of(conn, user_id, group_id)
                .await?
                .ok_or(StoreError::NotFound("membership request"))?;
            if membership.member_status()? != MemberStatus::Pending {
                return Err(StoreError::NotFound("membership request"));
            }
            diesel::delete(group_memberships::table.find((user_id, group_id)))
                .execute(conn)
                .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await
}

/// Ban a user, creating the row if none existed (pre-emptive ban of a
/// non-member is allowed). Moderator+ only.
pub async fn ban(
    conn: &mut AsyncPgConnection,
    admin: i32,
    user_id: i32,
    group_id: i32,
) -> StoreResult<GroupMembership> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            require_moderator(conn, admin, group_id).await?;
            let now = Utc::now().naive_utc();
            debug!(user_id, group_id, "banning group member");
            let banned = diesel::insert_into(group_memberships::table)
                .values(&NewGroupMembership {
                    user_id,
                    group_id,
                    role: GroupRole::Member.as_str().to_string(),
                    status: MemberStatus::Banned.as_str().to_string(),
                    joined_at: now,
                })
                .on_conflict((group_memberships::user_id, group_memberships::group_id))
                .do_update()
                .set(group_memberships::status.eq(MemberStatus::Banned.as_str()))
                .get_result::<GroupMembership>(conn)
                .await?;
            Ok(banned)
        }
        .scope_boxed()
    })
    .await
}

/// Delete a BANNED row, returning the user to non-member. Moderator+ only.
pub async fn unban(
    conn: &mut AsyncPgConnection,
    admin: i32,
    user_id: i32,
    group_id: i32,
) -> StoreResult<()> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            require_moderator(conn, admin, group_id).await?;
            let membership = membership_of(conn, user_id, group_id)
                .await?
                .ok_or(StoreError::NotFound("ban"))?;
            if membership.member_status()? != MemberStatus::Banned {
                return Err(StoreError::NotFound("ban"));
            }
            diesel::delete(group_memberships::table.find((user_id, group_id)))
                .execute(conn)
                .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await
}

/// Invite short-circuits the workflow: no record or PENDING goes straight to
/// JOINED. Moderator+ only.
pub async fn invite(
    conn: &mut AsyncPgConnection,
    admin: i32,
    user_id: i32,
    group_id: i32,
) -> StoreResult<GroupMembership> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            require_moderator(conn, admin, group_id).await?;
            load_group(conn, group_id).await?;

            let invitee_exists: i64 = users::table
                .filter(users::user_id.eq(user_id))
                .count()
                .get_result(conn)
                .await?;
            if invitee_exists == 0 {
                return Err(StoreError::NotFound("user"));
            }

            if let Some(existing) = membership_of(conn, user_id, group_id).await? {
                match existing.member_status()? {
                    MemberStatus::Joined => {
                        return Err(StoreError::conflict("user is already a member"))
                    }
                    MemberStatus::Banned => {
                        return Err(StoreError::forbidden("user is banned from this group"))
                    }
                    MemberStatus::Pending => {
                        let updated =
                            diesel::update(group_memberships::table.find((user_id, group_id)))
                                .set(group_memberships::status.eq(MemberStatus::Joined.as_str()))
                                .get_result::<GroupMembership>(conn)
                                .await?;
                        return Ok(updated);
                    }
                }
            }

            let now = Utc::now().naive_utc();
            let membership = diesel::insert_into(group_memberships::table)
                .values(&NewGroupMembership {
                    user_id,
                    group_id,
                    role: GroupRole::Member.as_str().to_string(),
                    status: MemberStatus::Joined.as_str().to_string(),
                    joined_at: now,
                })
                .get_result::<GroupMembership>(conn)
                .await?;
            Ok(membership)
        }
        .scope_boxed()
    })
    .await
}

/// Update a member row. Status changes require MODERATOR+; role changes
/// require ADMIN. A BANNED member can only come back via explicit unban.
pub async fn update_member(
    conn: &mut AsyncPgConnection,
    admin: i32,
    user_id: i32,
    group_id: i32,
    update: MemberUpdate,
) -> StoreResult<GroupMembership> {
    let new_status = update.status.as_deref().map(str::parse).transpose()?;
    let new_role: Option<GroupRole> = update.role.as_deref().map(str::parse).transpose()?;

    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let admin_role = require_moderator(conn, admin, group_id).await?;
            if new_role.is_some() && admin_role != GroupRole::Admin {
                return Err(StoreError::forbidden("only admins can change member roles"));
            }

            let membership = membership_of(conn, user_id, group_id)
                .await?
                .ok_or(StoreError::NotFound("membership"))?;
            if membership.member_status()? == MemberStatus::Banned
                && matches!(new_status, Some(MemberStatus::Pending | MemberStatus::Joined))
            {
                return Err(StoreError::forbidden("banned members must be unbanned first"));
            }

            let target = group_memberships::table.find((user_id, group_id));
            let updated = match (new_status, new_role) {
                (Some(status), Some(role)) => {
                    diesel::update(target)
                        .set((
                            group_memberships::status.eq(status.as_str()),
                            group_memberships::role.eq(role.as_str()),
                        ))
                        .get_result::<GroupMembership>(conn)
                        .await?
                }
                (Some(status), None) => {
                    diesel::update(target)
                        .set(group_memberships::status.eq(status.as_str()))
                        .get_result::<GroupMembership>(conn)
                        .await?
                }
                (None, Some(role)) => {
                    diesel::update(target)
                        .set(group_memberships::role.eq(role.as_str()))
                        .get_result::<GroupMembership>(conn)
                        .await?
                }
                (None, None) => membership,
            };
            Ok(updated)
        }
        .scope_boxed()
    })
    .await
}

/// Members of a group, optionally filtered by status.
pub async fn members(
    conn: &mut AsyncPgConnection,
    group_id: i32,
    status_filter: Option<MemberStatus>,
) -> StoreResult<Vec<GroupMembership>> {
    let mut query = group_memberships::table
        .filter(group_memberships::group_id.eq(group_id))
        .into_boxed();
    if let Some(status) = status_filter {
        query = query.filter(group_memberships::status.eq(status.as_str()));
    }
    query
        .order(group_memberships::joined_at.asc())
        .load(conn)
        .await
        .map_err(StoreError::from)
}

/// Group info plus the viewer's own standing. A banned viewer is refused.
pub async fn group_detail(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    group_id: i32,
) -> StoreResult<GroupDetail> {
    let group = load_group(conn, group_id).await?;

    let (my_status, my_role) = match viewer {
        Some(viewer_id) => match membership_of(conn, viewer_id, group_id).await? {
            Some(membership) => {
                if membership.is_banned()? {
                    return Err(StoreError::forbidden("you are banned from this group"));
                }
                (
                    Some(membership.member_status()?),
                    Some(membership.member_role()?),
                )
            }
            None => (None, None),
        },
        None => (None, None),
    };

    let member_count: i64 = group_memberships::table
        .filter(group_memberships::group_id.eq(group_id))
        .filter(group_memberships::status.eq(MemberStatus::Joined.as_str()))
        .count()
        .get_result(conn)
        .await?;

    let creator_name = profiles::table
        .filter(profiles::user_id.eq(group.creator_user_id))
        .first::<Profile>(conn)
        .await
        .optional()?
        .and_then(|p| p.display_name());

    Ok(GroupDetail {
        group_id: group.group_id,
        group_name: group.group_name,
        description: group.description,
        cover_photo_url: group.cover_photo_url,
        privacy_type: group.privacy_type,
        is_visible: group.is_visible,
        creator_user_id: group.creator_user_id,
        creator_name,
        created_at: group.created_at,
        member_count,
        my_status,
        my_role,
    })
}

/// PENDING join requests with the answers each applicant submitted.
/// Moderator+ only.
pub async fn pending_requests(
    conn: &mut AsyncPgConnection,
    admin: i32,
    group_id: i32,
) -> StoreResult<Vec<PendingRequest>> {
    require_moderator(conn, admin, group_id).await?;

    let pending: Vec<GroupMembership> = group_memberships::table
        .filter(group_memberships::group_id.eq(group_id))
        .filter(group_memberships::status.eq(MemberStatus::Pending.as_str()))
        .order(group_memberships::joined_at.asc())
        .load(conn)
        .await?;

    let user_ids: Vec<i32> = pending.iter().map(|m| m.user_id).collect();
    let profile_map: HashMap<i32, Profile> = profiles::table
        .filter(profiles::user_id.eq_any(user_ids.clone()))
        .load::<Profile>(conn)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();

    let answers: Vec<MembershipAnswer> = membership_answers::table
        .filter(membership_answers::group_id.eq(group_id))
        .filter(membership_answers::user_id.eq_any(user_ids))
        .load(conn)
        .await?;
    let mut answers_by_user: HashMap<i32, Vec<SubmittedAnswer>> = HashMap::new();
    for answer in answers {
        answers_by_user
            .entry(answer.user_id)
            .or_default()
            .push(SubmittedAnswer {
                question_id: answer.question_id,
                answer_text: answer.answer_text,
            });
    }

    Ok(pending
        .into_iter()
        .map(|membership| {
            let profile = profile_map.get(&membership.user_id);
            PendingRequest {
                user_id: membership.user_id,
                user_name: profile.and_then(|p| p.display_name()),
                user_avatar: profile.and_then(|p| p.profile_picture_url.clone()),
                joined_at: membership.joined_at,
                answers: answers_by_user
                    .remove(&membership.user_id)
                    .unwrap_or_default(),
            }
        })
        .collect())
}

/// Group ids where the user holds a JOINED membership.
pub async fn joined_group_ids(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> StoreResult<Vec<i32>> {
    group_memberships::table
        .filter(group_memberships::user_id.eq(user_id))
        .filter(group_memberships::status.eq(MemberStatus::Joined.as_str()))
        .select(group_memberships::group_id)
        .load(conn)
        .await
        .map_err(StoreError::from)
}
