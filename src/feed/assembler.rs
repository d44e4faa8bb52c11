// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Feed assembly: candidate collection, ranking, and post summaries.
//!
//! The candidate set may over-include (a PUBLIC post inside a private group
//! is still a candidate); every candidate is passed through the visibility
//! resolver before it can reach the response. Ranking is newest-first with
//! the post id as the stable tie-break, so a fixed snapshot always produces
//! the same ordering even when `created_at` collides at second granularity.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::feed::visibility::{CandidatePost, ViewerContext};
use crate::graph::membership;
use crate::models::enums::{
    AuthorType, CommentableType, FileKind, FriendshipState, GroupPrivacy, LocationType,
    MemberStatus, PostType, PrivacySetting, ReactableType,
};
use crate::models::group::Group;
use crate::models::page::Page;
use crate::models::post::{File, Post, PostFile, PostLocation};
use crate::models::user::Profile;
use crate::schema::{
    comments, files, friendships, groups, pages, post_files, post_locations, posts, profiles,
    reactions,
};

/// Defensive cap on the share-parent walk; malformed data could in principle
/// contain a parent cycle.
const MAX_SHARE_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EngagementStats {
    pub likes: i64,
    pub comments: i64,
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub file_id: i32,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub kind: FileKind,
    pub stats: EngagementStats,
    pub is_liked_by_me: bool,
}

/// Leaner file record used inside embedded share summaries.
#[derive(Debug, Serialize)]
pub struct SharedFile {
    pub file_id: i32,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub kind: FileKind,
}

/// Embedded summary of a shared post's immediate parent.
#[derive(Debug, Serialize)]
pub struct SharedPost {
    pub post_id: i32,
    pub author_id: i32,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub text_content: Option<String>,
    pub post_type: String,
    pub created_at: NaiveDateTime,
    pub files: Vec<SharedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_post: Option<Box<SharedPost>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum LocationSummary {
    #[serde(rename = "GROUP")]
    Group { group_id: i32, group_name: String },
    #[serde(rename = "PAGE")]
    Page { page_id: i32, page_name: String },
}

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub post_id: i32,
    pub author_id: i32,
    pub author_type: String,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub text_content: Option<String>,
    pub privacy_setting: String,
    pub post_type: String,
    pub created_at: NaiveDateTime,
    pub stats: EngagementStats,
    pub is_liked_by_me: bool,
    pub files: Vec<FileSummary>,
    pub location: Option<LocationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_post: Option<Box<SharedPost>>,
}

/// Newest first, post id breaking timestamp ties.
pub fn rank_newest_first(candidates: &mut [Post]) {
    candidates.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.post_id.cmp(&a.post_id))
    });
}

/// Fold a share chain (outermost parent first) into the nested summary shape.
pub fn nest_chain(chain: Vec<SharedPost>) -> Option<Box<SharedPost>> {
    let mut nested = None;
    for mut item in chain.into_iter().rev() {
        item.shared_post = nested.take();
        nested = Some(Box::new(item));
    }
    nested
}

async fn like_count(
    conn: &mut AsyncPgConnection,
    target: ReactableType,
    id: i32,
) -> StoreResult<i64> {
    reactions::table
        .filter(reactions::reactable_type.eq(target.as_str()))
        .filter(reactions::reactable_id.eq(id))
        .count()
        .get_result(conn)
        .await
        .map_err(StoreError::from)
}

async fn comment_count(
    conn: &mut AsyncPgConnection,
    target: CommentableType,
    id: i32,
) -> StoreResult<i64> {
    comments::table
        .filter(comments::commentable_type.eq(target.as_str()))
        .filter(comments::commentable_id.eq(id))
        .count()
        .get_result(conn)
        .await
        .map_err(StoreError::from)
}

async fn is_liked_by(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    target: ReactableType,
    id: i32,
) -> StoreResult<bool> {
    let viewer_id = match viewer {
        Some(id) => id,
        None => return Ok(false),
    };
    let count: i64 = reactions::table
        .filter(reactions::reactable_type.eq(target.as_str()))
        .filter(reactions::reactable_id.eq(id))
        .filter(reactions::reactor_user_id.eq(viewer_id))
        .count()
        .get_result(conn)
        .await?;
    Ok(count > 0)
}

async fn attached_files(conn: &mut AsyncPgConnection, post_id: i32) -> StoreResult<Vec<File>> {
    let links: Vec<PostFile> = post_files::table
        .filter(post_files::post_id.eq(post_id))
        .order(post_files::display_order.asc())
        .load(conn)
        .await?;
    let ids: Vec<i32> = links.iter().map(|l| l.file_id).collect();
    let mut by_id: HashMap<i32, File> = files::table
        .filter(files::file_id.eq_any(ids.clone()))
        .load::<File>(conn)
        .await?
        .into_iter()
        .map(|f| (f.file_id, f))
        .collect();
    Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
}

async fn profile_of(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> StoreResult<Option<Profile>> {
    profiles::table
        .filter(profiles::user_id.eq(user_id))
        .first::<Profile>(conn)
        .await
        .optional()
        .map_err(StoreError::from)
}

/// Author display fields for a post: the owning user's profile, or the page
/// identity for page-authored posts.
async fn author_identity(
    conn: &mut AsyncPgConnection,
    post: &Post,
) -> StoreResult<(Option<String>, Option<String>)> {
    match post.author()? {
        AuthorType::User => {
            let profile = profile_of(conn, post.author_id).await?;
            Ok((
                profile.as_ref().and_then(|p| p.display_name()),
                profile.and_then(|p| p.profile_picture_url),
            ))
        }
        AuthorType::Page => {
            let page = pages::table
                .find(post.author_id)
                .first::<Page>(conn)
                .await
                .optional()?;
            Ok((
                page.as_ref().map(|p| p.page_name.clone()),
                page.and_then(|p| p.avatar_url),
            ))
        }
    }
}

/// Walk the share-parent chain one level at a time, tolerating dangling
/// references and stopping at the depth cap.
async fn resolve_share_chain(
    conn: &mut AsyncPgConnection,
    start: Option<i32>,
) -> StoreResult<Option<Box<SharedPost>>> {
    let mut chain: Vec<SharedPost> = Vec::new();
    let mut seen: HashSet<i32> = HashSet::new();
    let mut next = start;

    while let Some(post_id) = next {
        if chain.len() >= MAX_SHARE_DEPTH || !seen.insert(post_id) {
            break;
        }
        let parent = posts::table
            .find(post_id)
            .first::<Post>(conn)
            .await
            .optional()?;
        let Some(parent) = parent else {
            // dangling parent reference: stop, keep what we have
            break;
        };

        let (author_name, author_avatar) = author_identity(conn, &parent).await?;
        let shared_files = attached_files(conn, parent.post_id)
            .await?
            .into_iter()
            .map(|file| SharedFile {
                kind: FileKind::from_mime(&file.file_type),
                file_id: file.file_id,
                file_name: file.file_name,
                file_type: file.file_type,
                file_url: file.file_url,
                thumbnail_url: file.thumbnail_url,
            })
            .collect();

        next = parent.share_parent()?;
        chain.push(SharedPost {
            post_id: parent.post_id,
            author_id: parent.author_id,
            author_name,
            author_avatar,
            text_content: parent.text_content,
            post_type: parent.post_type,
            created_at: parent.created_at,
            files: shared_files,
            shared_post: None,
        });
    }

    Ok(nest_chain(chain))
}

/// Build the full summary for one post: author identity, aggregates, files,
/// location metadata and the embedded share chain.
pub async fn summarize_post(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    post: &Post,
) -> StoreResult<PostSummary> {
    let (mut author_name, mut author_avatar) = author_identity(conn, post).await?;

    let stats = EngagementStats {
        likes: like_count(conn, ReactableType::Post, post.post_id).await?,
        comments: comment_count(conn, CommentableType::Post, post.post_id).await?,
    };
    let is_liked_by_me = is_liked_by(conn, viewer, ReactableType::Post, post.post_id).await?;

    let mut file_summaries = Vec::new();
    for file in attached_files(conn, post.post_id).await? {
        let file_stats = EngagementStats {
            likes: like_count(conn, ReactableType::File, file.file_id).await?,
            comments: comment_count(conn, CommentableType::File, file.file_id).await?,
        };
        let liked = is_liked_by(conn, viewer, ReactableType::File, file.file_id).await?;
        file_summaries.push(FileSummary {
            kind: FileKind::from_mime(&file.file_type),
            file_id: file.file_id,
            file_name: file.file_name,
            file_type: file.file_type,
            file_url: file.file_url,
            thumbnail_url: file.thumbnail_url,
            stats: file_stats,
            is_liked_by_me: liked,
        });
    }

    let location = post_locations::table
        .find(post.post_id)
        .first::<PostLocation>(conn)
        .await
        .optional()?;
    let location_summary = match location {
        Some(loc) => match loc.kind()? {
            LocationType::Group => {
                let group = groups::table
                    .find(loc.location_id)
                    .first::<Group>(conn)
                    .await
                    .optional()?;
                group.map(|g| LocationSummary::Group {
                    group_id: g.group_id,
                    group_name: g.group_name,
                })
            }
            LocationType::PageTimeline => {
                let page = pages::table
                    .find(loc.location_id)
                    .first::<Page>(conn)
                    .await
                    .optional()?;
                page.map(|p| {
                    // page timeline posts surface the page as the author
                    author_name = Some(p.page_name.clone());
                    author_avatar = p.avatar_url.clone();
                    LocationSummary::Page {
                        page_id: p.page_id,
                        page_name: p.page_name,
                    }
                })
            }
            LocationType::UserTimeline => None,
        },
        None => None,
    };

    let shared_post = match post.kind()? {
        PostType::Share => resolve_share_chain(conn, post.parent_post_id).await?,
        PostType::Original => None,
    };

    Ok(PostSummary {
        post_id: post.post_id,
        author_id: post.author_id,
        author_type: post.author_type.clone(),
        author_name,
        author_avatar,
        text_content: post.text_content.clone(),
        privacy_setting: post.privacy_setting.clone(),
        post_type: post.post_type.clone(),
        created_at: post.created_at,
        stats,
        is_liked_by_me,
        files: file_summaries,
        location: location_summary,
        shared_post,
    })
}

/// Candidate post ids for a viewer's home feed: public posts, own posts,
/// friends' FRIENDS posts, joined-group posts and followed-page posts.
async fn candidate_ids(
    conn: &mut AsyncPgConnection,
    ctx: &ViewerContext,
) -> StoreResult<BTreeSet<i32>> {
    let mut ids: BTreeSet<i32> = posts::table
        .filter(posts::privacy_setting.eq(PrivacySetting::Public.as_str()))
        .select(posts::post_id)
        .load::<i32>(conn)
        .await?
        .into_iter()
        .collect();

    let viewer_id = match ctx.viewer.id() {
        None => return Ok(ids),
        Some(id) => id,
    };

    let own: Vec<i32> = posts::table
        .filter(posts::author_id.eq(viewer_id))
        .filter(posts::author_type.eq(AuthorType::User.as_str()))
        .select(posts::post_id)
        .load(conn)
        .await?;
    ids.extend(own);

    if !ctx.friend_ids.is_empty() {
        let friend_ids: Vec<i32> = ctx.friend_ids.iter().copied().collect();
        let from_friends: Vec<i32> = posts::table
            .filter(posts::privacy_setting.eq(PrivacySetting::Friends.as_str()))
            .filter(posts::author_type.eq(AuthorType::User.as_str()))
            .filter(posts::author_id.eq_any(friend_ids))
            .select(posts::post_id)
            .load(conn)
            .await?;
        ids.extend(from_friends);
    }

    if !ctx.joined_group_ids.is_empty() {
        let group_ids: Vec<i32> = ctx.joined_group_ids.iter().copied().collect();
        let in_groups: Vec<i32> = post_locations::table
            .filter(post_locations::location_type.eq(LocationType::Group.as_str()))
            .filter(post_locations::location_id.eq_any(group_ids))
            .select(post_locations::post_id)
            .load(conn)
            .await?;
        ids.extend(in_groups);
    }

    if !ctx.followed_page_ids.is_empty() {
        let page_ids: Vec<i32> = ctx.followed_page_ids.iter().copied().collect();
        let on_pages: Vec<i32> = post_locations::table
            .filter(post_locations::location_type.eq(LocationType::PageTimeline.as_str()))
            .filter(post_locations::location_id.eq_any(page_ids))
            .select(post_locations::post_id)
            .load(conn)
            .await?;
        ids.extend(on_pages);
    }

    Ok(ids)
}

/// Load locations and group privacy for a batch of posts and run each through
/// the visibility gate, preserving input order.
async fn filter_visible(
    conn: &mut AsyncPgConnection,
    ctx: &ViewerContext,
    candidates: Vec<Post>,
) -> StoreResult<Vec<Post>> {
    let ids: Vec<i32> = candidates.iter().map(|p| p.post_id).collect();
    let locations: HashMap<i32, PostLocation> = post_locations::table
        .filter(post_locations::post_id.eq_any(ids))
        .load::<PostLocation>(conn)
        .await?
        .into_iter()
        .map(|l| (l.post_id, l))
        .collect();

    let group_ids: Vec<i32> = locations
        .values()
        .filter(|l| l.location_type == LocationType::Group.as_str())
        .map(|l| l.location_id)
        .collect();
    let group_privacy: HashMap<i32, GroupPrivacy> = groups::table
        .filter(groups::group_id.eq_any(group_ids))
        .load::<Group>(conn)
        .await?
        .into_iter()
        .map(|g| Ok((g.group_id, g.privacy()?)))
        .collect::<StoreResult<_>>()?;

    let mut visible = Vec::new();
    for post in candidates {
        let location = locations.get(&post.post_id);
        let privacy = location
            .filter(|l| l.location_type == LocationType::Group.as_str())
            .and_then(|l| group_privacy.get(&l.location_id).copied());
        let candidate = CandidatePost::from_parts(&post, location, privacy)?;
        if ctx.can_see(&candidate) {
            visible.push(post);
        }
    }
    Ok(visible)
}

/// Assemble the home feed for a viewer.
pub async fn build_feed(
    conn: &mut AsyncPgConnection,
    ctx: &ViewerContext,
    limit: i64,
) -> StoreResult<Vec<PostSummary>> {
    let ids: Vec<i32> = candidate_ids(conn, ctx).await?.into_iter().collect();
    debug!(candidates = ids.len(), "assembling feed");

    let mut candidates: Vec<Post> = posts::table
        .filter(posts::post_id.eq_any(ids))
        .load(conn)
        .await?;
    rank_newest_first(&mut candidates);

    let visible = filter_visible(conn, ctx, candidates).await?;

    let mut summaries = Vec::new();
    for post in visible.into_iter().take(limit.max(0) as usize) {
        summaries.push(summarize_post(conn, ctx.viewer.id(), &post).await?);
    }
    Ok(summaries)
}

/// A single, directly-addressed post; Forbidden when the resolver says no.
pub async fn single_post(
    conn: &mut AsyncPgConnection,
    ctx: &ViewerContext,
    post_id: i32,
) -> StoreResult<PostSummary> {
    let post = posts::table
        .find(post_id)
        .first::<Post>(conn)
        .await
        .optional()?
        .ok_or(StoreError::NotFound("post"))?;

    let visible = filter_visible(conn, ctx, vec![post]).await?;
    let post = visible
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::forbidden("you are not allowed to view this post"))?;
    summarize_post(conn, ctx.viewer.id(), &post).await
}

/// Posts authored by `user_id`, filtered by the viewer's standing: owners see
/// everything, accepted friends see PUBLIC + FRIENDS, everyone else PUBLIC.
pub async fn user_timeline(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    user_id: i32,
    limit: i64,
    offset: i64,
) -> StoreResult<Vec<PostSummary>> {
    let is_self = viewer == Some(user_id);
    let is_friend = match viewer {
        Some(viewer_id) if !is_self => {
            let (one, two) = crate::models::friendship::canonical_pair(viewer_id, user_id);
            let accepted: i64 = friendships::table
                .find((one, two))
                .filter(friendships::status.eq(FriendshipState::Accepted.as_str()))
                .count()
                .get_result(conn)
                .await?;
            accepted > 0
        }
        _ => false,
    };

    let allowed: Vec<&str> = if is_self {
        vec![
            PrivacySetting::Public.as_str(),
            PrivacySetting::Friends.as_str(),
            PrivacySetting::OnlyMe.as_str(),
        ]
    } else if is_friend {
        vec![
            PrivacySetting::Public.as_str(),
            PrivacySetting::Friends.as_str(),
        ]
    } else {
        vec![PrivacySetting::Public.as_str()]
    };

    let mut timeline: Vec<Post> = posts::table
        .filter(posts::author_id.eq(user_id))
        .filter(posts::author_type.eq(AuthorType::User.as_str()))
        .filter(posts::privacy_setting.eq_any(allowed))
        .load(conn)
        .await?;
    rank_newest_first(&mut timeline);

    let window = timeline
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize);
    let mut summaries = Vec::new();
    for post in window {
        summaries.push(summarize_post(conn, viewer, &post).await?);
    }
    Ok(summaries)
}

/// Posts inside one group, keyset-paginated by post id. Private groups are
/// members-only.
pub async fn group_feed(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    group_id: i32,
    limit: i64,
    last_post_id: Option<i32>,
) -> StoreResult<Vec<PostSummary>> {
    let group = membership::load_group(conn, group_id).await?;
    if group.privacy()? == GroupPrivacy::Private {
        let joined = match viewer {
            Some(viewer_id) => {
                let membership = membership::membership_of(conn, viewer_id, group_id).await?;
                match membership {
                    Some(m) => m.member_status()? == MemberStatus::Joined,
                    None => false,
                }
            }
            None => false,
        };
        if !joined {
            return Err(StoreError::forbidden(
                "only members can view posts in this group",
            ));
        }
    }

    let post_ids: Vec<i32> = post_locations::table
        .filter(post_locations::location_type.eq(LocationType::Group.as_str()))
        .filter(post_locations::location_id.eq(group_id))
        .select(post_locations::post_id)
        .load(conn)
        .await?;

    let mut group_posts: Vec<Post> = posts::table
        .filter(posts::post_id.eq_any(post_ids))
        .load(conn)
        .await?;
    if let Some(cursor) = last_post_id {
        group_posts.retain(|p| p.post_id < cursor);
    }
    rank_newest_first(&mut group_posts);

    let mut summaries = Vec::new();
    for post in group_posts.into_iter().take(limit.max(0) as usize) {
        summaries.push(summarize_post(conn, viewer, &post).await?);
    }
    Ok(summaries)
}

/// Posts on a page timeline, keyset-paginated by post id.
pub async fn page_posts(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    page_id: i32,
    limit: i64,
    last_post_id: Option<i32>,
) -> StoreResult<Vec<PostSummary>> {
    let page_exists: i64 = pages::table
        .filter(pages::page_id.eq(page_id))
        .count()
        .get_result(conn)
        .await?;
    if page_exists == 0 {
        return Err(StoreError::NotFound("page"));
    }

    let post_ids: Vec<i32> = post_locations::table
        .filter(post_locations::location_type.eq(LocationType::PageTimeline.as_str()))
        .filter(post_locations::location_id.eq(page_id))
        .select(post_locations::post_id)
        .load(conn)
        .await?;

    let mut timeline: Vec<Post> = posts::table
        .filter(posts::post_id.eq_any(post_ids))
        .load(conn)
        .await?;
    if let Some(cursor) = last_post_id {
        timeline.retain(|p| p.post_id < cursor);
    }
    rank_newest_first(&mut timeline);

    let mut summaries = Vec::new();
    for post in timeline.into_iter().take(limit.max(0) as usize) {
        summaries.push(summarize_post(conn, viewer, &post).await?);
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post_at(post_id: i32, secs: u32) -> Post {
        Post {
            post_id,
            author_id: 1,
            author_type: "USER".to_string(),
            text_content: Some(format!("post {post_id}")),
            privacy_setting: "PUBLIC".to_string(),
            post_type: "ORIGINAL".to_string(),
            parent_post_id: None,
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, secs)
                .unwrap(),
        }
    }

    fn shared(post_id: i32) -> SharedPost {
        SharedPost {
            post_id,
            author_id: 1,
            author_name: None,
            author_avatar: None,
            text_content: None,
            post_type: "SHARE".to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            files: Vec::new(),
            shared_post: None,
        }
    }

    #[test]
    fn ranking_is_newest_first_with_id_tie_break() {
        let mut candidates = vec![post_at(3, 10), post_at(1, 20), post_at(2, 20)];
        rank_newest_first(&mut candidates);
        let order: Vec<i32> = candidates.iter().map(|p| p.post_id).collect();
        // same timestamp for 1 and 2: higher id wins the tie
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn ranking_is_deterministic() {
        let mut first = vec![post_at(5, 1), post_at(4, 1), post_at(9, 1), post_at(2, 3)];
        let mut second = vec![post_at(9, 1), post_at(2, 3), post_at(4, 1), post_at(5, 1)];
        rank_newest_first(&mut first);
        rank_newest_first(&mut second);
        let a: Vec<i32> = first.iter().map(|p| p.post_id).collect();
        let b: Vec<i32> = second.iter().map(|p| p.post_id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn nest_chain_embeds_one_level_at_a_time() {
        let nested = nest_chain(vec![shared(10), shared(5), shared(1)]).unwrap();
        assert_eq!(nested.post_id, 10);
        let level2 = nested.shared_post.as_ref().unwrap();
        assert_eq!(level2.post_id, 5);
        let level3 = level2.shared_post.as_ref().unwrap();
        assert_eq!(level3.post_id, 1);
        assert!(level3.shared_post.is_none());
    }

    #[test]
    fn nest_chain_of_empty_is_none() {
        assert!(nest_chain(Vec::new()).is_none());
    }
}
