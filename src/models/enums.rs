// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Closed variants for the enum-like text columns.
//!
//! Every column value loaded from the store is parsed through these types;
//! an unknown stored value is a `Validation` error, never a silent default.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::StoreError;

/// Lifecycle state of a friendship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipState {
    Pending,
    Accepted,
    Blocked,
}

impl FriendshipState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipState::Pending => "PENDING",
            FriendshipState::Accepted => "ACCEPTED",
            FriendshipState::Blocked => "BLOCKED",
        }
    }
}

impl FromStr for FriendshipState {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "PENDING" => Ok(FriendshipState::Pending),
            "ACCEPTED" => Ok(FriendshipState::Accepted),
            "BLOCKED" => Ok(FriendshipState::Blocked),
            other => Err(StoreError::validation(format!(
                "unknown friendship status '{other}'"
            ))),
        }
    }
}

/// Relationship between a viewer and another user, as seen from a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairStatus {
    None,
    #[serde(rename = "SELF")]
    Own,
    Pending,
    Accepted,
    Blocked,
}

impl PairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairStatus::None => "NONE",
            PairStatus::Own => "SELF",
            PairStatus::Pending => "PENDING",
            PairStatus::Accepted => "ACCEPTED",
            PairStatus::Blocked => "BLOCKED",
        }
    }
}

impl From<FriendshipState> for PairStatus {
    fn from(state: FriendshipState) -> Self {
        match state {
            FriendshipState::Pending => PairStatus::Pending,
            FriendshipState::Accepted => PairStatus::Accepted,
            FriendshipState::Blocked => PairStatus::Blocked,
        }
    }
}

/// Member role inside a group. Role and status are independent axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupRole {
    Admin,
    Moderator,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Admin => "ADMIN",
            GroupRole::Moderator => "MODERATOR",
            GroupRole::Member => "MEMBER",
        }
    }

    /// Whether this role can run the membership workflow (approve, reject,
    /// ban, invite, status changes).
    pub fn can_moderate(&self) -> bool {
        matches!(self, GroupRole::Admin | GroupRole::Moderator)
    }
}

impl FromStr for GroupRole {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "ADMIN" => Ok(GroupRole::Admin),
            "MODERATOR" => Ok(GroupRole::Moderator),
            "MEMBER" => Ok(GroupRole::Member),
            other => Err(StoreError::validation(format!(
                "unknown group role '{other}'"
            ))),
        }
    }
}

/// Membership status inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Pending,
    Joined,
    Banned,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "PENDING",
            MemberStatus::Joined => "JOINED",
            MemberStatus::Banned => "BANNED",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "PENDING" => Ok(MemberStatus::Pending),
            "JOINED" => Ok(MemberStatus::Joined),
            "BANNED" => Ok(MemberStatus::Banned),
            other => Err(StoreError::validation(format!(
                "unknown membership status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupPrivacy {
    Public,
    Private,
}

impl GroupPrivacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupPrivacy::Public => "PUBLIC",
            GroupPrivacy::Private => "PRIVATE",
        }
    }
}

impl FromStr for GroupPrivacy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "PUBLIC" => Ok(GroupPrivacy::Public),
            "PRIVATE" => Ok(GroupPrivacy::Private),
            other => Err(StoreError::validation(format!(
                "unknown group privacy '{other}'"
            ))),
        }
    }
}

/// Audience of a post on a user timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivacySetting {
    Public,
    Friends,
    OnlyMe,
}

impl PrivacySetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacySetting::Public => "PUBLIC",
            PrivacySetting::Friends => "FRIENDS",
            PrivacySetting::OnlyMe => "ONLY_ME",
        }
    }
}

impl FromStr for PrivacySetting {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "PUBLIC" => Ok(PrivacySetting::Public),
            "FRIENDS" => Ok(PrivacySetting::Friends),
            "ONLY_ME" => Ok(PrivacySetting::OnlyMe),
            other => Err(StoreError::validation(format!(
                "unknown privacy setting '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostType {
    Original,
    Share,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Original => "ORIGINAL",
            PostType::Share => "SHARE",
        }
    }
}

impl FromStr for PostType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "ORIGINAL" => Ok(PostType::Original),
            "SHARE" => Ok(PostType::Share),
            other => Err(StoreError::validation(format!(
                "unknown post type '{other}'"
            ))),
        }
    }
}

/// Who a post is attributed to: a user, or a page (for page-timeline posts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorType {
    User,
    Page,
}

impl AuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorType::User => "USER",
            AuthorType::Page => "PAGE",
        }
    }
}

impl FromStr for AuthorType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "USER" => Ok(AuthorType::User),
            "PAGE" => Ok(AuthorType::Page),
            other => Err(StoreError::validation(format!(
                "unknown author type '{other}'"
            ))),
        }
    }
}

/// Container a post is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    UserTimeline,
    Group,
    PageTimeline,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::UserTimeline => "USER_TIMELINE",
            LocationType::Group => "GROUP",
            LocationType::PageTimeline => "PAGE_TIMELINE",
        }
    }
}

impl FromStr for LocationType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "USER_TIMELINE" => Ok(LocationType::UserTimeline),
            "GROUP" => Ok(LocationType::Group),
            "PAGE_TIMELINE" => Ok(LocationType::PageTimeline),
            other => Err(StoreError::validation(format!(
                "unknown location type '{other}'"
            ))),
        }
    }
}

/// Kind of entity a reaction is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactableType {
    Post,
    Comment,
    File,
}

impl ReactableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactableType::Post => "POST",
            ReactableType::Comment => "COMMENT",
            ReactableType::File => "FILE",
        }
    }
}

impl FromStr for ReactableType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "POST" => Ok(ReactableType::Post),
            "COMMENT" => Ok(ReactableType::Comment),
            "FILE" => Ok(ReactableType::File),
            other => Err(StoreError::validation(format!(
                "unknown reactable type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionType {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "LIKE",
            ReactionType::Love => "LOVE",
            ReactionType::Haha => "HAHA",
            ReactionType::Wow => "WOW",
            ReactionType::Sad => "SAD",
            ReactionType::Angry => "ANGRY",
        }
    }
}

impl FromStr for ReactionType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "LIKE" => Ok(ReactionType::Like),
            "LOVE" => Ok(ReactionType::Love),
            "HAHA" => Ok(ReactionType::Haha),
            "WOW" => Ok(ReactionType::Wow),
            "SAD" => Ok(ReactionType::Sad),
            "ANGRY" => Ok(ReactionType::Angry),
            other => Err(StoreError::validation(format!(
                "unknown reaction type '{other}'"
            ))),
        }
    }
}

/// Kind of entity a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentableType {
    Post,
    File,
}

impl CommentableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentableType::Post => "POST",
            CommentableType::File => "FILE",
        }
    }
}

impl FromStr for CommentableType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "POST" => Ok(CommentableType::Post),
            "FILE" => Ok(CommentableType::File),
            other => Err(StoreError::validation(format!(
                "unknown commentable type '{other}'"
            ))),
        }
    }
}

/// Display classification of an attached file, derived from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    Image,
    Video,
    File,
}

impl FileKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            FileKind::Image
        } else if mime.starts_with("video/") {
            FileKind::Video
        } else {
            FileKind::File
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_round_trips() {
        for s in ["PENDING", "ACCEPTED", "BLOCKED"] {
            assert_eq!(s.parse::<FriendshipState>().unwrap().as_str(), s);
        }
        for s in ["PUBLIC", "FRIENDS", "ONLY_ME"] {
            assert_eq!(s.parse::<PrivacySetting>().unwrap().as_str(), s);
        }
        for s in ["USER_TIMELINE", "GROUP", "PAGE_TIMELINE"] {
            assert_eq!(s.parse::<LocationType>().unwrap().as_str(), s);
        }
        for s in ["ADMIN", "MODERATOR", "MEMBER"] {
            assert_eq!(s.parse::<GroupRole>().unwrap().as_str(), s);
        }
    }

    #[test]
    fn unknown_values_are_validation_errors() {
        assert!(matches!(
            "FRENEMY".parse::<FriendshipState>(),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            "SECRET".parse::<PrivacySetting>(),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            "OWNER".parse::<GroupRole>(),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn moderation_rights() {
        assert!(GroupRole::Admin.can_moderate());
        assert!(GroupRole::Moderator.can_moderate());
        assert!(!GroupRole::Member.can_moderate());
    }

    #[test]
    fn file_kind_from_mime_prefix() {
        assert_eq!(FileKind::from_mime("image/png"), FileKind::Image);
        assert_eq!(FileKind::from_mime("video/mp4"), FileKind::Video);
        assert_eq!(FileKind::from_mime("application/pdf"), FileKind::File);
        assert_eq!(FileKind::from_mime(""), FileKind::File);
    }
}
