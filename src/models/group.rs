// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::models::enums::{GroupPrivacy, GroupRole, MemberStatus};
use crate::schema::{group_memberships, groups, membership_answers, membership_questions};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Group {
    pub group_id: i32,
    pub group_name: String,
    pub description: Option<String>,
    pub cover_photo_url: Option<String>,
    pub privacy_type: String,
    pub is_visible: bool,
    pub creator_user_id: i32,
    pub created_at: NaiveDateTime,
}

impl Group {
    pub fn privacy(&self) -> StoreResult<GroupPrivacy> {
        self.privacy_type.parse()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewGroup {
    pub group_name: String,
    pub description: Option<String>,
    pub cover_photo_url: Option<String>,
    pub privacy_type: String,
    pub is_visible: bool,
    pub creator_user_id: i32,
    pub created_at: NaiveDateTime,
}

/// One row per (user, group). Role and status are independent axes: a BANNED
/// row keeps its last role value, which is irrelevant while banned.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = group_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupMembership {
    pub user_id: i32,
    pub group_id: i32,
    pub role: String,
    pub status: String,
    pub joined_at: NaiveDateTime,
}

impl GroupMembership {
    pub fn member_role(&self) -> StoreResult<GroupRole> {
        self.role.parse()
    }

    pub fn member_status(&self) -> StoreResult<MemberStatus> {
        self.status.parse()
    }

    pub fn is_banned(&self) -> StoreResult<bool> {
        Ok(self.member_status()? == MemberStatus::Banned)
    }

    /// Workflow calls (approve, reject, ban, unban, invite, member updates)
    /// require the caller to hold a JOINED membership with a moderating role.
    pub fn check_moderator(&self) -> StoreResult<GroupRole> {
        let role = self.member_role()?;
        if self.member_status()? != MemberStatus::Joined || !role.can_moderate() {
            return Err(StoreError::forbidden(
                "requires an admin or moderator membership in this group",
            ));
        }
        Ok(role)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = group_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewGroupMembership {
    pub user_id: i32,
    pub group_id: i32,
    pub role: String,
    pub status: String,
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = membership_questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipQuestion {
    pub question_id: i32,
    pub group_id: i32,
    pub question_text: String,
    pub is_required: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = membership_questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewMembershipQuestion {
    pub group_id: i32,
    pub question_text: String,
    pub is_required: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = membership_answers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipAnswer {
    pub user_id: i32,
    pub group_id: i32,
    pub question_id: i32,
    pub answer_text: String,
}

/// Answer submitted with a join request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmittedAnswer {
    pub question_id: i32,
    pub answer_text: String,
}

/// Where a join request lands, given the caller's current standing and the
/// group's privacy. BANNED users are refused outright; existing members get
/// Conflict; a still-PENDING request may be re-submitted.
pub fn decide_join_status(
    existing: Option<MemberStatus>,
    privacy: GroupPrivacy,
) -> StoreResult<MemberStatus> {
    match existing {
        Some(MemberStatus::Banned) => {
            return Err(StoreError::forbidden("you are banned from this group"))
        }
        Some(MemberStatus::Joined) => {
            return Err(StoreError::conflict("already a member of this group"))
        }
        Some(MemberStatus::Pending) | None => {}
    }
    Ok(match privacy {
        GroupPrivacy::Public => MemberStatus::Joined,
        GroupPrivacy::Private => MemberStatus::Pending,
    })
}

/// Every required question must have a matching answer before a join request
/// enters the workflow. The error names the first unanswered question.
pub fn check_required_answers(
    questions: &[MembershipQuestion],
    answers: &[SubmittedAnswer],
) -> StoreResult<()> {
    for question in questions.iter().filter(|q| q.is_required) {
        if !answers.iter().any(|a| a.question_id == question.question_id) {
            return Err(StoreError::validation(format!(
                "question '{}' is required",
                question.question_text
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn membership(role: &str, status: &str) -> GroupMembership {
        GroupMembership {
            user_id: 1,
            group_id: 10,
            role: role.to_string(),
            status: status.to_string(),
            joined_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    fn question(id: i32, text: &str, required: bool) -> MembershipQuestion {
        MembershipQuestion {
            question_id: id,
            group_id: 10,
            question_text: text.to_string(),
            is_required: required,
        }
    }

    fn answer(question_id: i32) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            answer_text: "because".to_string(),
        }
    }

    #[test]
    fn moderator_check_rejects_members_and_pending_roles() {
        assert!(membership("ADMIN", "JOINED").check_moderator().is_ok());
        assert!(membership("MODERATOR", "JOINED").check_moderator().is_ok());
        assert!(membership("MEMBER", "JOINED").check_moderator().is_err());
        // a moderating role that has not joined yet carries no authority
        assert!(membership("ADMIN", "PENDING").check_moderator().is_err());
    }

    #[test]
    fn banned_role_is_irrelevant() {
        let banned_admin = membership("ADMIN", "BANNED");
        assert!(banned_admin.is_banned().unwrap());
        assert!(banned_admin.check_moderator().is_err());
    }

    #[test]
    fn banned_users_cannot_rejoin() {
        let err = decide_join_status(Some(MemberStatus::Banned), GroupPrivacy::Public).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[test]
    fn join_lands_on_group_privacy() {
        assert_eq!(
            decide_join_status(None, GroupPrivacy::Public).unwrap(),
            MemberStatus::Joined
        );
        assert_eq!(
            decide_join_status(None, GroupPrivacy::Private).unwrap(),
            MemberStatus::Pending
        );
        // a repeated request while pending stays in the workflow
        assert_eq!(
            decide_join_status(Some(MemberStatus::Pending), GroupPrivacy::Private).unwrap(),
            MemberStatus::Pending
        );
        assert!(matches!(
            decide_join_status(Some(MemberStatus::Joined), GroupPrivacy::Public),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn required_answers_must_be_present() {
        let questions = vec![
            question(1, "Why do you want to join?", true),
            question(2, "Where did you hear about us?", false),
        ];
        assert!(check_required_answers(&questions, &[answer(1)]).is_ok());
        // optional questions may be ignored
        assert!(check_required_answers(&questions, &[answer(1), answer(2)]).is_ok());

        let err = check_required_answers(&questions, &[answer(2)]).unwrap_err();
        match err {
            StoreError::Validation(msg) => assert!(msg.contains("Why do you want to join?")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
