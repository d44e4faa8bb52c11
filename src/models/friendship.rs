// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::models::enums::FriendshipState;
use crate::schema::friendships;

/// Undirected friendship edge with directional workflow metadata.
///
/// `action_user_id` records who last changed the state: the requester while
/// PENDING, the blocking actor for BLOCKED. The transition checks below are
/// pure so the state machine can be exercised without a database.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Friendship {
    pub user_one_id: i32,
    pub user_two_id: i32,
    pub status: String,
    pub action_user_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFriendship {
    pub user_one_id: i32,
    pub user_two_id: i32,
    pub status: String,
    pub action_user_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Store a pair with the smaller id first so the composite key is unique
/// regardless of who initiated.
pub fn canonical_pair(a: i32, b: i32) -> (i32, i32) {
    (a.min(b), a.max(b))
}

impl Friendship {
    pub fn state(&self) -> StoreResult<FriendshipState> {
        self.status.parse()
    }

    /// The user on the other side of the edge.
    pub fn other_user(&self, user_id: i32) -> i32 {
        if self.user_one_id == user_id {
            self.user_two_id
        } else {
            self.user_one_id
        }
    }

    /// True when `user_id` is the one who last acted on the edge (the
    /// requester while the edge is PENDING).
    pub fn is_actor(&self, user_id: i32) -> bool {
        self.action_user_id == user_id
    }

    fn ensure_pending(&self) -> StoreResult<FriendshipState> {
        let state = self.state()?;
        if state != FriendshipState::Pending {
            return Err(StoreError::conflict("friend request is not pending"));
        }
        Ok(state)
    }

    /// Accept requires a PENDING edge where the viewer is the recipient.
    pub fn check_accept(&self, viewer: i32) -> StoreResult<()> {
        self.ensure_pending()?;
        if self.is_actor(viewer) {
            return Err(StoreError::forbidden("cannot accept your own friend request"));
        }
        Ok(())
    }

    /// Reject requires a PENDING edge where the viewer is the recipient.
    pub fn check_reject(&self, viewer: i32) -> StoreResult<()> {
        self.ensure_pending()?;
        if self.is_actor(viewer) {
            return Err(StoreError::forbidden("cannot reject your own friend request"));
        }
        Ok(())
    }

    /// Cancel requires a PENDING edge where the viewer is the requester.
    pub fn check_cancel(&self, viewer: i32) -> StoreResult<()> {
        self.ensure_pending()?;
        if !self.is_actor(viewer) {
            return Err(StoreError::forbidden(
                "only the requester can cancel a friend request",
            ));
        }
        Ok(())
    }

    /// Unfriend deletes an ACCEPTED edge unconditionally for either party.
    pub fn check_unfriend(&self) -> StoreResult<()> {
        if self.state()? != FriendshipState::Accepted {
            return Err(StoreError::NotFound("friendship"));
        }
        Ok(())
    }

    /// Unblock deletes the edge only while it is BLOCKED.
    pub fn check_unblock(&self) -> StoreResult<()> {
        if self.state()? != FriendshipState::Blocked {
            return Err(StoreError::NotFound("block"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn edge(status: &str, action_user_id: i32) -> Friendship {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Friendship {
            user_one_id: 1,
            user_two_id: 2,
            status: status.to_string(),
            action_user_id,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn canonical_pair_orders_ids() {
        assert_eq!(canonical_pair(7, 3), (3, 7));
        assert_eq!(canonical_pair(3, 7), (3, 7));
    }

    #[test]
    fn recipient_may_accept_requester_may_not() {
        let pending = edge("PENDING", 1);
        assert!(pending.check_accept(2).is_ok());
        assert!(matches!(
            pending.check_accept(1),
            Err(StoreError::Forbidden(_))
        ));
    }

    #[test]
    fn accept_fails_when_not_pending() {
        let accepted = edge("ACCEPTED", 2);
        assert!(matches!(
            accepted.check_accept(1),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn reject_and_cancel_distinguish_actor() {
        let pending = edge("PENDING", 1);
        // user 2 is the recipient: may reject, may not cancel
        assert!(pending.check_reject(2).is_ok());
        assert!(matches!(
            pending.check_cancel(2),
            Err(StoreError::Forbidden(_))
        ));
        // user 1 is the requester: may cancel, may not reject
        assert!(pending.check_cancel(1).is_ok());
        assert!(matches!(
            pending.check_reject(1),
            Err(StoreError::Forbidden(_))
        ));
    }

    #[test]
    fn unblock_requires_blocked_state() {
        assert!(edge("BLOCKED", 1).check_unblock().is_ok());
        assert!(matches!(
            edge("ACCEPTED", 1).check_unblock(),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_state_is_a_validation_error() {
        assert!(matches!(
            edge("BESTIES", 1).check_accept(2),
            Err(StoreError::Validation(_))
        ));
    }
}
