// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::models::enums::{ReactableType, ReactionType};
use crate::schema::reactions;

/// One reaction per (reactor, target); the type is mutable via toggle.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = reactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Reaction {
    pub reactor_user_id: i32,
    pub reactable_id: i32,
    pub reactable_type: String,
    pub reaction_type: String,
    pub created_at: NaiveDateTime,
}

impl Reaction {
    pub fn target_type(&self) -> StoreResult<ReactableType> {
        self.reactable_type.parse()
    }

    pub fn kind(&self) -> StoreResult<ReactionType> {
        self.reaction_type.parse()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewReaction {
    pub reactor_user_id: i32,
    pub reactable_id: i32,
    pub reactable_type: String,
    pub reaction_type: String,
    pub created_at: NaiveDateTime,
}
