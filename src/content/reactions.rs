// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Reaction toggle.
//!
//! One reaction per (reactor, target). Repeating the same reaction removes
//! it; a different reaction overwrites in place. The branch runs in one
//! transaction and the composite primary key turns a racing double-insert
//! into a clean Conflict.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::enums::{ReactableType, ReactionType};
use crate::models::reaction::{NewReaction, Reaction};
use crate::schema::reactions;

/// What a toggle call did.
#[derive(Debug)]
pub enum ReactionOutcome {
    Added(Reaction),
    Updated(Reaction),
    Removed,
}

/// Which branch a toggle should take. Pure, so the three-way decision is
/// testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Create,
    Remove,
    Update,
}

pub fn toggle_action(existing: Option<ReactionType>, requested: ReactionType) -> ToggleAction {
    match existing {
        None => ToggleAction::Create,
        Some(current) if current == requested => ToggleAction::Remove,
        Some(_) => ToggleAction::Update,
    }
}

/// Toggle a reaction on a target.
pub async fn react(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    reactable_id: i32,
    reactable_type: ReactableType,
    reaction_type: ReactionType,
) -> StoreResult<ReactionOutcome> {
    conn.transaction::<_, StoreError, _>(|conn| {
        async move {
            let key = (user_id, reactable_id, reactable_type.as_str());
            let existing = reactions::table
                .find(key)
                .first::<Reaction>(conn)
                .await
                .optional()?;
            let current = existing.as_ref().map(|r| r.kind()).transpose()?;

            match toggle_action(current, reaction_type) {
                ToggleAction::Create => {
                    let created = diesel::insert_into(reactions::table)
                        .values(&NewReaction {
                            reactor_user_id: user_id,
                            reactable_id,
                            reactable_type: reactable_type.as_str().to_string(),
                            reaction_type: reaction_type.as_str().to_string(),
                            created_at: Utc::now().naive_utc(),
                        })
                        .get_result::<Reaction>(conn)
                        .await?;
                    Ok(ReactionOutcome::Added(created))
                }
                ToggleAction::Remove => {
                    debug!(user_id, reactable_id, "reaction toggled off");
                    diesel::delete(reactions::table.find(key)).execute(conn).await?;
                    Ok(ReactionOutcome::Removed)
                }
                ToggleAction::Update => {
                    let updated = diesel::update(reactions::table.find(key))
                        .set(reactions::reaction_type.eq(reaction_type.as_str()))
                        .get_result::<Reaction>(conn)
                        .await?;
                    Ok(ReactionOutcome::Updated(updated))
                }
            }
        }
        .scope_boxed()
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_existing_reaction_creates() {
        assert_eq!(
            toggle_action(None, ReactionType::Like),
            ToggleAction::Create
        );
    }

    #[test]
    fn same_type_toggles_off() {
        assert_eq!(
            toggle_action(Some(ReactionType::Like), ReactionType::Like),
            ToggleAction::Remove
        );
    }

    #[test]
    fn different_type_overwrites_in_place() {
        assert_eq!(
            toggle_action(Some(ReactionType::Like), ReactionType::Love),
            ToggleAction::Update
        );
    }

    #[test]
    fn toggle_round_trip_returns_to_zero() {
        // like then like again: create followed by remove
        let first = toggle_action(None, ReactionType::Haha);
        assert_eq!(first, ToggleAction::Create);
        let second = toggle_action(Some(ReactionType::Haha), ReactionType::Haha);
        assert_eq!(second, ToggleAction::Remove);
    }
}
