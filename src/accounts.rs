// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

//! Account registration and profile views.
//!
//! Registration creates the user row, then attempts the profile insert
//! best-effort: a profile failure is logged and swallowed so the account
//! itself survives. This is a deliberate exception to the all-or-nothing
//! rule used everywhere else.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::graph::relationships;
use crate::models::enums::PairStatus;
use crate::models::user::{NewProfile, NewUser, Profile, UpdateProfile, User};
use crate::schema::{profiles, users};

/// Registration input. Credential hashing happens upstream; the core only
/// stores the supplied hash.
#[derive(Debug, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Profile view with friendship status; private fields only for the owner.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub friendship_status: PairStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

pub async fn load_user(conn: &mut AsyncPgConnection, user_id: i32) -> StoreResult<User> {
    users::table
        .find(user_id)
        .first::<User>(conn)
        .await
        .optional()?
        .ok_or(StoreError::NotFound("user"))
}

/// Register a new account. The email must be unique; the profile insert is
/// best-effort.
pub async fn register(conn: &mut AsyncPgConnection, account: NewAccount) -> StoreResult<User> {
    let email = account.email.trim().to_string();
    if email.is_empty() {
        return Err(StoreError::validation("email must not be empty"));
    }

    let existing: i64 = users::table
        .filter(users::email.eq(&email))
        .count()
        .get_result(conn)
        .await?;
    if existing > 0 {
        return Err(StoreError::conflict("email already registered"));
    }

    let user = diesel::insert_into(users::table)
        .values(&NewUser {
            email,
            phone_number: account.phone_number,
            password_hash: account.password_hash,
            is_active: true,
            created_at: Utc::now().naive_utc(),
        })
        .get_result::<User>(conn)
        .await?;

    // Best-effort secondary write: the account survives a profile failure.
    let profile_result = diesel::insert_into(profiles::table)
        .values(&NewProfile {
            user_id: user.user_id,
            first_name: account.first_name.unwrap_or_default(),
            last_name: account.last_name.unwrap_or_default(),
            profile_picture_url: None,
            cover_photo_url: None,
            bio: None,
            date_of_birth: None,
            gender: None,
        })
        .execute(conn)
        .await;
    if let Err(e) = profile_result {
        warn!(user_id = user.user_id, error = %e, "profile creation failed; account kept");
    }

    Ok(user)
}

/// Record a successful login.
pub async fn touch_last_login(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> StoreResult<NaiveDateTime> {
    let now = Utc::now().naive_utc();
    diesel::update(users::table.find(user_id))
        .set(users::last_login.eq(now))
        .execute(conn)
        .await?;
    Ok(now)
}

/// Profile as seen by `viewer`. Email, phone and date of birth are shown
/// only to the owner.
pub async fn profile_view(
    conn: &mut AsyncPgConnection,
    viewer: Option<i32>,
    user_id: i32,
) -> StoreResult<ProfileView> {
    let user = load_user(conn, user_id).await?;
    let profile = profiles::table
        .filter(profiles::user_id.eq(user_id))
        .first::<Profile>(conn)
        .await
        .optional()?;
    let friendship_status = relationships::status(conn, viewer, user_id).await?;

    let show_private = viewer == Some(user_id);
    Ok(ProfileView {
        user_id: user.user_id,
        first_name: profile
            .as_ref()
            .map(|p| p.first_name.clone())
            .unwrap_or_default(),
        last_name: profile
            .as_ref()
            .map(|p| p.last_name.clone())
            .unwrap_or_default(),
        avatar_url: profile.as_ref().and_then(|p| p.profile_picture_url.clone()),
        cover_photo_url: profile.as_ref().and_then(|p| p.cover_photo_url.clone()),
        bio: profile.as_ref().and_then(|p| p.bio.clone()),
        gender: profile.as_ref().and_then(|p| p.gender.clone()),
        friendship_status,
        email: show_private.then_some(user.email),
        phone_number: if show_private { user.phone_number } else { None },
        date_of_birth: if show_private {
            profile.and_then(|p| p.date_of_birth)
        } else {
            None
        },
    })
}

/// Apply an explicit per-field profile update for the owner.
pub async fn update_profile(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    update: UpdateProfile,
) -> StoreResult<Profile> {
    diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
        .set(&update)
        .get_result::<Profile>(conn)
        .await
        .optional()?
        .ok_or(StoreError::NotFound("profile"))
}
