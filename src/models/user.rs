// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{profiles, users};

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub user_id: i32,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Profile owned by a user, created alongside the account.
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub profile_id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

impl Profile {
    /// "First Last", or None when both parts are empty.
    pub fn display_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewProfile {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

/// Explicit per-field profile update; absent fields are left untouched.
#[derive(Debug, Default, AsChangeset, Deserialize)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: &str, last: &str) -> Profile {
        Profile {
            profile_id: 1,
            user_id: 1,
            first_name: first.to_string(),
            last_name: last.to_string(),
            profile_picture_url: None,
            cover_photo_url: None,
            bio: None,
            date_of_birth: None,
            gender: None,
        }
    }

    #[test]
    fn display_name_joins_and_trims() {
        assert_eq!(profile("Ada", "Lovelace").display_name().unwrap(), "Ada Lovelace");
        assert_eq!(profile("Ada", "").display_name().unwrap(), "Ada");
        assert_eq!(profile("", "").display_name(), None);
    }
}
