// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failure kinds surfaced by the core stores and resolvers.
///
/// The HTTP layer maps these onto status codes; everything below the
/// `Database`/`Pool` variants is a caller-visible rule violation with enough
/// context to render a user-facing message.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity, edge or membership row is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate edge, duplicate natural key under race, already-member.
    #[error("{0}")]
    Conflict(String),

    /// Role/ownership check failed, banned user, self-action forbidden.
    #[error("{0}")]
    Forbidden(String),

    /// Missing required membership answer, malformed enum value, empty post.
    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        StoreError::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::NotFound => StoreError::NotFound("record"),
            // Natural-key uniqueness is the race backstop for friendship
            // edges and reactions; the losing insert surfaces as Conflict.
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
