// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

pub mod friends;
pub mod groups;
pub mod health;
pub mod metrics;
pub mod pages;
pub mod posts;
pub mod reactions;
pub mod users;
