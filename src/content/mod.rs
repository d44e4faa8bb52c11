// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

pub mod comments;
pub mod posts;
pub mod reactions;
