// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

pub mod membership;
pub mod pages;
pub mod relationships;
