// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, IntCounter, TextEncoder};

pub static FRIEND_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "socialnet_friend_requests_total",
        "Friend requests created"
    )
    .expect("metric can be registered")
});

pub static GROUP_JOINS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "socialnet_group_joins_total",
        "Group join requests accepted into the workflow"
    )
    .expect("metric can be registered")
});

pub static POSTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("socialnet_posts_created_total", "Posts created")
        .expect("metric can be registered")
});

pub static REACTIONS_TOGGLED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "socialnet_reactions_toggled_total",
        "Reaction toggle calls applied"
    )
    .expect("metric can be registered")
});

pub static FEED_BUILDS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("socialnet_feed_builds_total", "Home feeds assembled")
        .expect("metric can be registered")
});

/// Render all registered metrics in the Prometheus text format.
pub fn render() -> prometheus::Result<String> {
    TextEncoder::new().encode_to_string(&prometheus::gather())
}
