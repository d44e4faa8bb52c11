// Copyright (c) SocialNet Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::allow_tables_to_appear_in_same_query;
use diesel::table;

table! {
    users (user_id) {
        user_id -> Integer,
        email -> Varchar,
        phone_number -> Nullable<Varchar>,
        password_hash -> Varchar,
        is_active -> Bool,
        last_login -> Nullable<Timestamp>,
        created_at -> Timestamp,
    }
}

table! {
    profiles (profile_id) {
        profile_id -> Integer,
        user_id -> Integer,
        first_name -> Varchar,
        last_name -> Varchar,
        profile_picture_url -> Nullable<Varchar>,
        cover_photo_url -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        date_of_birth -> Nullable<Date>,
        gender -> Nullable<Varchar>,
    }
}

// Friendship edges are stored canonically with user_one_id < user_two_id so
// the composite primary key guarantees at most one row per unordered pair.
table! {
    friendships (user_one_id, user_two_id) {
        user_one_id -> Integer,
        user_two_id -> Integer,
        status -> Varchar,
        action_user_id -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    groups (group_id) {
        group_id -> Integer,
        group_name -> Varchar,
        description -> Nullable<Text>,
        cover_photo_url -> Nullable<Varchar>,
        privacy_type -> Varchar,
        is_visible -> Bool,
        creator_user_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    group_memberships (user_id, group_id) {
        user_id -> Integer,
        group_id -> Integer,
        role -> Varchar,
        status -> Varchar,
        joined_at -> Timestamp,
    }
}

table! {
    membership_questions (question_id) {
        question_id -> Integer,
        group_id -> Integer,
        question_text -> Text,
        is_required -> Bool,
    }
}

table! {
    membership_answers (user_id, group_id, question_id) {
        user_id -> Integer,
        group_id -> Integer,
        question_id -> Integer,
        answer_text -> Text,
    }
}

table! {
    posts (post_id) {
        post_id -> Integer,
        author_id -> Integer,
        author_type -> Varchar,
        text_content -> Nullable<Text>,
        privacy_setting -> Varchar,
        post_type -> Varchar,
        parent_post_id -> Nullable<Integer>,
        created_at -> Timestamp,
    }
}

// One location per post: the post id alone is the key.
table! {
    post_locations (post_id) {
        post_id -> Integer,
        location_id -> Integer,
        location_type -> Varchar,
    }
}

table! {
    post_files (post_id, file_id) {
        post_id -> Integer,
        file_id -> Integer,
        display_order -> Integer,
    }
}

table! {
    files (file_id) {
        file_id -> Integer,
        uploader_user_id -> Integer,
        file_name -> Varchar,
        file_type -> Varchar,
        file_url -> Varchar,
        thumbnail_url -> Nullable<Varchar>,
        file_size -> Integer,
    }
}

// One reaction per user per target; the composite key doubles as the
// correctness backstop for the toggle race.
table! {
    reactions (reactor_user_id, reactable_id, reactable_type) {
        reactor_user_id -> Integer,
        reactable_id -> Integer,
        reactable_type -> Varchar,
        reaction_type -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    comments (comment_id) {
        comment_id -> Integer,
        commenter_user_id -> Integer,
        commentable_id -> Integer,
        commentable_type -> Varchar,
        parent_comment_id -> Nullable<Integer>,
        text_content -> Text,
        created_at -> Timestamp,
    }
}

table! {
    pages (page_id) {
        page_id -> Integer,
        page_name -> Varchar,
        description -> Nullable<Text>,
        avatar_url -> Nullable<Varchar>,
        creator_user_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    page_follows (user_id, page_id) {
        user_id -> Integer,
        page_id -> Integer,
        followed_at -> Timestamp,
    }
}

table! {
    page_roles (user_id, page_id) {
        user_id -> Integer,
        page_id -> Integer,
        role -> Varchar,
    }
}

// Allow joining the tables if needed
allow_tables_to_appear_in_same_query!(
    users,
    profiles,
    friendships,
    groups,
    group_memberships,
    membership_questions,
    membership_answers,
    posts,
    post_locations,
    post_files,
    files,
    reactions,
    comments,
    pages,
    page_follows,
    page_roles,
);
