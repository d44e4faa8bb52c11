mod handlers;
pub mod routes;

use crate::config::Config;
use crate::db::Database;
use anyhow::Result;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Start the API server
pub async fn start_api_server(db: Arc<Database>) -> Result<()> {
    let config = Config::get();

    // Set up CORS
    let cors = if config.api.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    // Create router with all routes
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Account routes
        .route("/api/auth/register", post(handlers::users::register))
        .route("/api/users/me", put(handlers::users::update_profile))
        .route("/api/users/suggestions", get(handlers::users::suggestions))
        .route("/api/users/:id", get(handlers::users::get_profile))
        .route("/api/users/:id/posts", get(handlers::users::user_posts))
        .route("/api/users/:id/friends", get(handlers::users::user_friends))
        // Friendship routes
        .route("/api/friends", get(handlers::friends::list_friends))
        .route("/api/friends/requests", get(handlers::friends::incoming_requests))
        .route(
            "/api/friends/:target_id",
            post(handlers::friends::send_request).delete(handlers::friends::unfriend),
        )
        .route("/api/friends/:target_id/accept", put(handlers::friends::accept_request))
        .route("/api/friends/:target_id/reject", delete(handlers::friends::reject_request))
        .route("/api/friends/:target_id/cancel", delete(handlers::friends::cancel_request))
        .route(
            "/api/friends/:target_id/block",
            post(handlers::friends::block_user).delete(handlers::friends::unblock_user),
        )
        .route("/api/friends/:target_id/status", get(handlers::friends::friendship_status))
        // Feed and post routes
        .route("/api/feed", get(handlers::posts::get_feed))
        .route("/api/posts", post(handlers::posts::create_post))
        .route("/api/posts/:id", get(handlers::posts::get_post))
        .route("/api/posts/:id/share", post(handlers::posts::share_post))
        // Group routes
        .route("/api/groups", post(handlers::groups::create_group))
        .route("/api/groups/:id", get(handlers::groups::group_detail))
        .route("/api/groups/:id/questions", get(handlers::groups::group_questions))
        .route("/api/groups/:id/join", post(handlers::groups::join_group))
        .route("/api/groups/:id/leave", delete(handlers::groups::leave_group))
        .route("/api/groups/:id/feed", get(handlers::groups::group_feed))
        .route("/api/groups/:id/members", get(handlers::groups::group_members))
        .route(
            "/api/groups/:id/members/:user_id",
            put(handlers::groups::update_member),
        )
        .route(
            "/api/groups/:id/members/:user_id/approve",
            post(handlers::groups::approve_member),
        )
        .route(
            "/api/groups/:id/members/:user_id/reject",
            post(handlers::groups::reject_member),
        )
        .route(
            "/api/groups/:id/members/:user_id/ban",
            post(handlers::groups::ban_member),
        )
        .route(
            "/api/groups/:id/members/:user_id/unban",
            post(handlers::groups::unban_member),
        )
        .route(
            "/api/groups/:id/invite/:user_id",
            post(handlers::groups::invite_member),
        )
        .route(
            "/api/groups/:id/pending-requests",
            get(handlers::groups::pending_requests),
        )
        // Page routes
        .route("/api/pages", post(handlers::pages::create_page))
        .route("/api/pages/:id", get(handlers::pages::page_detail))
        .route(
            "/api/pages/:id/follow",
            post(handlers::pages::follow_page).delete(handlers::pages::unfollow_page),
        )
        .route("/api/pages/:id/posts", get(handlers::pages::page_posts))
        .route("/api/pages/:id/roles", post(handlers::pages::assign_role))
        // Reaction and comment routes
        .route("/api/reactions", post(handlers::reactions::react))
        .route(
            "/api/comments",
            post(handlers::reactions::create_comment).get(handlers::reactions::list_comments),
        )
        // Add state and middleware
        .with_state(db.get_pool().clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Get bind address
    let addr = format!("{}:{}", config.api.host, config.api.port).parse::<SocketAddr>()?;

    // Start server
    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
