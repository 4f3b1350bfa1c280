pub mod health;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::auth::{handlers as auth, middleware::require_auth};
use crate::generation::handlers as generation;
use crate::posts::handlers as posts;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Session required
    let protected = Router::new()
        .route("/api/userInfo", get(auth::handle_user_info))
        .route("/api/save-form", post(posts::handle_save_form))
        .route("/api/past-posts", post(posts::handle_save_past_post))
        .route("/api/liked-posts", post(posts::handle_save_liked_post))
        .route("/api/generate-post", post(posts::handle_save_generated_post))
        .route(
            "/api/generate-linkedin-post",
            post(generation::handle_generate_linkedin_post),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/register", post(auth::handle_register))
        .route("/api/login", post(auth::handle_login))
        .route("/api/logout", post(auth::handle_logout))
        .merge(protected)
        .with_state(state)
}
