pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::RouterState;

/// JSON routes under `/api`; write routes are rate limited per client.
pub fn build_api_router(state: RouterState) -> Router<RouterState> {
    let writes = Router::new()
        .route("/api/postblog", post(handlers::create_post))
        .route("/api/postcontact", post(handlers::submit_contact))
        .layer(axum_middleware::from_fn_with_state(
            state.api.clone(),
            middleware::api_rate_limit,
        ));

    Router::new()
        .route("/api/blogs", get(handlers::list_posts))
        .route("/api/getblog", get(handlers::get_post))
        .route("/api/blogs-paginated", get(handlers::list_posts_paginated))
        .merge(writes)
        .method_not_allowed_fallback(handlers::method_not_allowed)
}
