pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::build::handlers as books;
use crate::content::handlers as content;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Content API
        .route(
            "/api/v1/content/normalize",
            post(content::handle_normalize),
        )
        // Book API
        .route("/api/v1/books/estimate", post(books::handle_estimate))
        .route("/api/v1/books/build", post(books::handle_build))
        .with_state(state)
}
