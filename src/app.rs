use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/businesses",
            get(handlers::search_businesses).post(handlers::create_business),
        )
        .route(
            "/api/businesses/:id",
            get(handlers::get_business)
                .put(handlers::update_business)
                .delete(handlers::delete_business),
        )
        .route("/api/businesses/:id/restore", post(handlers::restore_business))
        .route(
            "/api/businesses/:id/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .route(
            "/api/reviews/:id",
            put(handlers::update_review).delete(handlers::delete_review),
        )
        .route("/api/reviews/:id/like", post(handlers::like_review))
        .route("/api/reviews/:id/comments", post(handlers::comment_review))
        .route(
            "/api/deals",
            get(handlers::list_deals).post(handlers::create_deal),
        )
        .route(
            "/api/deals/:id",
            put(handlers::update_deal).delete(handlers::delete_deal),
        )
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/profiles/:user", get(handlers::get_profile))
        .route(
            "/api/profiles/:user/favorites/:id",
            post(handlers::toggle_favorite),
        )
        .route("/api/profiles/:user/history/:id", post(handlers::record_view))
        .route("/api/profiles/:user/categories", put(handlers::set_categories))
        .route("/api/recommendations", get(handlers::recommendations))
        .route("/api/chat", post(handlers::chat))
        .route("/api/reset", post(handlers::reset))
        .with_state(state)
}
