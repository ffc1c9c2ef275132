use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        auth::auth_handler, blog::blog_handler, health::health_handler, tag::tag_handler,
        users::users_handler,
    },
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/health", health_handler())
        .nest("/auth", auth_handler(app_state.clone()))
        .nest("/tag", tag_handler(app_state.clone()))
        .nest("/users", users_handler(app_state.clone()))
        .nest("/blog", blog_handler(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new().nest("/api/v1", api_route)
}
