use crate::{
    AppState,
    dtos::{FilterLikeDto, LikeDto, Response},
    error::HttpError,
    middleware::{JWTAuthMiddleware, auth},
    service,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, post},
};
use tracing::instrument;

/// Router for like endpoints nested under /blog/{id}/like
pub fn like_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_like)
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        .route(
            "/{like_id}",
            delete(delete_like)
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
}

#[instrument(skip(app_state, auth, body), fields(caller = %auth.identity.email))]
pub async fn create_like(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(article_id): Path<i64>,
    Json(body): Json<LikeDto>,
) -> Result<impl IntoResponse, HttpError> {
    let like =
        service::like::create_like(&app_state.db_client, &auth.identity, article_id, &body).await?;

    tracing::info!(like_id = like.id, article_id, "Like created");
    Ok(Response::created("Successfully Like Blog", FilterLikeDto::filter_like(&like)))
}

#[instrument(skip(app_state, auth), fields(caller = %auth.identity.email))]
pub async fn delete_like(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path((article_id, like_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, HttpError> {
    service::like::delete_like(&app_state.db_client, &auth.identity, article_id, like_id).await?;

    tracing::info!(like_id, article_id, "Like deleted");
    Ok(Response::ok("Successfully Unlike Blog", like_id))
}
