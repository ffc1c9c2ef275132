use crate::{
    AppState,
    dtos::{FilterTagDto, ListQueryDto, Response, TagDto},
    error::HttpError,
    middleware::{JWTAuthMiddleware, auth, role_check},
    models::Role,
    service,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tracing::instrument;

/// Every tag route needs a token; changes need a Superadmin.
pub fn tag_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_tags).route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        .route(
            "/",
            post(create_tag)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Role::Superadmin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        .route(
            "/{id}",
            put(update_tag)
                .delete(delete_tag)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Role::Superadmin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_tags(
    State(app_state): State<AppState>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (tags, meta) = service::tag::list_tags(&app_state.db_client, &query).await?;

    Ok(Response::ok("Successfully Get All Tags", FilterTagDto::filter_tags(&tags)).with_meta(meta))
}

#[instrument(skip(app_state, auth, body), fields(name = %body.name))]
pub async fn create_tag(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<TagDto>,
) -> Result<impl IntoResponse, HttpError> {
    let tag = service::tag::create_tag(&app_state.db_client, &auth.identity, &body).await?;

    tracing::info!(tag_id = tag.id, "Tag created");
    Ok(Response::created("Successfully Create Tag", FilterTagDto::filter_tag(&tag)))
}

#[instrument(skip(app_state, auth, body))]
pub async fn update_tag(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(id): Path<i64>,
    Json(body): Json<TagDto>,
) -> Result<impl IntoResponse, HttpError> {
    let tag = service::tag::update_tag(&app_state.db_client, &auth.identity, id, &body).await?;

    Ok(Response::ok("Successfully Update Tag", FilterTagDto::filter_tag(&tag)))
}

#[instrument(skip(app_state))]
pub async fn delete_tag(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    service::tag::delete_tag(&app_state.db_client, id).await?;

    tracing::info!(tag_id = id, "Tag deleted");
    Ok(Response::ok("Successfully Delete Tag", id))
}
