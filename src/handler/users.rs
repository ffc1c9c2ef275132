use crate::{
    AppState,
    dtos::{FilterUserDto, ListQueryDto, Response, UpdateUserDto},
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
    routing::{delete, get},
};
use tracing::instrument;

pub fn users_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_users)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Role::Superadmin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        // Ownership of PUT is decided by the service (self or Superadmin)
        .route(
            "/{id}",
            get(get_user)
                .put(update_user)
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        .route(
            "/{id}",
            delete(delete_user)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Role::Superadmin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_users(
    State(app_state): State<AppState>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (users, meta) = service::user::list_users(&app_state.db_client, &query).await?;

    Ok(
        Response::ok("Successfully Get All Users", FilterUserDto::filter_users(&users))
            .with_meta(meta),
    )
}

#[instrument(skip(app_state))]
pub async fn get_user(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let user = service::user::get_user(&app_state.db_client, id).await?;

    Ok(Response::ok("Successfully Get User", FilterUserDto::filter_user(&user)))
}

#[instrument(skip(app_state, auth, body), fields(caller = %auth.identity.email))]
pub async fn update_user(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = service::user::update_user(&app_state.db_client, &auth.identity, id, &body).await?;

    tracing::info!(user_id = user.id, "User updated");
    Ok(Response::ok("Successfully Update User", FilterUserDto::filter_user(&user)))
}

#[instrument(skip(app_state, auth), fields(caller = %auth.identity.email))]
pub async fn delete_user(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    service::user::delete_user(&app_state.db_client, &auth.identity, id).await?;

    tracing::info!(user_id = id, "User deleted");
    Ok(Response::ok("Successfully Delete User", id))
}
