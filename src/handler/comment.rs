use crate::{
    AppState,
    dtos::{CommentDto, FilterCommentDto, ListQueryDto, Response},
    error::HttpError,
    middleware::{JWTAuthMiddleware, auth},
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

/// Router for comment endpoints nested under /blog/{id}/comment
pub fn comment_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_comments))
        .route(
            "/",
            post(create_comment)
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        // Only the comment's author may edit or remove it
        .route(
            "/{comment_id}",
            put(update_comment)
                .delete(delete_comment)
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_comments(
    State(app_state): State<AppState>,
    Path(article_id): Path<i64>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (comments, meta) =
        service::comment::list_comments(&app_state.db_client, article_id, &query).await?;

    Ok(Response::ok(
        "Successfully Get All Comments",
        FilterCommentDto::filter_comments(&comments),
    )
    .with_meta(meta))
}

#[instrument(skip(app_state, auth, body), fields(caller = %auth.identity.email))]
pub async fn create_comment(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(article_id): Path<i64>,
    Json(body): Json<CommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    let comment =
        service::comment::create_comment(&app_state.db_client, &auth.identity, article_id, &body)
            .await?;

    tracing::info!(comment_id = comment.id, article_id, "Comment created");
    Ok(Response::created(
        "Successfully Create Comment",
        FilterCommentDto::filter_comment(&comment),
    ))
}

#[instrument(skip(app_state, auth, body), fields(caller = %auth.identity.email))]
pub async fn update_comment(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path((article_id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<CommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    let comment = service::comment::update_comment(
        &app_state.db_client,
        &auth.identity,
        article_id,
        comment_id,
        &body,
    )
    .await?;

    Ok(Response::ok(
        "Successfully Update Comment",
        FilterCommentDto::filter_comment(&comment),
    ))
}

#[instrument(skip(app_state, auth), fields(caller = %auth.identity.email))]
pub async fn delete_comment(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path((article_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, HttpError> {
    service::comment::delete_comment(&app_state.db_client, &auth.identity, article_id, comment_id)
        .await?;

    tracing::info!(comment_id, article_id, "Comment deleted");
    Ok(Response::ok("Successfully Delete Comment", comment_id))
}
