use crate::{
    AppState,
    dtos::{BlogQueryDto, CreateBlogDto, FilterBlogDto, Response, UpdateBlogDto},
    error::HttpError,
    handler::{comment::comment_handler, like::like_handler},
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

/// Router for /blog
///
/// Reads are public. Writes need an Author token and, for existing
/// articles, ownership. Comments and likes hang off `/{id}`.
pub fn blog_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_blogs))
        .route(
            "/",
            post(create_blog)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Role::Author])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        // GET takes the slug, PUT and DELETE the numeric id
        .route("/{id}", get(get_blog))
        .route(
            "/{id}",
            put(update_blog)
                .delete(delete_blog)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Role::Author])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.env.clone(), auth)),
        )
        .nest("/{id}/comment", comment_handler(app_state.clone()))
        .nest("/{id}/like", like_handler(app_state))
}

#[instrument(skip(app_state))]
pub async fn get_blogs(
    State(app_state): State<AppState>,
    Query(query): Query<BlogQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (articles, meta) = service::blog::list_blogs(&app_state.db_client, &query).await?;

    Ok(
        Response::ok("Successfully Get All Blogs", FilterBlogDto::filter_blogs(&articles))
            .with_meta(meta),
    )
}

#[instrument(skip(app_state))]
pub async fn get_blog(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let article = service::blog::get_blog(&app_state.db_client, &slug).await?;

    Ok(Response::ok("Successfully Get Blog", FilterBlogDto::filter_blog(&article)))
}

#[instrument(skip(app_state, auth, body), fields(title = %body.title))]
pub async fn create_blog(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateBlogDto>,
) -> Result<impl IntoResponse, HttpError> {
    let article = service::blog::create_blog(&app_state.db_client, &auth.identity, &body).await?;

    tracing::info!(article_id = article.id, slug = %article.slug, "Blog created");
    Ok(Response::created("Successfully Create Blog", FilterBlogDto::filter_blog(&article)))
}

#[instrument(skip(app_state, auth, body))]
pub async fn update_blog(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBlogDto>,
) -> Result<impl IntoResponse, HttpError> {
    let article =
        service::blog::update_blog(&app_state.db_client, &auth.identity, id, &body).await?;

    Ok(Response::ok("Successfully Update Blog", FilterBlogDto::filter_blog(&article)))
}

#[instrument(skip(app_state, auth))]
pub async fn delete_blog(
    State(app_state): State<AppState>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    service::blog::delete_blog(&app_state.db_client, &auth.identity, id).await?;

    tracing::info!(article_id = id, "Blog deleted");
    Ok(Response::ok("Successfully Delete Blog", id))
}
