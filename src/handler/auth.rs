use crate::{
    AppState,
    dtos::{FilterUserDto, GoogleCallbackQueryDto, LoginUserDto, RegisterUserDto, Response},
    error::HttpError,
    service,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_client_ip::ClientIp;
use tracing::instrument;

pub fn auth_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route(
            "/login",
            post(login).layer(app_state.ip_extraction.into_extension()),
        )
        .route("/google/login", get(google_login))
        .route("/google/callback", get(google_callback))
}

#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn register(
    State(app_state): State<AppState>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = service::auth::register(&app_state.db_client, &body).await?;

    tracing::info!(email = %user.email, "Register Successful");
    Ok(Response::created(
        "Successfully Register User",
        FilterUserDto::filter_user(&user),
    ))
}

/// Password login, limited per client IP
#[instrument(skip(app_state, body), fields(email = %body.email, ip = %ip))]
pub async fn login(
    ClientIp(ip): ClientIp,
    State(app_state): State<AppState>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    service::auth::check_login_rate(&app_state.redis_client, ip).await?;

    let response = service::auth::login(&app_state.db_client, &app_state.env, &body).await?;

    tracing::info!("Login Successful");
    Ok(Response::ok("Successfully Login", response))
}

#[instrument(skip(app_state))]
pub async fn google_login(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let url = service::auth::google_login(
        &app_state.redis_client,
        &app_state.http_client,
        &app_state.env,
    )
    .await?;

    Ok(Redirect::to(&url))
}

#[instrument(skip(app_state, query))]
pub async fn google_callback(
    State(app_state): State<AppState>,
    Query(query): Query<GoogleCallbackQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service::auth::google_callback(
        &app_state.db_client,
        &app_state.redis_client,
        &app_state.http_client,
        &app_state.env,
        &query,
    )
    .await?;

    tracing::info!(role = %response.role, "Google Login Successful");
    Ok(Response::new(
        StatusCode::OK,
        "Successfully Google Login",
        response,
    ))
}
