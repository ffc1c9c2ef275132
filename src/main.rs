mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod http;
mod middleware;
mod models;
mod redisdb;
mod routes;
mod service;
mod tracing_config;
mod utils;

use axum::http::{
    HeaderName, HeaderValue, Method,
    header::{
        ACCEPT, AUTHORIZATION, CONTENT_TYPE, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
        X_DNS_PREFETCH_CONTROL, X_FRAME_OPTIONS, X_XSS_PROTECTION,
    },
};
use axum_client_ip::ClientIpSource;
use config::Config;
use db::DBClient;
use dotenv::dotenv;
use http::HttpClient;
use redisdb::RedisClient;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing_config::init_tracing;

#[derive(Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub db_client: db::DBClient,
    pub redis_client: redisdb::RedisClient,
    pub http_client: http::HttpClient,
    pub ip_extraction: ClientIpSource,
}

const X_DOWNLOAD_OPTIONS: HeaderName = HeaderName::from_static("x-download-options");

#[tokio::main]
async fn main() {
    let _guard = init_tracing();

    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let ip_source = if cfg!(debug_assertions) {
        ClientIpSource::ConnectInfo
    } else {
        ClientIpSource::CfConnectingIp
    };

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url())
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect to the database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let db_client = DBClient::new(pool);

    let manager = match redis::Client::open(config.redis_url()) {
        Ok(client) => client.get_connection_manager().await,
        Err(e) => Err(e),
    };
    let redis_client = match manager {
        Ok(manager) => RedisClient::new(manager),
        Err(e) => {
            tracing::error!("Failed to connect to redis: {}", e);
            std::process::exit(1);
        }
    };

    let http_client = match HttpClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build http client: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;
    let app_state = AppState {
        env: Arc::new(config),
        db_client: db_client.clone(),
        redis_client,
        http_client,
        ip_extraction: ip_source,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    let app = routes::create_router(app_state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_DOWNLOAD_OPTIONS,
            HeaderValue::from_static("noopen"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=5184000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ))
        // Propagate sits inside Set so the generated id is already present
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind port {}: {}", port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", port);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!("Server error: {}", e);
    }

    db_client.close().await;
    tracing::info!("APP SUCCESSFULLY CLOSED");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
