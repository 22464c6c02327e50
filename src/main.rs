use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use catalog_api::config::Config;
use catalog_api::routes::create_router;
use catalog_api::shared::database::Database;
use catalog_api::shared::services::AppState;

// Import models for OpenAPI schema
use catalog_api::domains::auth::models::*;

// OpenAPI 스키마 정의: Swagger 문서 자동 생성
#[derive(OpenApi)]
#[openapi(
    paths(
        catalog_api::domains::auth::handlers::auth_handler::register,
        catalog_api::domains::auth::handlers::auth_handler::register_google,
        catalog_api::domains::auth::handlers::auth_handler::activate,
        catalog_api::domains::auth::handlers::auth_handler::resend_activation,
        catalog_api::domains::auth::handlers::auth_handler::signin,
        catalog_api::domains::auth::handlers::auth_handler::signin_google,
        catalog_api::domains::auth::handlers::auth_handler::refresh,
        catalog_api::domains::auth::handlers::auth_handler::logout,
        catalog_api::domains::auth::handlers::auth_handler::get_me
    ),
    components(schemas(
        RegisterRequest,
        GoogleRegisterRequest,
        RegisterResponse,
        ResendActivationRequest,
        SigninRequest,
        GoogleSigninRequest,
        SigninResponse,
        TokenResponse,
        RefreshTokenRequest,
        LogoutRequest,
        MessageResponse,
        AccountResponse
    )),
    modifiers(
        &SecurityAddon
    ),
    tags(
        (name = "Auth", description = "Account and session API endpoints")
    ),
    info(
        title = "Library Catalog API",
        description = "Accounts and refresh-token sessions for the library catalog",
        version = "1.0.0"
    )
)]
struct ApiDoc;

// Security scheme 정의: Swagger UI에서 "Authorize" 버튼 추가
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 설정 로드 (파일 없으면 기본값 + 환경변수)
    let config_path = Config::resolve_path();
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // tracing 초기화: LOG_LEVEL / RUST_LOG, 설정에 따라 JSON 출력
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    info!(
        path = %config_path.display(),
        listen_addr = %config.server.listen_addr,
        "configuration loaded"
    );

    // 저장소 선택: DATABASE_URL 있으면 PostgreSQL, 없으면 메모리
    let app_state = match config.database.url.as_deref() {
        Some(db_url) => {
            let db = Database::new(db_url, config.database.max_connections).await?;
            db.initialize().await?;
            info!("storage: PostgreSQL");
            AppState::new(&db, &config)
        }
        None => {
            warn!("DATABASE_URL not set, running on in-memory stores; all data is lost on restart");
            AppState::in_memory(&config)
        }
    };

    // 만료 세션 정리 스케줄러 시작
    app_state.auth_state.sweep_scheduler.start();
    if !config.sweep.enabled {
        warn!("session sweep disabled; expired ledger entries are kept");
    }

    // CORS 설정
    let origin = config
        .server
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin: {}", config.server.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    // Router 생성
    let app = Router::new()
        .merge(create_router())
        .merge(
            SwaggerUi::new("/api")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
        )
        .layer(cors)
        .with_state(app_state);

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;

    info!(addr = %config.server.listen_addr, "server running, Swagger UI at /api");

    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
