// Auth domain routes
// 인증 도메인 라우터
use axum::{routing::{get, post}, Router};
use crate::domains::auth::handlers::auth_handler;
use crate::shared::services::AppState;

/// Create authentication router
/// 인증 라우터 생성
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth_handler::register))
        .route("/register/google", post(auth_handler::register_google))
        .route("/activate", get(auth_handler::activate))
        .route("/activate/resend", post(auth_handler::resend_activation))
        .route("/signin", post(auth_handler::signin))
        .route("/google", post(auth_handler::signin_google))
        .route("/refresh", post(auth_handler::refresh))
        .route("/logout", post(auth_handler::logout))
        .route("/me", get(auth_handler::get_me))
}
