use thiserror::Error;
use axum::{http::StatusCode, Json};
use serde_json::json;
use crate::shared::errors::SessionError;

/// 인증 관련 에러
/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// 이메일이 이미 존재함
    /// Email already exists
    #[error("Email already exists: {email}")]
    EmailAlreadyExists { email: String },

    /// 잘못된 이메일 또는 비밀번호
    /// Invalid email or password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 계정이 활성화되지 않음
    /// Account has not been activated yet
    #[error("Account has not been activated yet")]
    AccountNotActivated,

    /// 계정을 찾을 수 없음
    /// Account not found
    #[error("Account not found: {email}")]
    AccountNotFound { email: String },

    /// 이미 활성화된 계정
    /// Account already activated
    #[error("Account has already been activated")]
    AccountAlreadyActivated,

    /// 활성화 토큰이 잘못되었거나 만료됨
    /// Activation link invalid or expired
    #[error("Account activation failed. Either the link is invalid or it has expired")]
    ActivationFailed,

    /// 외부 ID 토큰 검증 실패
    /// Federated identity token rejected
    #[error("Federated identity rejected")]
    FederatedIdentityRejected,

    /// 비밀번호 해싱 실패
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    PasswordHashingFailed(String),

    /// 데이터베이스 에러
    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// 내부 서버 에러
    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),

    /// 잘못된 토큰 (위조, 손상, 재사용 모두 동일)
    /// Invalid token (forged, malformed and reused look the same)
    #[error("Invalid or expired token")]
    InvalidToken,

    /// 리프레시 토큰 만료
    /// Refresh token expired
    #[error("Session expired, please sign in again")]
    TokenExpired,

    /// 토큰이 제공되지 않음
    /// Token not provided
    #[error("Token not provided")]
    MissingToken,
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Invalid => AuthError::InvalidToken,
            SessionError::Expired => AuthError::TokenExpired,
            SessionError::Conflict
            | SessionError::TokenSigning(_)
            | SessionError::LifetimeOutOfRange(_) => AuthError::Internal(err.to_string()),
            SessionError::StorageFailure(msg) => AuthError::DatabaseError(msg),
        }
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::EmailAlreadyExists { .. } | AuthError::AccountAlreadyActivated => {
                StatusCode::CONFLICT
            }
            AuthError::InvalidCredentials => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
            AuthError::AccountNotActivated
            | AuthError::ActivationFailed
            | AuthError::FederatedIdentityRejected
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHashingFailed(_)
            | AuthError::DatabaseError(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// AuthError를 HTTP 응답으로 변환
/// 5xx 응답에는 내부 메시지를 노출하지 않음
impl From<AuthError> for (StatusCode, Json<serde_json::Value>) {
    fn from(err: AuthError) -> Self {
        let status = err.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        (status, Json(json!({ "error": message })))
    }
}
