use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use crate::domains::auth::models::{AccountResponse, TokenPair};

// 회원가입 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = RegisterRequest)]
pub struct RegisterRequest {
    /// Email address
    /// 이메일 주소
    #[schema(example = "reader@example.com")]
    pub email: String,

    /// Password (will be hashed)
    /// 비밀번호 (해싱됨)
    #[schema(example = "Password123!")]
    pub password: String,

    /// Display name
    /// 이름
    #[schema(example = "Jane Reader")]
    pub name: String,
}

// Google 회원가입 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = GoogleRegisterRequest)]
pub struct GoogleRegisterRequest {
    /// Google ID token
    #[schema(example = "eyJhbGciOiJSUzI1NiIsImtpZCI6...")]
    pub id_token: String,

    /// Display name
    /// 이름
    #[schema(example = "Jane Reader")]
    pub name: String,
}

// 회원가입 응답 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = RegisterResponse)]
pub struct RegisterResponse {
    /// 새 계정 ID (이메일)
    /// New account id (email)
    pub new_id: String,

    /// 활성화 링크 만료 시각
    /// Activation link expiry
    pub activation_expires_at: DateTime<Utc>,
}

// 계정 활성화 쿼리
#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivateQuery {
    pub email: String,
    pub token: String,
}

// 활성화 메일 재발송 요청
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = ResendActivationRequest)]
pub struct ResendActivationRequest {
    #[schema(example = "reader@example.com")]
    pub email: String,
}

// 로그인 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = SigninRequest)]
pub struct SigninRequest {
    /// Email address
    /// 이메일 주소
    #[schema(example = "reader@example.com")]
    pub email: String,

    /// Password
    /// 비밀번호
    #[schema(example = "Password123!")]
    pub password: String,
}

// Google 로그인 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = GoogleSigninRequest)]
pub struct GoogleSigninRequest {
    /// Google ID token
    pub id_token: String,
}

// 토큰 응답 모델 (로그인, 갱신 공통)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = TokenResponse)]
pub struct TokenResponse {
    /// JWT Access Token (짧은 수명)
    /// JWT Access Token (short lifetime)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,

    /// Refresh Token (긴 수명, 회전됨)
    /// Refresh Token (long lifetime, rotated on every use)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,

    #[schema(example = "Bearer")]
    pub token_type: String,

    /// Access Token 만료 시각
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
            token_type: "Bearer".to_string(),
            expires_at: pair.access.expires_at,
        }
    }
}

// 로그인 응답 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = SigninResponse)]
pub struct SigninResponse {
    /// Account information (without password)
    /// 계정 정보 (비밀번호 제외)
    pub account: AccountResponse,

    #[serde(flatten)]
    pub tokens: TokenResponse,
}

// 토큰 갱신 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = RefreshTokenRequest)]
pub struct RefreshTokenRequest {
    /// Refresh Token
    /// 리프레시 토큰
    pub refresh_token: String,
}

// 로그아웃 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = LogoutRequest)]
pub struct LogoutRequest {
    /// Refresh Token
    /// 리프레시 토큰
    pub refresh_token: String,
}

// 단순 메시지 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = MessageResponse)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
