use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use chrono::Utc;
use crate::shared::services::AppState;
use crate::shared::errors::AuthError;
use tracing::debug;

/// 인증된 사용자 정보 (Access Token에서 추출)
/// Authenticated identity extracted from an access token
///
/// Authentication Gate: 서명/만료만 검증하고 원장은 조회하지 않음.
/// 폐기된 패밀리의 access token도 짧은 수명이 끝날 때까지는 유효함
///
/// 사용법:
/// ```rust,ignore
/// pub async fn get_me(
///     State(app_state): State<AppState>,
///     authenticated_user: AuthenticatedUser,  // <- 이렇게 사용!
/// ) -> Result<...> {
///     let email = authenticated_user.email;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // 1. Authorization 헤더에서 토큰 추출
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        // 2. "Bearer <token>" 형식 파싱
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        // 3. 코덱으로 토큰 검증 (AppState에서 가져옴)
        let claims = state
            .auth_state
            .token_codec
            .decode_access(token.trim(), Utc::now())
            .map_err(|e| {
                debug!(reason = %e, "access token rejected");
                AuthError::InvalidToken
            })?;

        // 4. AuthenticatedUser 반환
        Ok(AuthenticatedUser {
            email: claims.sub,
        })
    }
}
