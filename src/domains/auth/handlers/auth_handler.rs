use crate::domains::auth::models::{
    AccountResponse, ActivateQuery, GoogleRegisterRequest, GoogleSigninRequest, LogoutRequest,
    MessageResponse, RefreshTokenRequest, RegisterRequest, RegisterResponse,
    ResendActivationRequest, SigninRequest, SigninResponse, TokenResponse,
};
use crate::shared::services::AppState;
use crate::shared::errors::AuthError;
use axum::{extract::{Query, State}, http::StatusCode, Json};
use crate::shared::middleware::auth::AuthenticatedUser;

type ApiError = (StatusCode, Json<serde_json::Value>);

// 회원가입 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, activation link sent", body = RegisterResponse),
        (status = 409, description = "Email already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    // Service 호출 (비즈니스 로직)
    let (account, activation_expires_at) = app_state
        .auth_state
        .auth_service
        .register(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            new_id: account.email,
            activation_expires_at,
        }),
    ))
}

// Google 계정 회원가입 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/register/google",
    request_body = GoogleRegisterRequest,
    responses(
        (status = 201, description = "Account created, activation link sent", body = RegisterResponse),
        (status = 401, description = "Google ID token rejected"),
        (status = 409, description = "Email already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register_google(
    State(app_state): State<AppState>,
    Json(request): Json<GoogleRegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (account, activation_expires_at) = app_state
        .auth_state
        .auth_service
        .register_google(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            new_id: account.email,
            activation_expires_at,
        }),
    ))
}

/// 계정 활성화 핸들러 (메일 링크)
/// Account activation handler (activation link target)
#[utoipa::path(
    get,
    path = "/api/auth/activate",
    params(ActivateQuery),
    responses(
        (status = 200, description = "Account activated", body = MessageResponse),
        (status = 401, description = "Link invalid or expired"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Account already activated")
    ),
    tag = "Auth"
)]
pub async fn activate(
    State(app_state): State<AppState>,
    Query(query): Query<ActivateQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let account = app_state
        .auth_state
        .auth_service
        .activate(&query.email, &query.token)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(MessageResponse {
        message: "Account activated".to_string(),
        email: Some(account.email),
    }))
}

/// 활성화 링크 재발송 핸들러
/// Resend activation link handler
#[utoipa::path(
    post,
    path = "/api/auth/activate/resend",
    request_body = ResendActivationRequest,
    responses(
        (status = 200, description = "Activation link sent", body = MessageResponse),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Account already activated")
    ),
    tag = "Auth"
)]
pub async fn resend_activation(
    State(app_state): State<AppState>,
    Json(request): Json<ResendActivationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .auth_state
        .auth_service
        .resend_activation(&request.email)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(MessageResponse {
        message: "Activation link sent".to_string(),
        email: Some(request.email),
    }))
}

// 로그인 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Login successful", body = SigninResponse),
        (status = 401, description = "Account not activated"),
        (status = 422, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn signin(
    State(app_state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    // Service 호출 (비밀번호 검증 + 새 세션 패밀리)
    let (account, tokens) = app_state
        .auth_state
        .auth_service
        .signin(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(SigninResponse {
        account: account.into(),
        tokens: tokens.into(),
    }))
}

// Google 로그인 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/google",
    request_body = GoogleSigninRequest,
    responses(
        (status = 200, description = "Login successful", body = SigninResponse),
        (status = 401, description = "Google ID token rejected or account not activated"),
        (status = 422, description = "No account linked to this Google identity"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn signin_google(
    State(app_state): State<AppState>,
    Json(request): Json<GoogleSigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    let (account, tokens) = app_state
        .auth_state
        .auth_service
        .signin_google(&request.id_token)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(SigninResponse {
        account: account.into(),
        tokens: tokens.into(),
    }))
}

/// 토큰 갱신 핸들러
/// Refresh token handler
///
/// 한 번 사용된 refresh token을 다시 제출하면 패밀리 전체가 폐기됨
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token rotated successfully", body = TokenResponse),
        (status = 401, description = "Invalid, reused or expired refresh token"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let tokens = app_state
        .auth_state
        .auth_service
        .refresh(&request.refresh_token)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(tokens.into()))
}

/// 로그아웃 핸들러
/// Logout handler
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Session family revoked"),
        (status = 401, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(app_state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<StatusCode, ApiError> {
    app_state
        .auth_state
        .auth_service
        .logout(&request.refresh_token)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Account info retrieved successfully", body = AccountResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = app_state
        .auth_state
        .auth_service
        .get_account(&authenticated_user.email)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(account.into()))
}
