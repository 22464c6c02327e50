use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 계정 모델 (DB 저장용)
/// Account record owned by the credential store; identity key is the email
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    /// argon2 해시 (외부 로그인 전용 계정은 None)
    pub password_hash: Option<String>,
    /// Google 계정 ID (외부 로그인 계정만)
    pub google_id: Option<String>,
    pub name: String,
    pub activated: bool,
    /// 활성화 토큰의 SHA-256 (원문은 저장하지 않음)
    pub activation_token_hash: Option<String>,
    pub activation_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 계정 생성 요청 (저장소용)
/// New account data handed to the credential store
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub name: String,
}

/// 계정 응답 모델 (비밀번호 제외)
/// Account response (no credential material)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = AccountResponse)]
pub struct AccountResponse {
    #[schema(example = "reader@example.com")]
    pub email: String,

    #[schema(example = "Jane Reader")]
    pub name: String,

    /// Google 계정 연동 여부
    /// Whether the account signs in with Google
    pub federated: bool,

    pub activated: bool,

    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            federated: account.google_id.is_some(),
            email: account.email,
            name: account.name,
            activated: account.activated,
            created_at: account.created_at,
        }
    }
}
